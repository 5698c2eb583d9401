//! Error types for the geometry kernel

use thiserror::Error;

use crate::error::ParseError;

/// Errors raised by structural path operations and shape constructors
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Segment access on a path without segments
    #[error("Path has no segments.")]
    EmptyPath,

    /// Segment index outside the path, negative indices included
    #[error("Index out of range.")]
    IndexOutOfRange { index: isize, len: usize },

    /// Serialization of a path whose first segment is not a moveto
    #[error("Invalid path segments.")]
    InvalidPath,

    /// A moveto segment was asked for its start point
    #[error("Moveto segments have no start point.")]
    NoStart,

    /// A constructor received too few points
    #[error("At least {required} points are required, got {found}")]
    NotEnoughPoints { required: usize, found: usize },

    /// A coordinate in a points list is not a number
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    /// A segment command letter other than M, L, C, Z or z
    #[error("{0} is not a recognized path segment type.")]
    UnknownSegmentType(char),

    /// A segment constructor received the wrong number of coordinates
    #[error("segment '{command}' expects {expected} coordinates, got {found}")]
    WrongArity {
        command: char,
        expected: usize,
        found: usize,
    },

    /// Malformed path data
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl GeometryError {
    /// Create an index error for a requested index
    pub fn out_of_range(index: isize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a not-enough-points error
    pub fn not_enough_points(required: usize, found: usize) -> Self {
        Self::NotEnoughPoints { required, found }
    }
}
