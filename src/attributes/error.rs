//! Error types for attribute resolution

use thiserror::Error;

use crate::geometry::GeometryError;

/// Errors raised while resolving a cell's attributes
#[derive(Debug, Error)]
pub enum AttributeError {
    /// A `ref` selector that matches no node
    #[error("\"{selector}\" reference does not exist.")]
    DanglingReference { selector: String },

    /// Nodes whose `ref` selectors point at each other
    #[error("circular ref dependency: {}", cycle.join(" -> "))]
    CircularReference { cycle: Vec<String> },

    /// A `transform` attribute that is not a transform list
    #[error("invalid transform '{transform}': {reason}")]
    InvalidTransform { transform: String, reason: String },

    /// A node handle that the tree does not know
    #[error("unknown node {0}")]
    UnknownNode(String),

    /// Shape data in `refD`/`refPoints` that cannot be parsed or serialized
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

impl AttributeError {
    /// Create a dangling reference error
    pub fn dangling(selector: impl Into<String>) -> Self {
        Self::DanglingReference {
            selector: selector.into(),
        }
    }

    /// Create a circular reference error
    pub fn circular(cycle: Vec<String>) -> Self {
        Self::CircularReference { cycle }
    }

    /// Create an invalid transform error
    pub fn invalid_transform(transform: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            transform: transform.into(),
            reason: reason.into(),
        }
    }
}
