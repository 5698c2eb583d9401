//! Diagram Kernel - geometry and attribute resolution for diagramming
//!
//! This library provides the value-level geometry of a diagramming toolkit
//! (points, lines, rectangles, ellipses, Bézier curves, polylines and
//! segment-chain paths) and an engine that resolves declarative,
//! reference-relative SVG attributes against a node tree.
//!
//! # Example
//!
//! ```rust
//! use diagram_kernel::geometry::{Path, PathOptions};
//!
//! let path = Path::parse("M 0 0 L 100 0 L 100 100").unwrap();
//! assert_eq!(path.length(PathOptions::default()), 200.0);
//! assert_eq!(path.serialize().unwrap(), "M 0 0 L 100 0 L 100 100");
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod geometry;

pub use attributes::{AttributeEngine, AttributeError, AttributeRegistry, EngineConfig, Scene};
pub use config::{Config, ConfigError};
pub use error::ParseError;
pub use geometry::{
    Curve, Ellipse, GeometryError, Line, Path, PathOptions, Point, Polyline, Rect, Segment,
};
