//! Geometry kernel
//!
//! Value types for points, lines, rectangles, ellipses, cubic Bézier curves,
//! polylines and segment-chain paths. The y-axis points down, and angles grow
//! counter-clockwise on screen.
//!
//! Queries that take a ratio or a length clamp out-of-range input instead of
//! failing. Only structural path edits, constructors and path-data parsing
//! return errors.

pub mod curve;
pub mod ellipse;
pub mod error;
pub mod helpers;
pub mod intersection;
pub mod line;
pub mod options;
pub mod path;
pub mod point;
pub mod polyline;
pub mod rect;

pub use curve::{Curve, SkeletonPoints};
pub use ellipse::Ellipse;
pub use error::GeometryError;
pub use helpers::{linear_scale, normalize_angle, snap_to_grid, to_deg, to_rad};
pub use intersection::Shape;
pub use line::{Bearing, Line};
pub use options::{CurveOptions, PathOptions, DEFAULT_PRECISION};
pub use path::{Path, PathPiece, PathSegment, PathT, Segment};
pub use point::Point;
pub use polyline::Polyline;
pub use rect::{Rect, ScaleFactors, Side};
