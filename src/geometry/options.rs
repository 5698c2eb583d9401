//! Precision options for arc-length queries

use super::curve::Curve;

/// Precision used when no other is given: flattened lengths within 0.1%
pub const DEFAULT_PRECISION: u32 = 3;

/// Options for curve and polyline-approximation queries
///
/// `precision` controls how finely curves are flattened: the observed
/// length error is below `10^-precision`. Precomputed `subdivisions` from
/// [`Curve::get_subdivisions`] can be passed to avoid recomputing them
/// across several queries on the same curve.
#[derive(Debug, Clone, Copy)]
pub struct CurveOptions<'a> {
    pub precision: u32,
    pub subdivisions: Option<&'a [Curve]>,
}

impl Default for CurveOptions<'_> {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            subdivisions: None,
        }
    }
}

impl<'a> CurveOptions<'a> {
    /// Create options with the given precision and no cached subdivisions
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            subdivisions: None,
        }
    }

    /// Set the precision
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Reuse precomputed subdivisions
    pub fn with_subdivisions(mut self, subdivisions: &'a [Curve]) -> Self {
        self.subdivisions = Some(subdivisions);
        self
    }
}

/// Options for path queries
///
/// `segment_subdivisions` holds one subdivision list per segment, as
/// returned by `Path::get_segment_subdivisions`.
#[derive(Debug, Clone, Copy)]
pub struct PathOptions<'a> {
    pub precision: u32,
    pub segment_subdivisions: Option<&'a [Vec<Curve>]>,
}

impl Default for PathOptions<'_> {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            segment_subdivisions: None,
        }
    }
}

impl<'a> PathOptions<'a> {
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            segment_subdivisions: None,
        }
    }

    /// Set the precision
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Reuse precomputed per-segment subdivisions
    pub fn with_segment_subdivisions(mut self, subdivisions: &'a [Vec<Curve>]) -> Self {
        self.segment_subdivisions = Some(subdivisions);
        self
    }

    /// Curve options for the segment at `index`
    pub(crate) fn for_segment(&self, index: usize) -> CurveOptions<'a> {
        CurveOptions {
            precision: self.precision,
            subdivisions: self
                .segment_subdivisions
                .and_then(|all| all.get(index))
                .map(|s| s.as_slice()),
        }
    }
}
