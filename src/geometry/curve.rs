//! Cubic Bézier curves
//!
//! Arc-length queries work on an adaptive flattening of the curve: the curve
//! is bisected at `t = 0.5` until the total chord length of the pieces stops
//! changing by more than `10^-precision` between two rounds. Every
//! length-based operation accepts the resulting subdivisions through
//! [`CurveOptions`] so that repeated queries can share them.

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use super::error::GeometryError;
use super::line::Line;
use super::options::CurveOptions;
use super::point::Point;
use super::polyline::Polyline;
use super::rect::Rect;

/// The five helper points of a de Casteljau split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonPoints {
    pub start_control_point1: Point,
    pub start_control_point2: Point,
    pub divider: Point,
    pub divider_control_point1: Point,
    pub divider_control_point2: Point,
}

/// A cubic Bézier curve
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Curve {
    pub start: Point,
    pub control_point1: Point,
    pub control_point2: Point,
    pub end: Point,
}

impl Curve {
    pub fn new(start: Point, control_point1: Point, control_point2: Point, end: Point) -> Self {
        Self {
            start,
            control_point1,
            control_point2,
            end,
        }
    }

    /// Smooth spline through `points`, one curve per consecutive pair
    pub fn through_points(points: &[Point]) -> Result<Vec<Curve>, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::not_enough_points(2, points.len()));
        }

        let (first, second) = spline_control_points(points);
        Ok(first
            .iter()
            .zip(second.iter())
            .enumerate()
            .map(|(i, (c1, c2))| Curve::new(points[i], *c1, *c2, points[i + 1]))
            .collect())
    }

    /// Tight bounding box, found from the roots of the derivative per axis
    pub fn bbox(&self) -> Rect {
        let (x0, y0) = (self.start.x, self.start.y);
        let (x1, y1) = (self.control_point1.x, self.control_point1.y);
        let (x2, y2) = (self.control_point2.x, self.control_point2.y);
        let (x3, y3) = (self.end.x, self.end.y);

        let mut tvalues: Vec<f64> = Vec::with_capacity(4);
        for (p0, p1, p2, p3) in [(x0, x1, x2, x3), (y0, y1, y2, y3)] {
            let b = 6.0 * p0 - 12.0 * p1 + 6.0 * p2;
            let a = -3.0 * p0 + 9.0 * p1 - 9.0 * p2 + 3.0 * p3;
            let c = 3.0 * p1 - 3.0 * p0;

            if a.abs() < 1e-12 {
                if b.abs() < 1e-12 {
                    continue;
                }
                let t = -c / b;
                if 0.0 < t && t < 1.0 {
                    tvalues.push(t);
                }
                continue;
            }

            let b2ac = b * b - 4.0 * c * a;
            if b2ac < 0.0 {
                continue;
            }
            let sqrt_b2ac = b2ac.sqrt();
            for t in [(-b + sqrt_b2ac) / (2.0 * a), (-b - sqrt_b2ac) / (2.0 * a)] {
                if 0.0 < t && t < 1.0 {
                    tvalues.push(t);
                }
            }
        }

        let extremes = tvalues.iter().map(|&t| {
            let mt = 1.0 - t;
            let bezier = |p0: f64, p1: f64, p2: f64, p3: f64| {
                mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
            };
            Point::new(bezier(x0, x1, x2, x3), bezier(y0, y1, y2, y3))
        });

        Rect::from_point_union(extremes.chain([self.start, self.end]))
            .unwrap_or_else(|| Rect::at(self.start))
    }

    pub fn closest_point(&self, p: Point, opt: CurveOptions<'_>) -> Point {
        self.point_at_t(self.closest_point_t(p, opt))
    }

    pub fn closest_point_length(&self, p: Point, opt: CurveOptions<'_>) -> f64 {
        let subdivisions = self.subdivisions_for(&opt);
        let local = CurveOptions::new(opt.precision).with_subdivisions(&subdivisions);
        self.length_at_t(self.closest_point_t(p, local), local)
    }

    pub fn closest_point_normalized_length(&self, p: Point, opt: CurveOptions<'_>) -> f64 {
        let subdivisions = self.subdivisions_for(&opt);
        let local = CurveOptions::new(opt.precision).with_subdivisions(&subdivisions);

        let cp_length = self.closest_point_length(p, local);
        if cp_length == 0.0 || cp_length.is_nan() {
            return 0.0;
        }
        let length = self.length(local);
        if length == 0.0 {
            return 0.0;
        }
        cp_length / length
    }

    /// Parameter `t` of the point on the curve closest to `p`
    ///
    /// Picks the subdivision minimizing the summed distance from `p` to its
    /// endpoints, then halves it until the two endpoint distances agree to
    /// within `10^-precision`, returning the `t` of the nearer endpoint.
    pub fn closest_point_t(&self, p: Point, opt: CurveOptions<'_>) -> f64 {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return 0.0;
        }
        let subdivisions = self.subdivisions_for(&opt);
        let n = subdivisions.len();
        if n == 0 {
            return 0.0;
        }
        let mut subdivision_size = 1.0 / n as f64;

        let mut investigated = subdivisions[0];
        let mut start_t = 0.0;
        let mut end_t = subdivision_size;
        let mut dist_from_start = 0.0;
        let mut dist_from_end = 0.0;
        let mut chord_length = 0.0;
        let mut min_sum_dist: Option<f64> = None;

        for (i, current) in subdivisions.iter().enumerate() {
            let start_dist = current.start.distance(p);
            let end_dist = current.end.distance(p);
            let sum_dist = start_dist + end_dist;

            if min_sum_dist.map_or(true, |min| sum_dist < min) {
                investigated = *current;
                start_t = i as f64 * subdivision_size;
                end_t = (i + 1) as f64 * subdivision_size;
                dist_from_start = start_dist;
                dist_from_end = end_dist;
                chord_length = current.start.distance(current.end);
                min_sum_dist = Some(sum_dist);
            }
        }

        let precision_ratio = 10f64.powi(-(opt.precision as i32));

        loop {
            let diff = (dist_from_start - dist_from_end).abs();
            let start_precision_ratio = if dist_from_start != 0.0 {
                diff / dist_from_start
            } else {
                0.0
            };
            let end_precision_ratio = if dist_from_end != 0.0 {
                diff / dist_from_end
            } else {
                0.0
            };
            let has_required_precision =
                start_precision_ratio < precision_ratio || end_precision_ratio < precision_ratio;

            let has_minimal_start_distance =
                dist_from_start == 0.0 || dist_from_start < chord_length * precision_ratio;
            let has_minimal_end_distance =
                dist_from_end == 0.0 || dist_from_end < chord_length * precision_ratio;

            if has_required_precision || has_minimal_start_distance || has_minimal_end_distance {
                return if dist_from_start <= dist_from_end {
                    start_t
                } else {
                    end_t
                };
            }

            let [first, second] = investigated.divide(0.5);
            subdivision_size /= 2.0;

            let start_dist1 = first.start.distance(p);
            let end_dist1 = first.end.distance(p);
            let start_dist2 = second.start.distance(p);
            let end_dist2 = second.end.distance(p);

            if start_dist1 + end_dist1 <= start_dist2 + end_dist2 {
                investigated = first;
                end_t -= subdivision_size;
                dist_from_start = start_dist1;
                dist_from_end = end_dist1;
            } else {
                investigated = second;
                start_t += subdivision_size;
                dist_from_start = start_dist2;
                dist_from_end = end_dist2;
            }
            chord_length = investigated.start.distance(investigated.end);
        }
    }

    pub fn closest_point_tangent(&self, p: Point, opt: CurveOptions<'_>) -> Option<Line> {
        self.tangent_at_t(self.closest_point_t(p, opt))
    }

    /// Even-odd containment test on the flattened curve, closed by a straight edge
    pub fn contains_point(&self, p: Point, opt: CurveOptions<'_>) -> bool {
        self.to_polyline(opt).contains_point(p)
    }

    /// Split at a length ratio in [0, 1]
    pub fn divide_at(&self, ratio: f64, opt: CurveOptions<'_>) -> [Curve; 2] {
        if ratio <= 0.0 {
            return self.divide_at_t(0.0);
        }
        if ratio >= 1.0 {
            return self.divide_at_t(1.0);
        }
        self.divide_at_t(self.t_at(ratio, opt))
    }

    pub fn divide_at_length(&self, length: f64, opt: CurveOptions<'_>) -> [Curve; 2] {
        self.divide_at_t(self.t_at_length(length, opt))
    }

    /// Split at parameter `t` using de Casteljau's construction
    ///
    /// Out-of-range `t` yields a point-like curve on one side and a copy of
    /// this curve on the other.
    pub fn divide_at_t(&self, t: f64) -> [Curve; 2] {
        if t <= 0.0 {
            let s = self.start;
            return [Curve::new(s, s, s, s), *self];
        }
        if t >= 1.0 {
            let e = self.end;
            return [*self, Curve::new(e, e, e, e)];
        }

        let sk = self.get_skeleton_points(t);
        [
            Curve::new(
                self.start,
                sk.start_control_point1,
                sk.start_control_point2,
                sk.divider,
            ),
            Curve::new(
                sk.divider,
                sk.divider_control_point1,
                sk.divider_control_point2,
                self.end,
            ),
        ]
    }

    /// Alias of [`Curve::divide_at_t`]
    pub fn divide(&self, t: f64) -> [Curve; 2] {
        self.divide_at_t(t)
    }

    pub fn endpoint_distance(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn get_skeleton_points(&self, t: f64) -> SkeletonPoints {
        if t <= 0.0 {
            return SkeletonPoints {
                start_control_point1: self.start,
                start_control_point2: self.start,
                divider: self.start,
                divider_control_point1: self.control_point1,
                divider_control_point2: self.control_point2,
            };
        }
        if t >= 1.0 {
            return SkeletonPoints {
                start_control_point1: self.control_point1,
                start_control_point2: self.control_point2,
                divider: self.end,
                divider_control_point1: self.end,
                divider_control_point2: self.end,
            };
        }

        let midpoint1 = Line::new(self.start, self.control_point1).point_at(t);
        let midpoint2 = Line::new(self.control_point1, self.control_point2).point_at(t);
        let midpoint3 = Line::new(self.control_point2, self.end).point_at(t);
        let sub_control1 = Line::new(midpoint1, midpoint2).point_at(t);
        let sub_control2 = Line::new(midpoint2, midpoint3).point_at(t);
        let divider = Line::new(sub_control1, sub_control2).point_at(t);

        SkeletonPoints {
            start_control_point1: midpoint1,
            start_control_point2: sub_control1,
            divider,
            divider_control_point1: sub_control2,
            divider_control_point2: midpoint3,
        }
    }

    /// Adaptive flattening of the curve
    ///
    /// Precision 0 and point-like curves yield the curve itself. Straight
    /// curves are bisected `2 * precision` times; others at least twice,
    /// since a sine-like curve can measure the same in rounds 0 and 1.
    pub fn get_subdivisions(&self, precision: u32) -> Vec<Curve> {
        let mut subdivisions = vec![*self];
        if precision == 0 || !self.is_differentiable() || !self.is_finite() {
            return subdivisions;
        }

        let mut previous_length = self.endpoint_distance();
        let precision_ratio = 10f64.powi(-(precision as i32));

        let is_line = self.control_point1.cross(self.start, self.end) == 0.0
            && self.control_point2.cross(self.start, self.end) == 0.0;
        let min_iterations = if is_line { 2 * precision } else { 2 };

        let mut iteration = 0;
        loop {
            iteration += 1;

            let new_subdivisions: Vec<Curve> = subdivisions
                .iter()
                .flat_map(|c| c.divide(0.5))
                .collect();
            let length: f64 = new_subdivisions.iter().map(Curve::endpoint_distance).sum();

            if iteration >= min_iterations {
                let observed = if length != 0.0 {
                    (length - previous_length) / length
                } else {
                    0.0
                };
                if observed < precision_ratio {
                    trace!(iteration, length, pieces = new_subdivisions.len(), "curve subdivided");
                    return new_subdivisions;
                }
            }

            subdivisions = new_subdivisions;
            previous_length = length;
        }
    }

    /// False only when all four control points coincide
    pub fn is_differentiable(&self) -> bool {
        !(self.start == self.control_point1
            && self.control_point1 == self.control_point2
            && self.control_point2 == self.end)
    }

    fn is_finite(&self) -> bool {
        [self.start, self.control_point1, self.control_point2, self.end]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Flattened length
    pub fn length(&self, opt: CurveOptions<'_>) -> f64 {
        self.subdivisions_for(&opt)
            .iter()
            .map(Curve::endpoint_distance)
            .sum()
    }

    /// Length of the part of the curve up to parameter `t`
    ///
    /// Ignores cached subdivisions, since they describe the whole curve.
    pub fn length_at_t(&self, t: f64, opt: CurveOptions<'_>) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let [sub_curve, _] = self.divide(t);
        sub_curve.length(CurveOptions::new(opt.precision))
    }

    /// Point at a length ratio in [0, 1]
    pub fn point_at(&self, ratio: f64, opt: CurveOptions<'_>) -> Point {
        if ratio <= 0.0 {
            return self.start;
        }
        if ratio >= 1.0 {
            return self.end;
        }
        self.point_at_t(self.t_at(ratio, opt))
    }

    /// Point at `length` from the start, or from the end when negative
    pub fn point_at_length(&self, length: f64, opt: CurveOptions<'_>) -> Point {
        self.point_at_t(self.t_at_length(length, opt))
    }

    /// Point at parameter `t`; `t` does not track distance along the curve
    pub fn point_at_t(&self, t: f64) -> Point {
        if t <= 0.0 {
            return self.start;
        }
        if t >= 1.0 {
            return self.end;
        }
        self.get_skeleton_points(t).divider
    }

    pub fn tangent_at(&self, ratio: f64, opt: CurveOptions<'_>) -> Option<Line> {
        if !self.is_differentiable() {
            return None;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        self.tangent_at_t(self.t_at(ratio, opt))
    }

    pub fn tangent_at_length(&self, length: f64, opt: CurveOptions<'_>) -> Option<Line> {
        if !self.is_differentiable() {
            return None;
        }
        self.tangent_at_t(self.t_at_length(length, opt))
    }

    /// Tangent line starting at `point_at_t(t)`
    pub fn tangent_at_t(&self, t: f64) -> Option<Line> {
        if !self.is_differentiable() {
            return None;
        }
        let t = t.clamp(0.0, 1.0);
        let sk = self.get_skeleton_points(t);
        let p1 = sk.start_control_point2;
        let p2 = sk.divider_control_point1;
        let start = sk.divider;
        Some(Line::new(p1, p2).translate(start.x - p1.x, start.y - p1.y))
    }

    /// Parameter `t` at a length ratio in [0, 1]
    pub fn t_at(&self, ratio: f64, opt: CurveOptions<'_>) -> f64 {
        if ratio <= 0.0 {
            return 0.0;
        }
        if ratio >= 1.0 {
            return 1.0;
        }
        let subdivisions = self.subdivisions_for(&opt);
        let local = CurveOptions::new(opt.precision).with_subdivisions(&subdivisions);
        let length = self.length(local) * ratio;
        self.t_at_length(length, local)
    }

    /// Parameter `t` at `length` along the curve
    ///
    /// Negative lengths are measured from the end. Lengths beyond the
    /// flattened length clamp to 1 (or 0 from the end).
    pub fn t_at_length(&self, length: f64, opt: CurveOptions<'_>) -> f64 {
        let from_start = !(length < 0.0);
        let length = length.abs();

        let subdivisions = self.subdivisions_for(&opt);
        let n = subdivisions.len();
        let mut subdivision_size = 1.0 / n as f64;

        let mut found = None;
        let mut l = 0.0;
        for i in 0..n {
            let index = if from_start { i } else { n - 1 - i };
            let current = subdivisions[index];
            let d = current.endpoint_distance();

            if length <= l + d {
                let (to_start, to_end) = if from_start {
                    (length - l, (d + l) - length)
                } else {
                    ((d + l) - length, length - l)
                };
                found = Some((
                    current,
                    index as f64 * subdivision_size,
                    (index + 1) as f64 * subdivision_size,
                    to_start,
                    to_end,
                ));
                break;
            }
            l += d;
        }

        let Some((mut investigated, mut start_t, mut end_t, mut dist_from_start, mut dist_from_end)) =
            found
        else {
            return if from_start { 1.0 } else { 0.0 };
        };

        let local = CurveOptions::new(opt.precision).with_subdivisions(&subdivisions);
        let curve_length = self.length(local);
        let precision_ratio = 10f64.powi(-(opt.precision as i32));

        loop {
            let observed = if curve_length != 0.0 {
                dist_from_start / curve_length
            } else {
                0.0
            };
            if observed < precision_ratio {
                return start_t;
            }
            let observed = if curve_length != 0.0 {
                dist_from_end / curve_length
            } else {
                0.0
            };
            if observed < precision_ratio {
                return end_t;
            }

            let [first, second] = investigated.divide(0.5);
            subdivision_size /= 2.0;

            let baseline1 = first.endpoint_distance();
            let baseline2 = second.endpoint_distance();

            if dist_from_start <= baseline1 {
                investigated = first;
                end_t -= subdivision_size;
                dist_from_end = baseline1 - dist_from_start;
            } else {
                investigated = second;
                start_t += subdivision_size;
                dist_from_start -= baseline1;
                dist_from_end = baseline2 - dist_from_start;
            }
        }
    }

    /// Endpoints of the flattened curve
    pub fn to_points(&self, opt: CurveOptions<'_>) -> Vec<Point> {
        let subdivisions = self.subdivisions_for(&opt);
        let mut points = Vec::with_capacity(subdivisions.len() + 1);
        points.push(subdivisions.first().map_or(self.start, |c| c.start));
        points.extend(subdivisions.iter().map(|c| c.end));
        points
    }

    pub fn to_polyline(&self, opt: CurveOptions<'_>) -> Polyline {
        Polyline::new(self.to_points(opt))
    }

    /// Rotate every control point around `origin` by `angle` degrees
    pub fn rotate(&self, origin: Point, angle: f64) -> Curve {
        self.map_points(|p| p.rotate(origin, angle))
    }

    pub fn round(&self, precision: u32) -> Curve {
        self.map_points(|p| p.round(precision))
    }

    pub fn scale(&self, sx: f64, sy: f64, origin: Point) -> Curve {
        self.map_points(|p| p.scale(sx, sy, origin))
    }

    pub fn translate(&self, tx: f64, ty: f64) -> Curve {
        self.map_points(|p| p.translate(tx, ty))
    }

    /// Space-separated `x,y` pairs of the four control points
    pub fn serialize(&self) -> String {
        format!(
            "{} {} {} {}",
            self.start.serialize(),
            self.control_point1.serialize(),
            self.control_point2.serialize(),
            self.end.serialize()
        )
    }

    fn map_points(&self, f: impl Fn(Point) -> Point) -> Curve {
        Curve::new(
            f(self.start),
            f(self.control_point1),
            f(self.control_point2),
            f(self.end),
        )
    }

    fn subdivisions_for<'a>(&self, opt: &CurveOptions<'a>) -> Cow<'a, [Curve]> {
        match opt.subdivisions {
            Some(subdivisions) => Cow::Borrowed(subdivisions),
            None => Cow::Owned(self.get_subdivisions(opt.precision)),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.start, self.control_point1, self.control_point2, self.end
        )
    }
}

/// Control points of an open-ended Bézier spline through `knots`
///
/// Solves the tridiagonal system for the first control points on each axis,
/// then derives the second control points from them.
fn spline_control_points(knots: &[Point]) -> (Vec<Point>, Vec<Point>) {
    let n = knots.len() - 1;

    if n == 1 {
        let first = Point::new(
            (2.0 * knots[0].x + knots[1].x) / 3.0,
            (2.0 * knots[0].y + knots[1].y) / 3.0,
        );
        let second = Point::new(2.0 * first.x - knots[0].x, 2.0 * first.y - knots[0].y);
        return (vec![first], vec![second]);
    }

    let axis = |coord: fn(&Point) -> f64| {
        let mut rhs = vec![0.0; n];
        for i in 1..n - 1 {
            rhs[i] = 4.0 * coord(&knots[i]) + 2.0 * coord(&knots[i + 1]);
        }
        rhs[0] = coord(&knots[0]) + 2.0 * coord(&knots[1]);
        rhs[n - 1] = (8.0 * coord(&knots[n - 1]) + coord(&knots[n])) / 2.0;
        solve_first_control_points(&rhs)
    };
    let x = axis(|p| p.x);
    let y = axis(|p| p.y);

    let mut first = Vec::with_capacity(n);
    let mut second = Vec::with_capacity(n);
    for i in 0..n {
        first.push(Point::new(x[i], y[i]));
        if i < n - 1 {
            second.push(Point::new(
                2.0 * knots[i + 1].x - x[i + 1],
                2.0 * knots[i + 1].y - y[i + 1],
            ));
        } else {
            second.push(Point::new(
                (knots[n].x + x[n - 1]) / 2.0,
                (knots[n].y + y[n - 1]) / 2.0,
            ));
        }
    }
    (first, second)
}

fn solve_first_control_points(rhs: &[f64]) -> Vec<f64> {
    let n = rhs.len();
    let mut x = vec![0.0; n];
    let mut tmp = vec![0.0; n];
    let mut b = 2.0;

    x[0] = rhs[0] / b;
    for i in 1..n {
        tmp[i] = 1.0 / b;
        b = (if i < n - 1 { 4.0 } else { 3.5 }) - tmp[i];
        x[i] = (rhs[i] - x[i - 1]) / b;
    }
    for i in 1..n {
        x[n - i - 1] -= tmp[n - i] * x[n - i];
    }
    x
}
