//! Straight line segments

use std::fmt;

use super::helpers::{to_deg, to_rad};
use super::point::Point;
use super::rect::Rect;

/// Cardinal or intercardinal direction of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearing {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Bearing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bearing::N => "N",
            Bearing::NE => "NE",
            Bearing::E => "E",
            Bearing::SE => "SE",
            Bearing::S => "S",
            Bearing::SW => "SW",
            Bearing::W => "W",
            Bearing::NW => "NW",
        }
    }
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Angle of incline in degrees
    pub fn angle(&self) -> f64 {
        let horizontal = Point::new(self.start.x + 1.0, self.start.y);
        self.start.angle_between(self.end, horizontal)
    }

    pub fn bbox(&self) -> Rect {
        let left = self.start.x.min(self.end.x);
        let top = self.start.y.min(self.end.y);
        let right = self.start.x.max(self.end.x);
        let bottom = self.start.y.max(self.end.y);
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Compass bearing of the line
    ///
    /// Treats coordinates as longitude/latitude in degrees.
    pub fn bearing(&self) -> Bearing {
        const BEARINGS: [Bearing; 8] = [
            Bearing::NE,
            Bearing::E,
            Bearing::SE,
            Bearing::S,
            Bearing::SW,
            Bearing::W,
            Bearing::NW,
            Bearing::N,
        ];

        let lat1 = to_rad(self.start.y);
        let lat2 = to_rad(self.end.y);
        let d_lon = to_rad(self.end.x - self.start.x);
        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        let brng = to_deg(y.atan2(x));

        let mut index = brng - 22.5;
        if index < 0.0 {
            index += 360.0;
        }
        let index = ((index / 45.0) as usize).min(BEARINGS.len() - 1);
        BEARINGS[index]
    }

    pub fn closest_point(&self, p: Point) -> Point {
        self.point_at(self.closest_point_normalized_length(p))
    }

    pub fn closest_point_length(&self, p: Point) -> f64 {
        self.closest_point_normalized_length(p) * self.length()
    }

    /// Projection parameter of `p` onto this segment, clamped to [0, 1]
    ///
    /// A zero-length line yields 0.
    pub fn closest_point_normalized_length(&self, p: Point) -> f64 {
        let product = self.vector().dot(Line::new(self.start, p).vector());
        let t = (product / self.squared_length()).max(0.0).min(1.0);
        if t.is_nan() {
            0.0
        } else {
            t
        }
    }

    pub fn closest_point_tangent(&self, p: Point) -> Option<Line> {
        self.tangent_at(self.closest_point_normalized_length(p))
    }

    /// Whether `p` lies on the segment
    pub fn contains_point(&self, p: Point) -> bool {
        if self.start.cross(p, self.end) != 0.0 {
            return false;
        }
        let length = self.length();
        if Line::new(self.start, p).length() > length {
            return false;
        }
        Line::new(p, self.end).length() <= length
    }

    pub fn divide_at(&self, ratio: f64) -> [Line; 2] {
        let divider = self.point_at(ratio);
        [Line::new(self.start, divider), Line::new(divider, self.end)]
    }

    pub fn divide_at_length(&self, length: f64) -> [Line; 2] {
        let divider = self.point_at_length(length);
        [Line::new(self.start, divider), Line::new(divider, self.end)]
    }

    /// Intersection point with another segment, if any
    pub fn intersection_with_line(&self, line: &Line) -> Option<Point> {
        let dir1 = self.vector();
        let dir2 = line.vector();
        let det = dir1.x * dir2.y - dir1.y * dir2.x;
        let delta = line.start - self.start;
        let alpha = delta.x * dir2.y - delta.y * dir2.x;
        let beta = delta.x * dir1.y - delta.y * dir1.x;

        if det == 0.0 || alpha * det < 0.0 || beta * det < 0.0 {
            return None;
        }

        if det > 0.0 {
            if alpha > det || beta > det {
                return None;
            }
        } else if alpha < det || beta < det {
            return None;
        }

        Some(Point::new(
            self.start.x + alpha * dir1.x / det,
            self.start.y + alpha * dir1.y / det,
        ))
    }

    pub fn is_differentiable(&self) -> bool {
        self.start != self.end
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn squared_length(&self) -> f64 {
        self.start.squared_distance(self.end)
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// A copy of the line shifted sideways by `distance`
    ///
    /// Positive distances shift to the right of the direction of travel.
    pub fn parallel(&self, distance: f64) -> Line {
        if !self.is_differentiable() {
            return *self;
        }
        let e_ref = self.start.rotate(self.end, 270.0);
        let s_ref = self.end.rotate(self.start, 90.0);
        Line::new(
            self.start.move_away_from(s_ref, distance),
            self.end.move_away_from(e_ref, distance),
        )
    }

    /// Point at parameter `t`, clamped to the segment
    pub fn point_at(&self, t: f64) -> Point {
        if t <= 0.0 {
            return self.start;
        }
        if t >= 1.0 {
            return self.end;
        }
        self.start.lerp(self.end, t)
    }

    /// Point at `length` from the start, or from the end when negative
    pub fn point_at_length(&self, length: f64) -> Point {
        let from_start = length >= 0.0;
        let length = length.abs();
        let line_length = self.length();
        if length >= line_length {
            return if from_start { self.end } else { self.start };
        }
        let along = if from_start { length } else { line_length - length };
        self.point_at(along / line_length)
    }

    /// Signed perpendicular distance of `p` from the line
    ///
    /// Positive when `p` lies on the right side of the line.
    pub fn point_offset(&self, p: Point) -> f64 {
        let det = (self.end.x - self.start.x) * (p.y - self.start.y)
            - (self.end.y - self.start.y) * (p.x - self.start.x);
        det / self.length()
    }

    pub fn rotate(&self, origin: Point, angle: f64) -> Line {
        Line::new(self.start.rotate(origin, angle), self.end.rotate(origin, angle))
    }

    pub fn round(&self, precision: u32) -> Line {
        Line::new(self.start.round(precision), self.end.round(precision))
    }

    pub fn scale(&self, sx: f64, sy: f64, origin: Point) -> Line {
        Line::new(
            self.start.scale(sx, sy, origin),
            self.end.scale(sx, sy, origin),
        )
    }

    /// Scale about the start point so the line has the requested length
    pub fn set_length(&self, length: f64) -> Line {
        let current = self.length();
        if current == 0.0 {
            return *self;
        }
        let factor = length / current;
        self.scale(factor, factor, self.start)
    }

    /// The line moved so that it starts at `point_at(t)`
    pub fn tangent_at(&self, t: f64) -> Option<Line> {
        if !self.is_differentiable() {
            return None;
        }
        let at = self.point_at(t);
        Some(self.translate(at.x - self.start.x, at.y - self.start.y))
    }

    pub fn tangent_at_length(&self, length: f64) -> Option<Line> {
        if !self.is_differentiable() {
            return None;
        }
        let at = self.point_at_length(length);
        Some(self.translate(at.x - self.start.x, at.y - self.start.y))
    }

    pub fn translate(&self, tx: f64, ty: f64) -> Line {
        Line::new(self.start.translate(tx, ty), self.end.translate(tx, ty))
    }

    pub fn vector(&self) -> Point {
        self.end - self.start
    }

    pub fn serialize(&self) -> String {
        format!("{} {}", self.start.serialize(), self.end.serialize())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn test_closest_point_normalized_length_is_clamped() {
        let l = line(0.0, 0.0, 10.0, 0.0);
        assert_eq!(l.closest_point_normalized_length(Point::new(5.0, 3.0)), 0.5);
        assert_eq!(l.closest_point_normalized_length(Point::new(-5.0, 3.0)), 0.0);
        assert_eq!(l.closest_point_normalized_length(Point::new(50.0, 3.0)), 1.0);
    }

    #[test]
    fn test_closest_point_on_degenerate_line() {
        let l = line(4.0, 4.0, 4.0, 4.0);
        assert_eq!(l.closest_point_normalized_length(Point::new(1.0, 1.0)), 0.0);
        assert_eq!(l.closest_point(Point::new(1.0, 1.0)), Point::new(4.0, 4.0));
    }

    #[test]
    fn test_intersection_with_line() {
        let a = line(0.0, 0.0, 10.0, 10.0);
        let b = line(0.0, 10.0, 10.0, 0.0);
        assert_eq!(a.intersection_with_line(&b), Some(Point::new(5.0, 5.0)));

        let parallel = line(0.0, 1.0, 10.0, 11.0);
        assert_eq!(a.intersection_with_line(&parallel), None);

        let short = line(0.0, 10.0, 4.0, 6.0);
        assert_eq!(a.intersection_with_line(&short), None);
    }

    #[test]
    fn test_point_offset_sign() {
        let l = line(0.0, 0.0, 10.0, 0.0);
        assert!(approx_eq(l.point_offset(Point::new(5.0, 3.0)), 3.0));
        assert!(approx_eq(l.point_offset(Point::new(5.0, -3.0)), -3.0));
        assert_eq!(l.point_offset(Point::new(5.0, 0.0)), 0.0);
    }

    #[test]
    fn test_point_at_length_negative_measures_from_end() {
        let l = line(0.0, 0.0, 10.0, 0.0);
        assert_eq!(l.point_at_length(3.0), Point::new(3.0, 0.0));
        assert_eq!(l.point_at_length(-3.0), Point::new(7.0, 0.0));
        assert_eq!(l.point_at_length(30.0), Point::new(10.0, 0.0));
        assert_eq!(l.point_at_length(-30.0), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_contains_point() {
        let l = line(0.0, 0.0, 10.0, 10.0);
        assert!(l.contains_point(Point::new(5.0, 5.0)));
        assert!(!l.contains_point(Point::new(11.0, 11.0)));
        assert!(!l.contains_point(Point::new(5.0, 6.0)));
    }

    #[test]
    fn test_tangent_requires_differentiable_line() {
        assert!(line(1.0, 1.0, 1.0, 1.0).tangent_at(0.5).is_none());
        let t = line(0.0, 0.0, 10.0, 0.0).tangent_at(0.5).unwrap();
        assert_eq!(t, line(5.0, 0.0, 15.0, 0.0));
    }

    #[test]
    fn test_angle_and_bearing() {
        assert!(approx_eq(line(0.0, 0.0, 10.0, -10.0).angle(), 315.0));
        assert_eq!(line(0.0, 0.0, -10.0, 0.0).bearing(), Bearing::W);
    }

    #[test]
    fn test_parallel() {
        let p = line(0.0, 0.0, 10.0, 0.0).parallel(5.0);
        assert!(approx_eq(p.start.y, 5.0) && approx_eq(p.end.y, 5.0));
        assert!(approx_eq(p.start.x, 0.0) && approx_eq(p.end.x, 10.0));
    }

    #[test]
    fn test_set_length_and_divide() {
        let l = line(0.0, 0.0, 10.0, 0.0).set_length(20.0);
        assert_eq!(l.end, Point::new(20.0, 0.0));
        let [a, b] = l.divide_at(0.25);
        assert_eq!(a.end, Point::new(5.0, 0.0));
        assert_eq!(b.start, Point::new(5.0, 0.0));
    }
}
