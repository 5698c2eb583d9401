//! 2-D point and vector operations
//!
//! The y-axis points down, as in SVG. Angles measured by [`Point::theta`] are
//! therefore counter-clockwise on screen, and rotations by positive angles
//! turn the same way.

use std::fmt;
use std::ops::{Add, Sub};

use super::helpers::{normalize_angle, round_to, snap_to_grid, to_deg, to_rad};
use super::line::{Bearing, Line};
use super::rect::Rect;

/// A 2D point in the coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a point from polar coordinates around `origin`
    ///
    /// `angle` is in radians.
    pub fn from_polar(distance: f64, angle: f64, origin: Point) -> Self {
        let mut x = (distance * angle.cos()).abs();
        let mut y = (distance * angle.sin()).abs();
        let deg = normalize_angle(to_deg(angle));

        if deg < 90.0 {
            y = -y;
        } else if deg < 180.0 {
            x = -x;
            y = -y;
        } else if deg < 270.0 {
            x = -x;
        }

        Self::new(origin.x + x, origin.y + y)
    }

    /// The point from `points` closest to this one
    pub fn choose_closest(&self, points: &[Point]) -> Option<Point> {
        let mut closest = None;
        let mut min_sqr_distance = f64::INFINITY;
        for p in points {
            let d = self.squared_distance(*p);
            if d < min_sqr_distance || points.len() == 1 {
                closest = Some(*p);
                min_sqr_distance = d;
            }
        }
        closest
    }

    /// Clamp the point onto the boundary of `rect` if it lies outside it
    pub fn adhere_to_rect(self, rect: &Rect) -> Self {
        if rect.contains_point(self) {
            return self;
        }
        Self::new(
            self.x.max(rect.x).min(rect.x + rect.width),
            self.y.max(rect.y).min(rect.y + rect.height),
        )
    }

    /// Sweep from the ray towards `p1` to the ray towards `p2`, in [0, 360)
    ///
    /// NaN when this point coincides with either `p1` or `p2`.
    pub fn angle_between(&self, p1: Point, p2: Point) -> f64 {
        if *self == p1 || *self == p2 {
            return f64::NAN;
        }
        let angle = self.theta(p2) - self.theta(p1);
        if angle < 0.0 {
            angle + 360.0
        } else {
            angle
        }
    }

    /// Compass bearing from this point towards `p`
    pub fn bearing(&self, p: Point) -> Bearing {
        Line::new(*self, p).bearing()
    }

    /// Change in angle around `reference` after moving by (dx, dy)
    pub fn change_in_angle(&self, dx: f64, dy: f64, reference: Point) -> f64 {
        self.offset(-dx, -dy).theta(reference) - self.theta(reference)
    }

    /// Cross product of (this -> p1) and (this -> p2)
    ///
    /// Negative for a clockwise turn on screen from the first vector to the
    /// second one, zero for collinear points.
    pub fn cross(&self, p1: Point, p2: Point) -> f64 {
        (p2.x - self.x) * (p1.y - self.y) - (p2.y - self.y) * (p1.x - self.x)
    }

    pub fn difference(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x - dx, self.y - dy)
    }

    pub fn distance(&self, p: Point) -> f64 {
        self.squared_distance(p).sqrt()
    }

    pub fn dot(&self, p: Point) -> f64 {
        self.x * p.x + self.y * p.y
    }

    /// Linear interpolation towards `p`
    pub fn lerp(&self, p: Point, t: f64) -> Self {
        Self::new(
            (1.0 - t) * self.x + t * p.x,
            (1.0 - t) * self.y + t * p.y,
        )
    }

    /// Distance from the origin, never zero
    pub fn magnitude(&self) -> f64 {
        let m = (self.x * self.x + self.y * self.y).sqrt();
        if m == 0.0 || m.is_nan() {
            0.01
        } else {
            m
        }
    }

    pub fn manhattan_distance(&self, p: Point) -> f64 {
        (p.x - self.x).abs() + (p.y - self.y).abs()
    }

    /// Move along the line from `reference` through this point by `distance`
    pub fn move_away_from(self, reference: Point, distance: f64) -> Self {
        let theta = to_rad(reference.theta(self));
        self.offset(theta.cos() * distance, -theta.sin() * distance)
    }

    /// Scale so that the distance from the origin equals `length`
    pub fn normalize(self, length: f64) -> Self {
        let length = if length == 0.0 { 1.0 } else { length };
        let scale = length / self.magnitude();
        self.scale(scale, scale, Point::ZERO)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        self.offset(dx, dy)
    }

    /// Reflection of this point through `reference`
    pub fn reflection(&self, reference: Point) -> Self {
        reference.move_away_from(*self, self.distance(reference))
    }

    /// Rotate around `origin` by `angle` degrees, counter-clockwise on screen
    pub fn rotate(self, origin: Point, angle: f64) -> Self {
        if angle == 0.0 {
            return self;
        }
        let angle = to_rad(normalize_angle(-angle));
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;
        Self::new(
            cos * dx - sin * dy + origin.x,
            sin * dx + cos * dy + origin.y,
        )
    }

    /// Round both coordinates to `precision` fractional digits
    pub fn round(self, precision: u32) -> Self {
        Self::new(round_to(self.x, precision), round_to(self.y, precision))
    }

    /// Scale relative to `origin`
    pub fn scale(self, sx: f64, sy: f64, origin: Point) -> Self {
        Self::new(
            origin.x + sx * (self.x - origin.x),
            origin.y + sy * (self.y - origin.y),
        )
    }

    pub fn snap_to_grid(self, gx: f64, gy: f64) -> Self {
        Self::new(snap_to_grid(self.x, gx), snap_to_grid(self.y, gy))
    }

    pub fn squared_distance(&self, p: Point) -> f64 {
        let dx = self.x - p.x;
        let dy = self.y - p.y;
        dx * dx + dy * dy
    }

    /// Angle in degrees between the x-axis and the ray from this point to `p`
    ///
    /// The y-axis is inverted before measuring; the result lies in [0, 360).
    pub fn theta(&self, p: Point) -> f64 {
        let y = -(p.y - self.y);
        let x = p.x - self.x;
        let mut rad = y.atan2(x);
        if rad < 0.0 {
            rad += 2.0 * std::f64::consts::PI;
        }
        180.0 * rad / std::f64::consts::PI
    }

    /// Convert to polar coordinates `(r, angle_rad)` around `origin`
    pub fn to_polar(&self, origin: Point) -> Self {
        Self::new(self.distance(origin), to_rad(origin.theta(*self)))
    }

    /// Angle between the vectors (0,0 -> self) and (0,0 -> p)
    pub fn vector_angle(&self, p: Point) -> f64 {
        Point::ZERO.angle_between(*self, p)
    }

    /// `"x,y"` form used inside path and points data
    pub fn serialize(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
