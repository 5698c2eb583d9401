//! Axis-aligned ellipses

use std::fmt;

use super::helpers::round_to;
use super::line::Line;
use super::point::Point;
use super::rect::Rect;

/// An ellipse centered at (x, y) with semi-axes `a` (horizontal) and `b` (vertical)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ellipse {
    pub x: f64,
    pub y: f64,
    pub a: f64,
    pub b: f64,
}

impl Ellipse {
    pub fn new(center: Point, a: f64, b: f64) -> Self {
        Self {
            x: center.x,
            y: center.y,
            a,
            b,
        }
    }

    /// The ellipse inscribed in `rect`
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(rect.center(), rect.width / 2.0, rect.height / 2.0)
    }

    pub fn bbox(&self) -> Rect {
        Rect::from_ellipse(self)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.normalized_distance(p) <= 1.0
    }

    /// Below 1 inside, exactly 1 on the boundary, above 1 outside
    pub fn normalized_distance(&self, p: Point) -> f64 {
        let dx = p.x - self.x;
        let dy = p.y - self.y;
        (dx * dx) / (self.a * self.a) + (dy * dy) / (self.b * self.b)
    }

    /// Grow the semi-axes by twice `dx` and `dy`
    pub fn inflate(&self, dx: f64, dy: f64) -> Ellipse {
        Ellipse {
            a: self.a + 2.0 * dx,
            b: self.b + 2.0 * dy,
            ..*self
        }
    }

    /// Points where the segment crosses the ellipse boundary
    pub fn intersection_with_line(&self, line: &Line) -> Option<Vec<Point>> {
        let a1 = line.start;
        let a2 = line.end;
        let rx2 = self.a * self.a;
        let ry2 = self.b * self.b;
        let dir = line.vector();
        let diff = a1 - self.center();
        let m_dir = Point::new(dir.x / rx2, dir.y / ry2);
        let m_diff = Point::new(diff.x / rx2, diff.y / ry2);

        let a = dir.dot(m_dir);
        let b = dir.dot(m_diff);
        let c = diff.dot(m_diff) - 1.0;
        let d = b * b - a * c;

        let in_range = |t: f64| (0.0..=1.0).contains(&t);

        if d < 0.0 {
            None
        } else if d > 0.0 {
            let root = d.sqrt();
            let ta = (-b - root) / a;
            let tb = (-b + root) / a;
            if !in_range(ta) && !in_range(tb) {
                return None;
            }
            let mut points = Vec::with_capacity(2);
            if in_range(ta) {
                points.push(a1.lerp(a2, ta));
            }
            if in_range(tb) {
                points.push(a1.lerp(a2, tb));
            }
            Some(points)
        } else {
            let t = -b / a;
            in_range(t).then(|| vec![a1.lerp(a2, t)])
        }
    }

    /// Boundary point hit by the ray from the center towards `p`
    ///
    /// A non-zero `angle` treats the ellipse as rotated by that many degrees.
    pub fn intersection_with_line_from_center_to_point(&self, p: Point, angle: f64) -> Point {
        let center = self.center();
        let p = if angle != 0.0 { p.rotate(center, angle) } else { p };
        let dx = p.x - self.x;
        let dy = p.y - self.y;

        let result = if dx == 0.0 {
            self.bbox().point_nearest_to_point(p)
        } else {
            let m = dy / dx;
            let a2 = self.a * self.a;
            let b2 = self.b * self.b;
            let mut x = (1.0 / ((1.0 / a2) + (m * m / b2))).sqrt();
            if dx < 0.0 {
                x = -x;
            }
            Point::new(self.x + x, self.y + m * x)
        };

        if angle != 0.0 {
            result.rotate(center, -angle)
        } else {
            result
        }
    }

    pub fn round(&self, precision: u32) -> Ellipse {
        Ellipse {
            x: round_to(self.x, precision),
            y: round_to(self.y, precision),
            a: round_to(self.a, precision),
            b: round_to(self.b, precision),
        }
    }

    /// Angle in degrees between the x-axis and the tangent at boundary point `p`
    pub fn tangent_theta(&self, p: Point) -> f64 {
        const REF_POINT_DELTA: f64 = 30.0;

        let (x0, y0) = (p.x, p.y);
        let (a, b) = (self.a, self.b);
        let center = self.bbox().center();
        let (m, n) = (center.x, center.y);

        let q1 = x0 > center.x + a / 2.0;
        let q3 = x0 < center.x - a / 2.0;

        let (x, y);
        if q1 || q3 {
            y = if x0 > center.x {
                y0 - REF_POINT_DELTA
            } else {
                y0 + REF_POINT_DELTA
            };
            x = (a * a / (x0 - m)) - (a * a * (y0 - n) * (y - n)) / (b * b * (x0 - m)) + m;
        } else {
            x = if y0 > center.y {
                x0 + REF_POINT_DELTA
            } else {
                x0 - REF_POINT_DELTA
            };
            y = (b * b / (y0 - n)) - (b * b * (x0 - m) * (x - m)) / (a * a * (y0 - n)) + n;
        }

        Point::new(x, y).theta(p)
    }
}

impl fmt::Display for Ellipse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.center(), self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn unit() -> Ellipse {
        Ellipse::new(Point::ZERO, 20.0, 10.0)
    }

    #[test]
    fn test_bbox_and_from_rect() {
        let e = unit();
        assert_eq!(e.bbox(), Rect::new(-20.0, -10.0, 40.0, 20.0));
        assert_eq!(Ellipse::from_rect(&e.bbox()), e);
    }

    #[test]
    fn test_contains_point() {
        let e = unit();
        assert!(e.contains_point(Point::new(20.0, 0.0)));
        assert!(e.contains_point(Point::new(5.0, 5.0)));
        assert!(!e.contains_point(Point::new(20.0, 10.0)));
    }

    #[test]
    fn test_intersection_with_line() {
        let e = unit();
        let through = Line::new(Point::new(-30.0, 0.0), Point::new(30.0, 0.0));
        let points = e.intersection_with_line(&through).unwrap();
        assert_eq!(points.len(), 2);
        assert!(approx_eq(points[0].x, -20.0));
        assert!(approx_eq(points[1].x, 20.0));

        let inside = Line::new(Point::new(-1.0, 0.0), Point::new(1.0, 0.0));
        assert_eq!(e.intersection_with_line(&inside), None);

        let miss = Line::new(Point::new(-30.0, 20.0), Point::new(30.0, 20.0));
        assert_eq!(e.intersection_with_line(&miss), None);
    }

    #[test]
    fn test_intersection_from_center() {
        let e = unit();
        let p = e.intersection_with_line_from_center_to_point(Point::new(100.0, 0.0), 0.0);
        assert!(approx_eq(p.x, 20.0) && approx_eq(p.y, 0.0));
        let q = e.intersection_with_line_from_center_to_point(Point::new(0.0, 50.0), 0.0);
        assert_eq!(q, Point::new(0.0, 10.0));
    }

    #[test]
    fn test_tangent_theta_at_extremes() {
        let e = unit();
        // at the top of the ellipse the tangent is horizontal
        let theta = e.tangent_theta(Point::new(0.0, -10.0));
        assert!(approx_eq(theta % 180.0, 0.0));
    }

    #[test]
    fn test_inflate() {
        let e = unit().inflate(1.0, 2.0);
        assert_eq!((e.a, e.b), (22.0, 14.0));
    }
}
