//! Axis-aligned rectangles
//!
//! Width and height may be negative; [`Rect::normalize`] flips such a
//! rectangle into its canonical form. `Rect` is `Copy`, so every operation
//! returns a new value and the receiver is never aliased.

use std::fmt;

use super::ellipse::Ellipse;
use super::helpers::{round_to, to_rad};
use super::line::Line;
use super::point::Point;

/// One side of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Per-axis scale factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub sx: f64,
    pub sy: f64,
}

/// A rectangle given by its origin and size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized rectangle at `p`
    pub fn at(p: Point) -> Self {
        Self::new(p.x, p.y, 0.0, 0.0)
    }

    /// Rectangle spanned by two opposite corners
    pub fn from_points(origin: Point, corner: Point) -> Self {
        Self::new(origin.x, origin.y, corner.x - origin.x, corner.y - origin.y)
    }

    /// The bounding box of an ellipse
    pub fn from_ellipse(e: &Ellipse) -> Self {
        Self::new(e.x - e.a, e.y - e.b, 2.0 * e.a, 2.0 * e.b)
    }

    /// Smallest rectangle containing every point, `None` for no points
    pub fn from_point_union<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut any = false;
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            any = true;
            if p.x < min_x {
                min_x = p.x;
            }
            if p.x > max_x {
                max_x = p.x;
            }
            if p.y < min_y {
                min_y = p.y;
            }
            if p.y > max_y {
                max_y = p.y;
            }
        }
        any.then(|| Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Smallest rectangle containing every rectangle, `None` for no rectangles
    pub fn from_rect_union<I: IntoIterator<Item = Rect>>(rects: I) -> Option<Self> {
        let mut any = false;
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for r in rects {
            any = true;
            let (mx, my) = (r.x + r.width, r.y + r.height);
            if r.x < min_x {
                min_x = r.x;
            }
            if mx > max_x {
                max_x = mx;
            }
            if r.y < min_y {
                min_y = r.y;
            }
            if my > max_y {
                max_y = my;
            }
        }
        any.then(|| Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Bounding box of this rectangle rotated by `angle` degrees around its center
    pub fn bbox(&self, angle: f64) -> Rect {
        self.rotate_around_center(angle)
    }

    pub fn rotate_around_center(&self, angle: f64) -> Rect {
        if angle == 0.0 || angle.is_nan() {
            return *self;
        }
        let theta = to_rad(angle);
        let st = theta.sin().abs();
        let ct = theta.cos().abs();
        let w = self.width * ct + self.height * st;
        let h = self.width * st + self.height * ct;
        Rect::new(
            self.x + (self.width - w) / 2.0,
            self.y + (self.height - h) / 2.0,
            w,
            h,
        )
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn corner(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_left(&self) -> Point {
        self.origin()
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.x + self.width, self.y)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.x, self.y + self.height)
    }

    pub fn bottom_right(&self) -> Point {
        self.corner()
    }

    pub fn top_middle(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y)
    }

    pub fn right_middle(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height / 2.0)
    }

    pub fn bottom_middle(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height)
    }

    pub fn left_middle(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }

    pub fn top_line(&self) -> Line {
        Line::new(self.top_left(), self.top_right())
    }

    pub fn right_line(&self) -> Line {
        Line::new(self.top_right(), self.bottom_right())
    }

    pub fn bottom_line(&self) -> Line {
        Line::new(self.bottom_left(), self.bottom_right())
    }

    pub fn left_line(&self) -> Line {
        Line::new(self.top_left(), self.bottom_left())
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x
            && p.x <= self.x + self.width
            && p.y >= self.y
            && p.y <= self.y + self.height
    }

    /// Whether `r` lies inside this rectangle
    ///
    /// Always false when either rectangle has a zero dimension.
    pub fn contains_rect(&self, r: &Rect) -> bool {
        let r0 = self.normalize();
        let r1 = r.normalize();
        if r0.width == 0.0 || r0.height == 0.0 || r1.width == 0.0 || r1.height == 0.0 {
            return false;
        }
        r0.x <= r1.x
            && r1.x + r1.width <= r0.x + r0.width
            && r0.y <= r1.y
            && r1.y + r1.height <= r0.y + r0.height
    }

    /// Equality of the normalized forms
    pub fn equals(&self, r: &Rect) -> bool {
        self.normalize() == r.normalize()
    }

    /// Grow by `dx` on the left and right and by `dy` on the top and bottom
    pub fn inflate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2.0 * dx,
            self.height + 2.0 * dy,
        )
    }

    /// Overlapping area of two rectangles, `None` when they only touch or are apart
    pub fn intersect(&self, r: &Rect) -> Option<Rect> {
        let my_origin = self.origin();
        let my_corner = self.corner();
        let r_origin = r.origin();
        let r_corner = r.corner();

        if r_corner.x <= my_origin.x
            || r_corner.y <= my_origin.y
            || r_origin.x >= my_corner.x
            || r_origin.y >= my_corner.y
        {
            return None;
        }

        let x = my_origin.x.max(r_origin.x);
        let y = my_origin.y.max(r_origin.y);
        Some(Rect::new(
            x,
            y,
            my_corner.x.min(r_corner.x) - x,
            my_corner.y.min(r_corner.y) - y,
        ))
    }

    /// Distinct points where `line` crosses the boundary
    pub fn intersection_with_line(&self, line: &Line) -> Option<Vec<Point>> {
        let sides = [
            self.top_line(),
            self.right_line(),
            self.bottom_line(),
            self.left_line(),
        ];
        let mut points: Vec<Point> = Vec::new();
        for side in &sides {
            if let Some(p) = line.intersection_with_line(side) {
                if !points.contains(&p) {
                    points.push(p);
                }
            }
        }
        (!points.is_empty()).then_some(points)
    }

    /// Boundary point hit by the ray from the center towards `p`
    ///
    /// A non-zero `angle` treats the rectangle as rotated by that many degrees
    /// around its center.
    pub fn intersection_with_line_from_center_to_point(
        &self,
        p: Point,
        angle: f64,
    ) -> Option<Point> {
        let center = self.center();
        let p = if angle != 0.0 { p.rotate(center, angle) } else { p };

        let sides = [
            self.top_line(),
            self.right_line(),
            self.bottom_line(),
            self.left_line(),
        ];
        let connector = Line::new(center, p);

        let result = sides
            .iter()
            .rev()
            .find_map(|side| side.intersection_with_line(&connector));

        match result {
            Some(r) if angle != 0.0 => Some(r.rotate(center, -angle)),
            other => other,
        }
    }

    /// Largest scale of `rect` about `origin` that keeps it inside this rectangle
    ///
    /// `origin` defaults to the center of `rect`. Axes with no constraining
    /// corner yield infinity.
    pub fn max_rect_scale_to_fit(&self, rect: &Rect, origin: Option<Point>) -> ScaleFactors {
        let origin = origin.unwrap_or_else(|| rect.center());
        let (ox, oy) = (origin.x, origin.y);
        let mut sx = [f64::INFINITY; 4];
        let mut sy = [f64::INFINITY; 4];

        let p1 = rect.top_left();
        if p1.x < ox {
            sx[0] = (self.x - ox) / (p1.x - ox);
        }
        if p1.y < oy {
            sy[0] = (self.y - oy) / (p1.y - oy);
        }
        let p2 = rect.bottom_right();
        if p2.x > ox {
            sx[1] = (self.x + self.width - ox) / (p2.x - ox);
        }
        if p2.y > oy {
            sy[1] = (self.y + self.height - oy) / (p2.y - oy);
        }
        let p3 = rect.top_right();
        if p3.x > ox {
            sx[2] = (self.x + self.width - ox) / (p3.x - ox);
        }
        if p3.y < oy {
            sy[2] = (self.y - oy) / (p3.y - oy);
        }
        let p4 = rect.bottom_left();
        if p4.x < ox {
            sx[3] = (self.x - ox) / (p4.x - ox);
        }
        if p4.y > oy {
            sy[3] = (self.y + self.height - oy) / (p4.y - oy);
        }

        ScaleFactors {
            sx: sx.iter().copied().fold(f64::INFINITY, f64::min),
            sy: sy.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    pub fn max_rect_uniform_scale_to_fit(&self, rect: &Rect, origin: Option<Point>) -> f64 {
        let scale = self.max_rect_scale_to_fit(rect, origin);
        scale.sx.min(scale.sy)
    }

    /// Offset the origin and grow the size by the fields of `delta`
    pub fn move_and_expand(&self, delta: &Rect) -> Rect {
        Rect::new(
            self.x + delta.x,
            self.y + delta.y,
            self.width + delta.width,
            self.height + delta.height,
        )
    }

    /// Flip negative dimensions so width and height are non-negative
    pub fn normalize(&self) -> Rect {
        let mut r = *self;
        if self.width < 0.0 {
            r.x = self.x + self.width;
            r.width = -self.width;
        }
        if self.height < 0.0 {
            r.y = self.y + self.height;
            r.height = -self.height;
        }
        r
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        self.offset(dx, dy)
    }

    /// Point on the boundary nearest to `point`
    pub fn point_nearest_to_point(&self, point: Point) -> Point {
        if self.contains_point(point) {
            return match self.side_nearest_to_point(point) {
                Side::Right => Point::new(self.x + self.width, point.y),
                Side::Left => Point::new(self.x, point.y),
                Side::Bottom => Point::new(point.x, self.y + self.height),
                Side::Top => Point::new(point.x, self.y),
            };
        }
        point.adhere_to_rect(self)
    }

    pub fn side_nearest_to_point(&self, point: Point) -> Side {
        let dist_to_left = point.x - self.x;
        let dist_to_right = (self.x + self.width) - point.x;
        let dist_to_top = point.y - self.y;
        let dist_to_bottom = (self.y + self.height) - point.y;

        let mut closest = dist_to_left;
        let mut side = Side::Left;
        if dist_to_right < closest {
            closest = dist_to_right;
            side = Side::Right;
        }
        if dist_to_top < closest {
            closest = dist_to_top;
            side = Side::Top;
        }
        if dist_to_bottom < closest {
            side = Side::Bottom;
        }
        side
    }

    pub fn round(&self, precision: u32) -> Rect {
        Rect::new(
            round_to(self.x, precision),
            round_to(self.y, precision),
            round_to(self.width, precision),
            round_to(self.height, precision),
        )
    }

    /// Scale relative to `origin`
    pub fn scale(&self, sx: f64, sy: f64, origin: Point) -> Rect {
        let o = self.origin().scale(sx, sy, origin);
        Rect::new(o.x, o.y, self.width * sx, self.height * sy)
    }

    pub fn snap_to_grid(&self, gx: f64, gy: f64) -> Rect {
        let origin = self.origin().snap_to_grid(gx, gy);
        let corner = self.corner().snap_to_grid(gx, gy);
        Rect::from_points(origin, corner)
    }

    pub fn union(&self, r: &Rect) -> Rect {
        Rect::new(
            self.x.min(r.x),
            self.y.min(r.y),
            (self.x + self.width).max(r.x + r.width) - self.x.min(r.x),
            (self.y + self.height).max(r.y + r.height) - self.y.min(r.y),
        )
    }

    pub fn serialize(&self) -> String {
        format!(
            "{} {}",
            self.origin().serialize(),
            self.corner().serialize()
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.origin(), self.corner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            a.intersect(&Rect::new(5.0, 5.0, 10.0, 10.0)),
            Some(Rect::new(5.0, 5.0, 5.0, 5.0))
        );
        assert_eq!(a.intersect(&Rect::new(20.0, 20.0, 5.0, 5.0)), None);
        // touching edges do not count
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn test_union() {
        let u = Rect::new(0.0, 0.0, 10.0, 10.0).union(&Rect::new(5.0, -5.0, 10.0, 10.0));
        assert_eq!(u, Rect::new(0.0, -5.0, 15.0, 15.0));
        assert_eq!(Rect::from_rect_union(Vec::new()), None);
        assert_eq!(
            Rect::from_point_union([Point::new(3.0, 1.0), Point::new(-1.0, 4.0)]),
            Some(Rect::new(-1.0, 1.0, 4.0, 3.0))
        );
    }

    #[test]
    fn test_normalize_and_equals() {
        let r = Rect::new(10.0, 10.0, -10.0, -5.0);
        assert_eq!(r.normalize(), Rect::new(0.0, 5.0, 10.0, 5.0));
        assert!(r.equals(&Rect::new(0.0, 5.0, 10.0, 5.0)));
    }

    #[test]
    fn test_contains_rect_rejects_zero_dimensions() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains_rect(&Rect::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!r.contains_rect(&Rect::new(1.0, 1.0, 0.0, 2.0)));
        assert!(!r.contains_rect(&Rect::new(5.0, 5.0, 10.0, 2.0)));
    }

    #[test]
    fn test_intersection_with_line_dedupes_corners() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let diagonal = Line::new(Point::new(-5.0, -5.0), Point::new(15.0, 15.0));
        let points = r.intersection_with_line(&diagonal).unwrap();
        assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);

        let outside = Line::new(Point::new(20.0, 0.0), Point::new(30.0, 0.0));
        assert_eq!(r.intersection_with_line(&outside), None);
    }

    #[test]
    fn test_intersection_from_center() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            r.intersection_with_line_from_center_to_point(Point::new(20.0, 5.0), 0.0),
            Some(Point::new(10.0, 5.0))
        );
        assert_eq!(
            r.intersection_with_line_from_center_to_point(Point::new(6.0, 6.0), 0.0),
            None
        );
    }

    #[test]
    fn test_max_rect_scale_to_fit() {
        let container = Rect::new(0.0, 0.0, 100.0, 50.0);
        let shape = Rect::new(0.0, 0.0, 10.0, 10.0);
        let s = container.max_rect_scale_to_fit(&shape, Some(Point::ZERO));
        assert!(approx_eq(s.sx, 10.0));
        assert!(approx_eq(s.sy, 5.0));
        assert!(approx_eq(
            container.max_rect_uniform_scale_to_fit(&shape, Some(Point::ZERO)),
            5.0
        ));
    }

    #[test]
    fn test_rotated_bbox() {
        let r = Rect::new(0.0, 0.0, 10.0, 20.0).bbox(90.0);
        assert!(approx_eq(r.width, 20.0));
        assert!(approx_eq(r.height, 10.0));
        assert!(approx_eq(r.x, -5.0));
        assert!(approx_eq(r.y, 5.0));
    }

    #[test]
    fn test_side_and_point_nearest() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(r.side_nearest_to_point(Point::new(9.0, 5.0)), Side::Right);
        assert_eq!(r.point_nearest_to_point(Point::new(5.0, 1.0)), Point::new(5.0, 0.0));
        assert_eq!(r.point_nearest_to_point(Point::new(-5.0, 5.0)), Point::new(0.0, 5.0));
    }

    #[test]
    fn test_snap_and_round() {
        let r = Rect::new(1.0, 2.0, 13.0, 14.0).snap_to_grid(5.0, 5.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(
            Rect::new(0.123, 0.456, 1.001, 2.009).round(2),
            Rect::new(0.12, 0.46, 1.0, 2.01)
        );
    }
}
