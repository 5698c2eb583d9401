//! Boolean intersection tests between shapes
//!
//! Polygons are closed polylines: their interior counts, so a shape fully
//! inside a polygon intersects it. Polylines only count their outline. Paths
//! are flattened per subpath; a subpath ending in a closepath behaves as a
//! polygon.

use super::ellipse::Ellipse;
use super::line::Line;
use super::options::PathOptions;
use super::path::{Path, Segment};
use super::point::Point;
use super::polyline::Polyline;
use super::rect::Rect;

/// A shape taking part in an intersection test
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Line(&'a Line),
    Ellipse(&'a Ellipse),
    Rect(&'a Rect),
    Polyline(&'a Polyline),
    Polygon(&'a Polyline),
    Path(&'a Path, PathOptions<'a>),
}

impl<'a> From<&'a Line> for Shape<'a> {
    fn from(line: &'a Line) -> Self {
        Shape::Line(line)
    }
}

impl<'a> From<&'a Ellipse> for Shape<'a> {
    fn from(ellipse: &'a Ellipse) -> Self {
        Shape::Ellipse(ellipse)
    }
}

impl<'a> From<&'a Rect> for Shape<'a> {
    fn from(rect: &'a Rect) -> Self {
        Shape::Rect(rect)
    }
}

impl<'a> From<&'a Polyline> for Shape<'a> {
    fn from(polyline: &'a Polyline) -> Self {
        Shape::Polyline(polyline)
    }
}

impl<'a> From<&'a Path> for Shape<'a> {
    fn from(path: &'a Path) -> Self {
        Shape::Path(path, PathOptions::default())
    }
}

/// Whether two shapes intersect; symmetric in its arguments
pub fn exists(a: Shape<'_>, b: Shape<'_>) -> bool {
    use Shape as S;

    match (a, b) {
        (S::Line(l1), S::Line(l2)) => line_with_line(l1, l2),

        (S::Ellipse(e), S::Line(l)) => ellipse_with_line(e, l),
        (S::Ellipse(e1), S::Ellipse(e2)) => ellipse_with_ellipse(e1, e2),

        (S::Rect(r), S::Line(l)) => rect_with_line(r, l),
        (S::Rect(r), S::Ellipse(e)) => rect_with_ellipse(r, e),
        (S::Rect(r1), S::Rect(r2)) => rect_with_rect(r1, r2),

        (S::Polyline(p), S::Line(l)) => polyline_with_line(p, l, false),
        (S::Polyline(p), S::Ellipse(e)) => polyline_with_ellipse(p, e, false),
        (S::Polyline(p), S::Rect(r)) => polyline_with_polygon(p, &Polyline::from_rect(r), false),
        (S::Polyline(p1), S::Polyline(p2)) => polyline_with_polyline(p1, p2, false),

        (S::Polygon(p), S::Line(l)) => polyline_with_line(p, l, true),
        (S::Polygon(p), S::Ellipse(e)) => polyline_with_ellipse(p, e, true),
        (S::Polygon(p), S::Rect(r)) => polyline_with_polygon(p, &Polyline::from_rect(r), true),
        (S::Polygon(p1), S::Polyline(p2)) => polyline_with_polyline(p1, p2, true),
        (S::Polygon(p1), S::Polygon(p2)) => polyline_with_polygon(p1, p2, true),

        (S::Path(path, opt), S::Line(l)) => subpaths_any(path, opt, |polyline, closed| {
            polyline_with_line(polyline, l, closed)
        }),
        (S::Path(path, opt), S::Ellipse(e)) => subpaths_any(path, opt, |polyline, closed| {
            polyline_with_ellipse(polyline, e, closed)
        }),
        (S::Path(path, opt), S::Rect(r)) => {
            path_with_polyline(path, opt, &Polyline::from_rect(r), true)
        }
        (S::Path(path, opt), S::Polyline(p)) => path_with_polyline(path, opt, p, false),
        (S::Path(path, opt), S::Polygon(p)) => path_with_polyline(path, opt, p, true),
        (S::Path(p1, opt1), S::Path(p2, opt2)) => subpaths_any(p1, opt1, |polyline, closed| {
            path_with_polyline(p2, opt2, polyline, closed)
        }),

        (a, b) => exists(b, a),
    }
}

pub fn line_with_line(line1: &Line, line2: &Line) -> bool {
    let s1 = line1.end - line1.start;
    let s2 = line2.end - line2.start;
    let s3 = line1.start - line2.start;
    let p = s1.x * s2.y - s2.x * s1.y;
    let s = (s1.x * s3.y - s1.y * s3.x) / p;
    let t = (s2.x * s3.y - s2.y * s3.x) / p;
    (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
}

pub fn ellipse_with_line(ellipse: &Ellipse, line: &Line) -> bool {
    let rx2 = ellipse.a * ellipse.a;
    let ry2 = ellipse.b * ellipse.b;
    let x1 = line.start.x - ellipse.x;
    let y1 = line.start.y - ellipse.y;
    let dx = line.end.x - line.start.x;
    let dy = line.end.y - line.start.y;

    let a = dx * dx / rx2 + dy * dy / ry2;
    let b = 2.0 * x1 * dx / rx2 + 2.0 * y1 * dy / ry2;
    let c = x1 * x1 / rx2 + y1 * y1 / ry2 - 1.0;
    let d = b * b - 4.0 * a * c;

    let in_range = |t: f64| (0.0..=1.0).contains(&t);
    if d == 0.0 {
        in_range(-b / 2.0 / a)
    } else if d > 0.0 {
        let sqrt = d.sqrt();
        in_range((-b + sqrt) / 2.0 / a) || in_range((-b - sqrt) / 2.0 / a)
    } else {
        false
    }
}

/// Separation test on the characteristic polynomial of the two conics
pub fn ellipse_with_ellipse(e1: &Ellipse, e2: &Ellipse) -> bool {
    let conic = |e: &Ellipse| {
        let a2 = e.a * e.a;
        let b2 = e.b * e.b;
        // axis-aligned: A = b^2, B = a^2, C = 0
        let a = b2;
        let b = a2;
        let d = -a * e.x;
        let ee = -b * e.y;
        let f = a * e.x * e.x + b * e.y * e.y - a2 * b2;
        [[a, 0.0, d], [0.0, b, ee], [d, ee, f]]
    };
    let m1 = conic(e1);
    let m2 = conic(e2);

    let mix = |cols: [&[[f64; 3]; 3]; 3]| {
        let mut m = [[0.0; 3]; 3];
        for (row, out) in m.iter_mut().enumerate() {
            for (col, value) in out.iter_mut().enumerate() {
                *value = cols[col][row][col];
            }
        }
        det3(&m)
    };

    let l3 = det3(&m1);
    let l0 = det3(&m2);
    let l2 = (mix([&m2, &m1, &m1]) + mix([&m1, &m2, &m1]) + mix([&m1, &m1, &m2])) / 3.0;
    let l1 = (mix([&m1, &m2, &m2]) + mix([&m2, &m1, &m2]) + mix([&m2, &m2, &m1])) / 3.0;

    let delta1 = l3 * l1 - l2 * l2;
    let delta2 = l3 * l0 - l1 * l2;
    let delta3 = l2 * l0 - l1 * l1;
    let discriminant = 4.0 * delta1 * delta3 - delta2 * delta2;

    !(discriminant > 0.0 && (l1 > 0.0 || l2 > 0.0))
}

pub fn rect_with_line(rect: &Rect, line: &Line) -> bool {
    let (start, end) = (line.start, line.end);
    let (right, bottom) = (rect.x + rect.width, rect.y + rect.height);
    if (start.x > right && end.x > right)
        || (start.x < rect.x && end.x < rect.x)
        || (start.y > bottom && end.y > bottom)
        || (start.y < rect.y && end.y < rect.y)
    {
        return false;
    }
    if rect.contains_point(start) || rect.contains_point(end) {
        return true;
    }
    [
        rect.top_line(),
        rect.right_line(),
        rect.bottom_line(),
        rect.left_line(),
    ]
    .iter()
    .any(|edge| line_with_line(edge, line))
}

pub fn rect_with_ellipse(rect: &Rect, ellipse: &Ellipse) -> bool {
    if !rect_with_rect(rect, &Rect::from_ellipse(ellipse)) {
        return false;
    }
    polyline_with_ellipse(&Polyline::from_rect(rect), ellipse, true)
}

/// Overlap of the open rectangles; touching edges do not intersect
pub fn rect_with_rect(r1: &Rect, r2: &Rect) -> bool {
    r1.x < r2.x + r2.width
        && r1.x + r1.width > r2.x
        && r1.y < r2.y + r2.height
        && r1.y + r1.height > r2.y
}

fn closed_points(polyline: &Polyline) -> Vec<Point> {
    let mut closed = polyline.clone();
    closed.close();
    closed.points
}

fn polyline_with_line(polyline: &Polyline, line: &Line, interior: bool) -> bool {
    let points = if interior {
        if polyline.contains_point(line.start) {
            return true;
        }
        closed_points(polyline)
    } else {
        polyline.points.clone()
    };
    points
        .windows(2)
        .any(|pair| line_with_line(line, &Line::new(pair[0], pair[1])))
}

fn polyline_with_ellipse(polyline: &Polyline, ellipse: &Ellipse, interior: bool) -> bool {
    let Some(start) = polyline.start() else {
        return false;
    };
    if ellipse.contains_point(start) {
        return true;
    }
    let points = if interior {
        if polyline.contains_point(ellipse.center()) {
            return true;
        }
        closed_points(polyline)
    } else {
        polyline.points.clone()
    };
    points
        .windows(2)
        .any(|pair| ellipse_with_line(ellipse, &Line::new(pair[0], pair[1])))
}

/// Whether `other`'s outline meets `polyline` (or its interior)
fn polyline_with_polyline(polyline: &Polyline, other: &Polyline, interior: bool) -> bool {
    let outline = if interior {
        if other
            .start()
            .map_or(false, |start| polyline.contains_point(start))
        {
            return true;
        }
        Polyline::new(closed_points(polyline))
    } else {
        polyline.clone()
    };
    other
        .lines()
        .any(|segment| polyline_with_line(&outline, &segment, false))
}

fn polyline_with_polygon(polyline: &Polyline, polygon: &Polyline, interior: bool) -> bool {
    if polyline
        .start()
        .map_or(false, |start| polygon.contains_point(start))
    {
        return true;
    }
    polyline_with_polyline(polyline, &Polyline::new(closed_points(polygon)), interior)
}

fn path_with_polyline(path: &Path, opt: PathOptions<'_>, polyline: &Polyline, interior: bool) -> bool {
    subpaths_any(path, opt, |flattened, closed| {
        if closed {
            polyline_with_polygon(polyline, flattened, interior)
        } else {
            polyline_with_polyline(polyline, flattened, interior)
        }
    })
}

/// Run `f` over each flattened subpath with whether it ends in a closepath
fn subpaths_any(path: &Path, opt: PathOptions<'_>, f: impl Fn(&Polyline, bool) -> bool) -> bool {
    path.get_subpaths().iter().any(|subpath| {
        let closed = subpath
            .get_segment(-1)
            .map_or(false, |last| last.segment == Segment::Closepath);
        // cached subdivisions index the whole path, not the subpath
        subpath
            .to_polylines(PathOptions::new(opt.precision))
            .and_then(|polylines| polylines.into_iter().next())
            .map_or(false, |polyline| f(&polyline, closed))
    })
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * m[1][1] * m[2][2] - m[0][0] * m[1][2] * m[2][1] - m[0][1] * m[1][0] * m[2][2]
        + m[0][1] * m[1][2] * m[2][0]
        + m[0][2] * m[1][0] * m[2][1]
        - m[0][2] * m[1][1] * m[2][0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn test_line_with_line() {
        let a = line(0.0, 0.0, 10.0, 10.0);
        let b = line(0.0, 10.0, 10.0, 0.0);
        let c = line(20.0, 0.0, 30.0, 0.0);
        assert!(exists((&a).into(), (&b).into()));
        assert!(!exists((&a).into(), (&c).into()));
    }

    #[test]
    fn test_rect_with_rect_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(!exists((&a).into(), (&b).into()));
        assert!(exists((&a).into(), (&c).into()));
    }

    #[test]
    fn test_rect_with_line_inside() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inside = line(2.0, 2.0, 3.0, 3.0);
        let outside = line(20.0, 20.0, 30.0, 30.0);
        assert!(exists((&rect).into(), (&inside).into()));
        assert!(exists((&inside).into(), (&rect).into()));
        assert!(!exists((&rect).into(), (&outside).into()));
    }

    #[test]
    fn test_ellipse_with_line() {
        let ellipse = Ellipse::new(Point::ZERO, 10.0, 5.0);
        let crossing = line(-20.0, 0.0, 20.0, 0.0);
        let inside = line(-1.0, 0.0, 1.0, 0.0);
        let outside = line(-20.0, 10.0, 20.0, 10.0);
        assert!(exists((&ellipse).into(), (&crossing).into()));
        assert!(!exists((&ellipse).into(), (&inside).into()));
        assert!(!exists((&outside).into(), (&ellipse).into()));
    }

    #[test]
    fn test_ellipse_with_ellipse() {
        let a = Ellipse::new(Point::ZERO, 10.0, 5.0);
        let overlapping = Ellipse::new(Point::new(15.0, 0.0), 10.0, 5.0);
        let far = Ellipse::new(Point::new(100.0, 0.0), 10.0, 5.0);
        assert!(exists((&a).into(), (&overlapping).into()));
        assert!(!exists((&a).into(), (&far).into()));
    }

    #[test]
    fn test_polygon_interior() {
        let square = Polyline::from_rect(&Rect::new(0.0, 0.0, 10.0, 10.0));
        let inner = line(2.0, 2.0, 3.0, 3.0);
        assert!(exists(Shape::Polygon(&square), (&inner).into()));
        assert!(!exists(Shape::Polyline(&square), (&inner).into()));
    }

    #[test]
    fn test_path_with_shapes() {
        let closed = Path::parse("M 0 0 L 10 0 L 10 10 L 0 10 Z").unwrap();
        let open = Path::parse("M 0 0 L 10 0 L 10 10 L 0 10").unwrap();
        let inner = Rect::new(4.0, 4.0, 2.0, 2.0);
        assert!(exists((&closed).into(), (&inner).into()));
        assert!(!exists((&open).into(), (&inner).into()));
        assert!(exists((&inner).into(), (&closed).into()));

        let crossing = Path::parse("M -5 5 L 15 5").unwrap();
        assert!(exists((&open).into(), (&crossing).into()));
    }
}
