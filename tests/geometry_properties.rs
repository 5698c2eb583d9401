//! Property checks for the geometry kernel over deterministic samples

use diagram_kernel::geometry::{
    Curve, CurveOptions, Line, Path, PathOptions, Point, Polyline, Rect,
};
use pretty_assertions::assert_eq;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_point(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

/// Small linear congruential generator so samples are reproducible
struct Samples(u64);

impl Samples {
    fn coord(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % 100) as f64
    }

    fn point(&mut self) -> Point {
        Point::new(self.coord(), self.coord())
    }
}

fn arch() -> Curve {
    Curve::new(
        Point::new(0.0, 0.0),
        Point::new(0.0, 50.0),
        Point::new(100.0, 50.0),
        Point::new(100.0, 0.0),
    )
}

#[test]
fn test_rotate_round_trip() {
    let mut samples = Samples(7);
    for angle in [15.0, 90.0, 137.5, 270.0, 359.0, 720.0] {
        let origin = samples.point();
        let p = samples.point();
        let back = p.rotate(origin, angle).rotate(origin, -angle);
        assert!(approx_point(back, p), "{} rotated by {} came back as {}", p, angle, back);
    }
}

#[test]
fn test_rotate_keeps_distance_to_origin() {
    let origin = Point::new(50.0, 50.0);
    let p = Point::new(80.0, 10.0);
    for angle in [0.0, 45.0, 180.0, 300.0] {
        let rotated = p.rotate(origin, angle);
        assert!(approx_eq(rotated.distance(origin), p.distance(origin)));
    }
}

#[test]
fn test_line_closest_point_is_on_segment() {
    let line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    assert!(approx_eq(line.closest_point_normalized_length(Point::new(4.0, 7.0)), 0.4));
    assert_eq!(line.closest_point(Point::new(4.0, 7.0)), Point::new(4.0, 0.0));
    assert_eq!(line.closest_point_normalized_length(Point::new(-5.0, 3.0)), 0.0);
    assert_eq!(line.closest_point_normalized_length(Point::new(20.0, 1.0)), 1.0);

    let mut samples = Samples(11);
    let slanted = Line::new(Point::new(10.0, 20.0), Point::new(70.0, 90.0));
    for _ in 0..20 {
        let p = samples.point();
        let t = slanted.closest_point_normalized_length(p);
        assert!((0.0..=1.0).contains(&t));
        let closest = slanted.closest_point(p);
        assert!(closest.distance(p) <= slanted.start.distance(p) + EPSILON);
        assert!(closest.distance(p) <= slanted.end.distance(p) + EPSILON);
    }
}

#[test]
fn test_curve_divide_shares_endpoints() {
    let curve = arch();
    for t in [0.1, 0.3, 0.5, 0.77] {
        let [first, second] = curve.divide(t);
        let at = curve.point_at_t(t);
        assert_eq!(first.start, curve.start);
        assert_eq!(second.end, curve.end);
        assert!(approx_point(first.end, at));
        assert!(approx_point(second.start, at));
    }
}

#[test]
fn test_curve_divide_clamps_parameter() {
    let curve = arch();
    let [first, second] = curve.divide(-1.0);
    assert_eq!(first.start, curve.start);
    assert_eq!(first.end, curve.start);
    assert_eq!(second, curve);
    let [first, _] = curve.divide(2.0);
    assert_eq!(first, curve);
}

#[test]
fn test_curve_length_meets_precision_bound() {
    // arc length from adaptive quadrature
    let exact = 139.4657;
    let curve = arch();
    for precision in 1..=4 {
        let length = curve.length(CurveOptions::new(precision));
        let bound = 10f64.powi(-(precision as i32)) * exact;
        assert!(
            (length - exact).abs() < bound,
            "precision {}: length {} outside {}",
            precision,
            length,
            bound
        );
    }
}

#[test]
fn test_path_parse_serialize_round_trip() {
    for data in [
        "M 0 0 L 10 0 L 10 10 Z",
        "M 0 0 L 10 0 C 10 5 5 10 0 10 Z",
        "M 1.5 -2 L 3 4 M 10 10 L 20 20",
    ] {
        let path = Path::parse(data).unwrap();
        assert_eq!(path.serialize().unwrap(), data);
        let reparsed = Path::parse(&path.serialize().unwrap()).unwrap();
        assert!(reparsed.equals(&path));
    }
}

#[test]
fn test_path_point_at_ratio_bounds() {
    let path = Path::parse("M 0 0 L 100 0 L 100 100").unwrap();
    let opt = PathOptions::default();
    assert_eq!(path.length(opt), 200.0);
    assert_eq!(path.point_at(0.5, opt), Some(Point::new(100.0, 0.0)));
    assert_eq!(path.point_at(-1.0, opt), path.start());
    assert_eq!(path.point_at(2.0, opt), Some(Point::new(100.0, 100.0)));
    assert_eq!(Path::new().point_at(0.5, opt), None);
}

#[test]
fn test_square_path_bbox() {
    let path = Path::parse("M0,0 L10,0 L10,10 Z").unwrap();
    assert_eq!(path.bbox(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
}

#[test]
fn test_rect_intersection() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(a.intersect(&Rect::new(5.0, 5.0, 10.0, 10.0)), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
    assert_eq!(a.intersect(&Rect::new(20.0, 20.0, 5.0, 5.0)), None);
}

#[test]
fn test_convex_hull_encloses_every_point() {
    let mut samples = Samples(42);
    let points: Vec<Point> = (0..40).map(|_| samples.point()).collect();
    let hull = Polyline::new(points.clone()).convex_hull();

    assert!(hull.points.len() >= 3);
    for p in &hull.points {
        assert!(points.contains(p), "hull point {} is not an input point", p);
    }

    // clockwise with the y-axis down: every point lies on the inner side of every edge
    let n = hull.points.len();
    for i in 0..n {
        let a = hull.points[i];
        let b = hull.points[(i + 1) % n];
        for c in &points {
            assert!(a.cross(b, *c) <= EPSILON, "{} lies outside edge {} -> {}", c, a, b);
        }
    }
}

#[test]
fn test_convex_hull_is_idempotent() {
    let mut samples = Samples(3);
    let points: Vec<Point> = (0..25).map(|_| samples.point()).collect();
    let hull = Polyline::new(points).convex_hull();
    assert_eq!(hull.convex_hull().serialize(), hull.serialize());
}
