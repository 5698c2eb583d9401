//! Polylines and their convex hulls

use std::collections::HashSet;
use std::fmt;

use super::error::GeometryError;
use super::line::Line;
use super::point::Point;
use super::rect::Rect;

/// An ordered sequence of points joined by straight segments
///
/// May be empty or hold a single point, in which case it has zero length
/// and no tangent. Transforming methods mutate in place and return `&mut
/// Self` for chaining.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Parse an SVG `points` list such as `"10,10 20,20 30,10"`
    ///
    /// Coordinates may be separated by commas, whitespace, or both. An odd
    /// trailing coordinate is ignored.
    pub fn parse(data: &str) -> Result<Self, GeometryError> {
        let coords: Vec<&str> = data
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        let points = coords
            .chunks_exact(2)
            .map(|pair| {
                let x = parse_coordinate(pair[0])?;
                let y = parse_coordinate(pair[1])?;
                Ok(Point::new(x, y))
            })
            .collect::<Result<Vec<_>, GeometryError>>()?;

        Ok(Self::new(points))
    }

    /// The four corners of `rect`, clockwise from the top-left
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(vec![
            rect.top_left(),
            rect.top_right(),
            rect.bottom_right(),
            rect.bottom_left(),
        ])
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn bbox(&self) -> Option<Rect> {
        Rect::from_point_union(self.points.iter().copied())
    }

    /// Append the start point unless the polyline already ends there
    pub fn close(&mut self) -> &mut Self {
        if let (Some(start), Some(end)) = (self.start(), self.end()) {
            if start != end {
                self.points.push(start);
            }
        }
        self
    }

    pub fn closest_point(&self, p: Point) -> Option<Point> {
        self.point_at_length(self.closest_point_length(p))
    }

    /// Length along the polyline to the point closest to `p`
    pub fn closest_point_length(&self, p: Point) -> f64 {
        let mut cp_length = 0.0;
        let mut min_sqr_distance = f64::INFINITY;
        let mut length = 0.0;

        for line in self.lines() {
            let line_length = line.length();
            let cp_normalized_length = line.closest_point_normalized_length(p);
            let cp = line.point_at(cp_normalized_length);

            let sqr_distance = cp.squared_distance(p);
            if sqr_distance < min_sqr_distance {
                min_sqr_distance = sqr_distance;
                cp_length = length + cp_normalized_length * line_length;
            }
            length += line_length;
        }
        cp_length
    }

    pub fn closest_point_normalized_length(&self, p: Point) -> f64 {
        let cp_length = self.closest_point_length(p);
        if cp_length == 0.0 {
            return 0.0;
        }
        let length = self.length();
        if length == 0.0 {
            return 0.0;
        }
        cp_length / length
    }

    pub fn closest_point_tangent(&self, p: Point) -> Option<Line> {
        self.tangent_at_length(self.closest_point_length(p))
    }

    /// Even-odd containment, treating the polyline as closed
    ///
    /// Points on the outline count as inside. Casts a horizontal ray to the
    /// right of `p` and counts crossings; a segment touching the ray at one
    /// endpoint is counted once because the neighbouring segment cancels it.
    pub fn contains_point(&self, p: Point) -> bool {
        let n = self.points.len();
        if n == 0 {
            return false;
        }

        let (x, y) = (p.x, p.y);
        let mut start_index = n - 1;
        let mut intersections = 0usize;

        for end_index in 0..n {
            let start = self.points[start_index];
            let end = self.points[end_index];
            if p == start {
                return true;
            }

            let segment = Line::new(start, end);
            if segment.contains_point(p) {
                return true;
            }

            if (y <= start.y && y > end.y) || (y > start.y && y <= end.y) {
                let x_difference = (start.x - x).max(end.x - x);
                if x_difference >= 0.0 {
                    let ray = Line::new(p, Point::new(x + x_difference, y));
                    if segment.intersection_with_line(&ray).is_some() {
                        intersections += 1;
                    }
                }
            }

            start_index = end_index;
        }

        intersections % 2 == 1
    }

    /// Convex hull by Graham scan
    ///
    /// The hull lists only input points, without collinear ones, clockwise
    /// (the y-axis points down), starting at the hull point with the lowest
    /// original index.
    pub fn convex_hull(&self) -> Polyline {
        const THRESHOLD: f64 = 1e-10;

        let points = &self.points;
        let Some(mut start_point) = points.first().copied() else {
            return Polyline::default();
        };

        // lowest y, then highest x; the first of coincident candidates wins
        for p in &points[1..] {
            if p.y < start_point.y || (p.y == start_point.y && p.x > start_point.x) {
                start_point = *p;
            }
        }

        // the start point sorts last with angle 360
        let mut sorted: Vec<HullRecord> = points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let angle = start_point.theta(*point);
                HullRecord {
                    point: *point,
                    index,
                    angle: if angle == 0.0 { 360.0 } else { angle },
                }
            })
            .collect();

        // equal angles: higher original index first so the lower one is popped first
        sorted.sort_by(|a, b| {
            a.angle
                .partial_cmp(&b.angle)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.index.cmp(&a.index))
        });

        if sorted.len() > 2 {
            let start_record = sorted[sorted.len() - 1];
            sorted.insert(0, start_record);
        }

        let mut inside: HashSet<usize> = HashSet::new();
        let mut hull: Vec<HullRecord> = Vec::new();

        while let Some(current) = sorted.pop() {
            if inside.contains(&current.index) {
                continue;
            }

            loop {
                if hull.len() < 2 {
                    hull.push(current);
                    break;
                }

                let last = hull[hull.len() - 1];
                let second_last = hull[hull.len() - 2];
                let cross = second_last.point.cross(last.point, current.point);

                if cross < 0.0 {
                    // right turn
                    hull.push(current);
                    break;
                }

                if cross == 0.0 {
                    let angle_between = last.point.angle_between(second_last.point, current.point);
                    if (angle_between - 180.0).abs() < THRESHOLD
                        || last.point == current.point
                        || second_last.point == last.point
                    {
                        // straight through, or coincident
                        inside.insert(last.index);
                        hull.pop();
                    } else if (((angle_between + 1.0) % 360.0) - 1.0).abs() < THRESHOLD {
                        // doubling back: revisit the last hull point after the current one
                        hull.pop();
                        sorted.push(last);
                    } else {
                        inside.insert(last.index);
                        hull.pop();
                    }
                    continue;
                }

                // left turn
                inside.insert(last.index);
                hull.pop();
            }
        }

        // drop the duplicated start record
        if hull.len() > 2 {
            hull.pop();
        }

        let lowest = hull
            .iter()
            .enumerate()
            .min_by_key(|(_, record)| record.index)
            .map(|(position, _)| position)
            .unwrap_or(0);
        hull.rotate_left(lowest);

        Polyline::new(hull.into_iter().map(|record| record.point).collect())
    }

    /// Crossings of `line` with each segment, in segment order
    pub fn intersection_with_line(&self, line: &Line) -> Option<Vec<Point>> {
        let points: Vec<Point> = self
            .lines()
            .filter_map(|segment| line.intersection_with_line(&segment))
            .collect();
        (!points.is_empty()).then_some(points)
    }

    /// True if at least one segment has non-zero length
    pub fn is_differentiable(&self) -> bool {
        self.lines().any(|line| line.is_differentiable())
    }

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    pub fn point_at(&self, ratio: f64) -> Option<Point> {
        let n = self.points.len();
        if n <= 1 {
            return self.start();
        }
        if ratio <= 0.0 {
            return self.start();
        }
        if ratio >= 1.0 {
            return self.end();
        }
        self.point_at_length(self.length() * ratio)
    }

    /// Point at `length` from the start, or from the end when negative
    pub fn point_at_length(&self, length: f64) -> Option<Point> {
        let n = self.points.len();
        if n <= 1 {
            return self.start();
        }

        let from_start = length >= 0.0;
        let length = length.abs();
        let sign = if from_start { 1.0 } else { -1.0 };

        let mut l = 0.0;
        for i in 0..n - 1 {
            let index = if from_start { i } else { n - 2 - i };
            let a = self.points[index];
            let b = self.points[index + 1];
            let d = a.distance(b);

            if length <= l + d {
                return Some(Line::new(a, b).point_at_length(sign * (length - l)));
            }
            l += d;
        }

        if from_start {
            self.end()
        } else {
            self.start()
        }
    }

    /// Drop interior points within `threshold` of the chord of their neighbours
    ///
    /// With the default threshold of 0 only exactly collinear points go.
    pub fn simplify(&mut self, threshold: f64) -> &mut Self {
        let mut current = 0;
        while current + 2 < self.points.len() {
            let first = self.points[current];
            let middle = self.points[current + 1];
            let last = self.points[current + 2];

            let chord = Line::new(first, last);
            if chord.closest_point(middle).distance(middle) <= threshold {
                self.points.remove(current + 1);
            } else {
                current += 1;
            }
        }
        self
    }

    pub fn tangent_at(&self, ratio: f64) -> Option<Line> {
        if self.points.len() <= 1 {
            return None;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        self.tangent_at_length(self.length() * ratio)
    }

    /// Tangent at `length`, skipping zero-length segments
    ///
    /// Lengths past the end yield the tangent at the end of the last
    /// differentiable segment.
    pub fn tangent_at_length(&self, length: f64) -> Option<Line> {
        let n = self.points.len();
        if n <= 1 {
            return None;
        }

        let from_start = length >= 0.0;
        let length = length.abs();
        let sign = if from_start { 1.0 } else { -1.0 };

        let mut last_valid_line = None;
        let mut l = 0.0;
        for i in 0..n - 1 {
            let index = if from_start { i } else { n - 2 - i };
            let a = self.points[index];
            let b = self.points[index + 1];
            let line = Line::new(a, b);
            let d = a.distance(b);

            if line.is_differentiable() {
                if length <= l + d {
                    return line.tangent_at_length(sign * (length - l));
                }
                last_valid_line = Some(line);
            }
            l += d;
        }

        last_valid_line.and_then(|line| line.tangent_at(if from_start { 1.0 } else { 0.0 }))
    }

    pub fn round(&mut self, precision: u32) -> &mut Self {
        self.map_points(|p| p.round(precision))
    }

    pub fn scale(&mut self, sx: f64, sy: f64, origin: Point) -> &mut Self {
        self.map_points(|p| p.scale(sx, sy, origin))
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.map_points(|p| p.translate(tx, ty))
    }

    /// Space-separated `x,y` pairs, the inverse of [`Polyline::parse`]
    pub fn serialize(&self) -> String {
        self.points
            .iter()
            .map(Point::serialize)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Segments between consecutive points
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.points.windows(2).map(|w| Line::new(w[0], w[1]))
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) -> &mut Self {
        for p in &mut self.points {
            *p = f(*p);
        }
        self
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl fmt::Display for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.points.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[derive(Debug, Clone, Copy)]
struct HullRecord {
    point: Point,
    index: usize,
    angle: f64,
}

fn parse_coordinate(text: &str) -> Result<f64, GeometryError> {
    text.parse::<f64>()
        .map_err(|_| GeometryError::InvalidCoordinate(text.to_string()))
}
