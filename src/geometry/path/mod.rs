//! Paths made of moveto, lineto, curveto and closepath segments
//!
//! Segments live in an arena and link to each other by index. Every segment
//! knows its previous and next neighbour and the moveto that starts its
//! subpath. A non-moveto segment starts where its previous segment ends; a
//! closepath ends where its subpath-start moveto ends. Structural edits
//! relink the chain and re-walk subpath starts from the first affected
//! segment up to the next moveto.

pub mod grammar;
pub mod lexer;
pub mod segment;

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

pub use segment::{PathSegment, Segment};

use super::curve::Curve;
use super::error::GeometryError;
use super::line::Line;
use super::options::PathOptions;
use super::point::Point;
use super::polyline::Polyline;
use super::rect::Rect;

/// Position on a path as a segment index plus a segment parameter
///
/// A single float cannot tell zero-length segments apart, so positions
/// carry the owning segment explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathT {
    pub segment_index: usize,
    pub value: f64,
}

impl PathT {
    pub fn new(segment_index: usize, value: f64) -> Self {
        Self {
            segment_index,
            value,
        }
    }
}

/// A straight or curved piece for building paths
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathPiece {
    Line(Line),
    Curve(Curve),
}

impl From<Line> for PathPiece {
    fn from(line: Line) -> Self {
        PathPiece::Line(line)
    }
}

impl From<Curve> for PathPiece {
    fn from(curve: Curve) -> Self {
        PathPiece::Curve(curve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SegmentId(usize);

#[derive(Debug, Clone)]
struct Node {
    segment: Segment,
    previous: Option<SegmentId>,
    next: Option<SegmentId>,
    subpath_start: Option<SegmentId>,
}

/// An ordered chain of segments forming one or more subpaths
///
/// A path is valid (serializable) when it is empty or starts with a
/// moveto. Invalid paths can still be built and queried.
#[derive(Debug, Clone, Default)]
pub struct Path {
    nodes: Vec<Node>,
    order: Vec<SegmentId>,
}


impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments<I: IntoIterator<Item = Segment>>(segments: I) -> Self {
        let mut path = Self::new();
        path.append_segments(segments);
        path
    }

    /// Chain lines and curves, inserting movetos wherever they do not link up
    pub fn from_pieces<I: IntoIterator<Item = PathPiece>>(pieces: I) -> Self {
        let mut path = Self::new();
        let mut previous_end: Option<Point> = None;

        for piece in pieces {
            let (start, segment) = match piece {
                PathPiece::Line(line) => (line.start, Segment::lineto(line.end)),
                PathPiece::Curve(curve) => (
                    curve.start,
                    Segment::curveto(curve.control_point1, curve.control_point2, curve.end),
                ),
            };
            if previous_end != Some(start) {
                path.append_segment(Segment::moveto(start));
            }
            path.append_segment(segment);
            previous_end = segment.own_end();
        }
        path
    }

    /// Parse `M`/`L`/`C`/`Z` path data
    pub fn parse(data: &str) -> Result<Self, GeometryError> {
        let segments = grammar::parse_segments(data)?;
        Ok(Self::from_segments(segments))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolved segments in document order
    pub fn segments(&self) -> impl Iterator<Item = PathSegment> + '_ {
        self.order.iter().map(|id| self.resolve(*id))
    }

    pub fn append_segment(&mut self, segment: Segment) {
        let previous = self.order.last().copied();
        let id = self.prepare_segment(segment, previous, None);
        self.order.push(id);
    }

    pub fn append_segments<I: IntoIterator<Item = Segment>>(&mut self, segments: I) {
        for segment in segments {
            self.append_segment(segment);
        }
    }

    /// Segment at `index`; negative indices count from the end
    pub fn get_segment(&self, index: isize) -> Result<PathSegment, GeometryError> {
        let position = self.checked_index(index)?;
        Ok(self.resolve(self.order[position]))
    }

    /// Insert before `index`
    ///
    /// `index == len` appends. Negative indices run from `-1` (append) to
    /// `-(len + 1)` (prepend).
    pub fn insert_segment(&mut self, index: isize, segment: Segment) -> Result<(), GeometryError> {
        self.insert_segments(index, [segment])
    }

    pub fn insert_segments<I: IntoIterator<Item = Segment>>(
        &mut self,
        index: isize,
        segments: I,
    ) -> Result<(), GeometryError> {
        let len = self.order.len();
        let position = if index < 0 {
            len as isize + index + 1
        } else {
            index
        };
        if position < 0 || position > len as isize {
            return Err(GeometryError::out_of_range(index, len));
        }
        let position = position as usize;

        let (mut previous, next) = if len == 0 {
            (None, None)
        } else if position >= 1 {
            let previous = self.order[position - 1];
            (Some(previous), self.node(previous).next)
        } else {
            (None, Some(self.order[0]))
        };

        for (offset, segment) in segments.into_iter().enumerate() {
            let id = self.prepare_segment(segment, previous, next);
            self.order.insert(position + offset, id);
            previous = Some(id);
        }
        Ok(())
    }

    /// Remove and return the segment at `index`
    pub fn remove_segment(&mut self, index: isize) -> Result<Segment, GeometryError> {
        let position = self.checked_index(index)?;
        let id = self.order.remove(position);
        let Node {
            segment,
            previous,
            next,
            ..
        } = self.node(id).clone();

        if let Some(previous) = previous {
            self.node_mut(previous).next = next;
        }
        if let Some(next) = next {
            self.node_mut(next).previous = previous;
        }
        if segment.is_subpath_start() {
            if let Some(next) = next {
                self.update_subpath_start_segment(next);
            }
        }
        self.release(id);
        Ok(segment)
    }

    pub fn replace_segment(&mut self, index: isize, segment: Segment) -> Result<(), GeometryError> {
        self.replace_segments(index, [segment])
    }

    /// Replace the segment at `index` with any number of segments
    pub fn replace_segments<I: IntoIterator<Item = Segment>>(
        &mut self,
        index: isize,
        segments: I,
    ) -> Result<(), GeometryError> {
        let position = self.checked_index(index)?;
        let replaced = self.order.remove(position);
        let Node {
            segment: replaced_segment,
            mut previous,
            next,
            ..
        } = self.node(replaced).clone();

        let mut update_subpath_start = replaced_segment.is_subpath_start();
        let mut inserted = 0;
        for segment in segments {
            let id = self.prepare_segment(segment, previous, next);
            self.order.insert(position + inserted, id);
            previous = Some(id);
            inserted += 1;
            if segment.is_subpath_start() {
                update_subpath_start = false;
            }
        }

        if inserted == 0 {
            if let Some(previous) = previous {
                self.node_mut(previous).next = next;
            }
            if let Some(next) = next {
                self.node_mut(next).previous = previous;
            }
        }

        if update_subpath_start {
            if let Some(next) = next {
                self.update_subpath_start_segment(next);
            }
        }
        self.release(replaced);
        Ok(())
    }

    /// Bounding box of the visible segments
    ///
    /// A path of movetos only yields a zero-size box at its last point.
    pub fn bbox(&self) -> Option<Rect> {
        let last = self.segments().last()?;
        let visible = Rect::from_rect_union(
            self.segments()
                .filter(PathSegment::is_visible)
                .filter_map(|segment| segment.bbox()),
        );
        Some(visible.unwrap_or_else(|| Rect::at(last.end)))
    }

    pub fn closest_point(&self, p: Point, opt: PathOptions<'_>) -> Option<Point> {
        let t = self.closest_point_t(p, opt)?;
        self.point_at_t(t)
    }

    pub fn closest_point_length(&self, p: Point, opt: PathOptions<'_>) -> f64 {
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);
        match self.closest_point_t(p, local) {
            Some(t) => self.length_at_t(t, local),
            None => 0.0,
        }
    }

    pub fn closest_point_normalized_length(&self, p: Point, opt: PathOptions<'_>) -> f64 {
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let cp_length = self.closest_point_length(p, local);
        if cp_length == 0.0 {
            return 0.0;
        }
        let length = self.length(local);
        if length == 0.0 {
            return 0.0;
        }
        cp_length / length
    }

    /// Closest position over the visible segments
    ///
    /// Without visible segments this is the end of the last segment.
    pub fn closest_point_t(&self, p: Point, opt: PathOptions<'_>) -> Option<PathT> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let mut closest = None;
        let mut min_squared_distance = f64::INFINITY;
        for (i, segment) in self.segments().enumerate() {
            if !segment.is_visible() {
                continue;
            }
            let t = segment.closest_point_t(p, local.for_segment(i));
            let squared_distance = segment.point_at_t(t).squared_distance(p);
            if squared_distance < min_squared_distance {
                closest = Some(PathT::new(i, t));
                min_squared_distance = squared_distance;
            }
        }

        Some(closest.unwrap_or(PathT::new(n - 1, 1.0)))
    }

    pub fn closest_point_tangent(&self, p: Point, opt: PathOptions<'_>) -> Option<Line> {
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let mut tangent = None;
        let mut min_squared_distance = f64::INFINITY;
        for (i, segment) in self.segments().enumerate() {
            if !segment.is_differentiable() {
                continue;
            }
            let t = segment.closest_point_t(p, local.for_segment(i));
            let squared_distance = segment.point_at_t(t).squared_distance(p);
            if squared_distance < min_squared_distance {
                tangent = segment.tangent_at_t(t);
                min_squared_distance = squared_distance;
            }
        }
        tangent
    }

    /// Even-odd containment over the flattened subpaths, each implicitly closed
    pub fn contains_point(&self, p: Point, opt: PathOptions<'_>) -> bool {
        let Some(polylines) = self.to_polylines(opt) else {
            return false;
        };
        let inside = polylines
            .iter()
            .filter(|polyline| polyline.contains_point(p))
            .count();
        inside % 2 == 1
    }

    /// Split at a length ratio; see [`Path::divide_at_length`]
    pub fn divide_at(&self, ratio: f64, opt: PathOptions<'_>) -> Option<[Path; 2]> {
        if self.is_empty() {
            return None;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);
        let length = self.length(local) * ratio;
        self.divide_at_length(length, local)
    }

    /// Split into two paths at `length` (negative: from the end)
    ///
    /// The second path starts with a moveto so both halves stay valid.
    /// Point-like halves of the divided segment are dropped, and closepaths
    /// after the cut whose subpath start moved become linetos. `None` for
    /// paths without a differentiable segment.
    pub fn divide_at_length(&self, length: f64, opt: PathOptions<'_>) -> Option<[Path; 2]> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        let (from_start, length) = split_length(length);
        let sign = if from_start { 1.0 } else { -1.0 };

        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let mut l = 0.0;
        let mut divided: Option<(usize, [Segment; 2])> = None;
        let mut last_valid: Option<(usize, PathSegment)> = None;
        for i in 0..n {
            let index = if from_start { i } else { n - 1 - i };
            let segment = self.resolve(self.order[index]);
            let seg_opt = local.for_segment(index);
            let d = segment.length(seg_opt);

            if segment.is_differentiable() {
                last_valid = Some((index, segment));
                if length <= l + d {
                    divided = Some((index, segment.divide_at_length(sign * (length - l), seg_opt)));
                    break;
                }
            }
            l += d;
        }

        let (last_valid_index, last_valid_segment) = last_valid?;
        let (divided_index, parts) = divided.unwrap_or_else(|| {
            let t = if from_start { 1.0 } else { 0.0 };
            (last_valid_index, last_valid_segment.divide_at_t(t))
        });

        let mut copy = self.clone();
        copy.replace_segments(divided_index as isize, parts).ok()?;

        let division_start = divided_index;
        let mut division_mid = divided_index + 1;
        let mut division_end = divided_index + 2;

        if !copy.resolve_at(division_start).is_differentiable() {
            copy.remove_segment(division_start as isize).ok()?;
            division_mid -= 1;
            division_end -= 1;
        }

        let mid = copy.resolve_at(division_mid);
        let moveto_end = mid.start.unwrap_or(mid.end);
        copy.insert_segment(division_mid as isize, Segment::moveto(moveto_end))
            .ok()?;
        division_end += 1;

        if !copy.resolve_at(division_end - 1).is_differentiable() {
            copy.remove_segment((division_end - 1) as isize).ok()?;
            division_end -= 1;
        }

        let index_shift = division_end - division_start - 1;
        for i in division_end..copy.len() {
            let original = self.resolve_at(i - index_shift);
            let current = copy.resolve_at(i);
            if current.segment == Segment::Closepath && original.end != current.end {
                copy.replace_segment(i as isize, Segment::lineto(original.end))
                    .ok()?;
            }
        }

        let segments: Vec<Segment> = copy.raw_segments().collect();
        trace!(divided_index, division_mid, "divided path");
        Some([
            Path::from_segments(segments[..division_mid].iter().copied()),
            Path::from_segments(segments[division_mid..].iter().copied()),
        ])
    }

    /// Same segment types with the same resolved geometry
    pub fn equals(&self, other: &Path) -> bool {
        self.len() == other.len() && self.segments().zip(other.segments()).all(|(a, b)| a == b)
    }

    /// Flattening of every segment, empty for straight segments
    pub fn get_segment_subdivisions(&self, precision: u32) -> Vec<Vec<Curve>> {
        self.segments()
            .map(|segment| segment.get_subdivisions(precision))
            .collect()
    }

    /// One path per subpath, validating first
    pub fn get_subpaths(&self) -> Vec<Path> {
        let mut validated = self.clone();
        validated.validate();

        let mut subpaths: Vec<Path> = Vec::new();
        for segment in validated.raw_segments() {
            match subpaths.last_mut() {
                Some(last) if !segment.is_subpath_start() => last.append_segment(segment),
                _ => subpaths.push(Path::from_segments([segment])),
            }
        }
        subpaths
    }

    /// Crossings of `line` with the flattened subpaths
    pub fn intersection_with_line(&self, line: &Line, opt: PathOptions<'_>) -> Option<Vec<Point>> {
        let polylines = self.to_polylines(opt)?;
        let points: Vec<Point> = polylines
            .iter()
            .filter_map(|polyline| polyline.intersection_with_line(line))
            .flatten()
            .collect();
        (!points.is_empty()).then_some(points)
    }

    pub fn is_differentiable(&self) -> bool {
        self.segments().any(|segment| segment.is_differentiable())
    }

    /// Empty, or starting with a moveto
    pub fn is_valid(&self) -> bool {
        self.order
            .first()
            .map_or(true, |id| self.node(*id).segment.is_subpath_start())
    }

    pub fn length(&self, opt: PathOptions<'_>) -> f64 {
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);
        self.segments()
            .enumerate()
            .map(|(i, segment)| segment.length(local.for_segment(i)))
            .sum()
    }

    /// Length from the start of the path to `t`
    pub fn length_at_t(&self, t: PathT, opt: PathOptions<'_>) -> f64 {
        let n = self.len();
        if n == 0 {
            return 0.0;
        }
        let (index, value) = if t.segment_index >= n {
            (n - 1, 1.0)
        } else {
            (t.segment_index, t.value.clamp(0.0, 1.0))
        };

        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let before: f64 = self
            .segments()
            .take(index)
            .enumerate()
            .map(|(i, segment)| segment.length(local.for_segment(i)))
            .sum();
        before + self.resolve_at(index).length_at_t(value, local.for_segment(index))
    }

    pub fn point_at(&self, ratio: f64, opt: PathOptions<'_>) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        if ratio <= 0.0 {
            return self.start();
        }
        if ratio >= 1.0 {
            return self.end();
        }
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);
        let length = self.length(local) * ratio;
        self.point_at_length(length, local)
    }

    /// Point at `length` along the visible segments (negative: from the end)
    pub fn point_at_length(&self, length: f64, opt: PathOptions<'_>) -> Option<Point> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        if length == 0.0 {
            return self.start();
        }
        let (from_start, length) = split_length(length);
        let sign = if from_start { 1.0 } else { -1.0 };

        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let mut last_visible = None;
        let mut l = 0.0;
        for i in 0..n {
            let index = if from_start { i } else { n - 1 - i };
            let segment = self.resolve_at(index);
            let seg_opt = local.for_segment(index);
            let d = segment.length(seg_opt);

            if segment.is_visible() {
                if length <= l + d {
                    return Some(segment.point_at_length(sign * (length - l), seg_opt));
                }
                last_visible = Some(segment);
            }
            l += d;
        }

        Some(match last_visible {
            Some(segment) if from_start => segment.end,
            Some(segment) => segment.start.unwrap_or(segment.end),
            None => self.resolve_at(n - 1).end,
        })
    }

    pub fn point_at_t(&self, t: PathT) -> Option<Point> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        if t.segment_index >= n {
            return Some(self.resolve_at(n - 1).point_at_t(1.0));
        }
        Some(
            self.resolve_at(t.segment_index)
                .point_at_t(t.value.clamp(0.0, 1.0)),
        )
    }

    pub fn segment_at(&self, ratio: f64, opt: PathOptions<'_>) -> Option<PathSegment> {
        let index = self.segment_index_at(ratio, opt)?;
        Some(self.resolve_at(index))
    }

    pub fn segment_at_length(&self, length: f64, opt: PathOptions<'_>) -> Option<PathSegment> {
        let index = self.segment_index_at_length(length, opt)?;
        Some(self.resolve_at(index))
    }

    pub fn segment_index_at(&self, ratio: f64, opt: PathOptions<'_>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);
        let length = self.length(local) * ratio;
        self.segment_index_at_length(length, local)
    }

    /// Index of the visible segment containing `length`
    ///
    /// Lengths past the end give the last visible segment.
    pub fn segment_index_at_length(&self, length: f64, opt: PathOptions<'_>) -> Option<usize> {
        let n = self.len();
        let (from_start, length) = split_length(length);

        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let mut last_visible = None;
        let mut l = 0.0;
        for i in 0..n {
            let index = if from_start { i } else { n - 1 - i };
            let segment = self.resolve_at(index);
            let d = segment.length(local.for_segment(index));

            if segment.is_visible() {
                if length <= l + d {
                    return Some(index);
                }
                last_visible = Some(index);
            }
            l += d;
        }
        last_visible
    }

    /// Path data for this path; fails unless the path is valid
    pub fn serialize(&self) -> Result<String, GeometryError> {
        if !self.is_valid() {
            return Err(GeometryError::InvalidPath);
        }
        Ok(self
            .raw_segments()
            .map(|segment| segment.serialize())
            .collect::<Vec<_>>()
            .join(" "))
    }

    pub fn tangent_at(&self, ratio: f64, opt: PathOptions<'_>) -> Option<Line> {
        if self.is_empty() {
            return None;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);
        let length = self.length(local) * ratio;
        self.tangent_at_length(length, local)
    }

    /// Tangent at `length` over the differentiable segments
    pub fn tangent_at_length(&self, length: f64, opt: PathOptions<'_>) -> Option<Line> {
        let n = self.len();
        let (from_start, length) = split_length(length);
        let sign = if from_start { 1.0 } else { -1.0 };

        let subdivisions = self.subdivisions_for(&opt);
        let local = PathOptions::new(opt.precision).with_segment_subdivisions(&subdivisions);

        let mut last_valid = None;
        let mut l = 0.0;
        for i in 0..n {
            let index = if from_start { i } else { n - 1 - i };
            let segment = self.resolve_at(index);
            let seg_opt = local.for_segment(index);
            let d = segment.length(seg_opt);

            if segment.is_differentiable() {
                if length <= l + d {
                    return segment.tangent_at_length(sign * (length - l), seg_opt);
                }
                last_valid = Some(segment);
            }
            l += d;
        }

        last_valid.and_then(|segment| segment.tangent_at_t(if from_start { 1.0 } else { 0.0 }))
    }

    pub fn tangent_at_t(&self, t: PathT) -> Option<Line> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        if t.segment_index >= n {
            return self.resolve_at(n - 1).tangent_at_t(1.0);
        }
        self.resolve_at(t.segment_index)
            .tangent_at_t(t.value.clamp(0.0, 1.0))
    }

    /// Flattened point runs, one per run of visible segments
    pub fn to_points(&self, opt: PathOptions<'_>) -> Option<Vec<Vec<Point>>> {
        if self.is_empty() {
            return None;
        }
        let subdivisions = self.subdivisions_for(&opt);

        let mut points = Vec::new();
        let mut partial: Vec<Point> = Vec::new();
        let mut previous_end = None;
        for (i, segment) in self.segments().enumerate() {
            if segment.is_visible() {
                match subdivisions.get(i).filter(|subs| !subs.is_empty()) {
                    Some(subs) => partial.extend(subs.iter().map(|curve| curve.start)),
                    None => partial.push(segment.start.unwrap_or(segment.end)),
                }
            } else if !partial.is_empty() {
                if let Some(end) = previous_end {
                    partial.push(end);
                }
                points.push(std::mem::take(&mut partial));
            }
            previous_end = Some(segment.end);
        }

        if !partial.is_empty() {
            if let Some(end) = self.end() {
                partial.push(end);
            }
            points.push(partial);
        }
        Some(points)
    }

    pub fn to_polylines(&self, opt: PathOptions<'_>) -> Option<Vec<Polyline>> {
        Some(
            self.to_points(opt)?
                .into_iter()
                .map(Polyline::new)
                .collect(),
        )
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

    /// Prepend `M 0 0` to an invalid path
    pub fn validate(&mut self) -> &mut Self {
        if !self.is_valid() {
            // index 0 is always in range
            let _ = self.insert_segment(0, Segment::moveto(Point::ZERO));
        }
        self
    }

    /// Start of the first visible segment
    pub fn start(&self) -> Option<Point> {
        let last = self.segments().last()?;
        Some(
            self.segments()
                .find(PathSegment::is_visible)
                .map(|segment| segment.start.unwrap_or(segment.end))
                .unwrap_or(last.end),
        )
    }

    /// End of the last visible segment
    pub fn end(&self) -> Option<Point> {
        let last = self.segments().last()?;
        Some(
            self.segments()
                .filter(PathSegment::is_visible)
                .last()
                .map_or(last.end, |segment| segment.end),
        )
    }

    fn node(&self, id: SegmentId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: SegmentId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn raw_segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.order.iter().map(|id| self.node(*id).segment)
    }

    fn resolve_at(&self, position: usize) -> PathSegment {
        self.resolve(self.order[position])
    }

    fn resolve(&self, id: SegmentId) -> PathSegment {
        let node = self.node(id);
        let start = match node.segment {
            Segment::Moveto { .. } => None,
            _ => node.previous.map(|previous| self.end_of(previous)),
        };
        PathSegment {
            segment: node.segment,
            start,
            end: self.end_of(id),
        }
    }

    /// End point of a segment, following closepaths to their subpath start
    ///
    /// A closepath without a subpath start ends where it starts.
    fn end_of(&self, mut id: SegmentId) -> Point {
        loop {
            let node = self.node(id);
            if let Some(end) = node.segment.own_end() {
                return end;
            }
            match (node.subpath_start, node.previous) {
                (Some(start), _) if start != id => id = start,
                (_, Some(previous)) => id = previous,
                _ => return Point::ZERO,
            }
        }
    }

    fn checked_index(&self, index: isize) -> Result<usize, GeometryError> {
        let len = self.order.len();
        if len == 0 {
            return Err(GeometryError::EmptyPath);
        }
        let position = if index < 0 {
            len as isize + index
        } else {
            index
        };
        if position < 0 || position >= len as isize {
            return Err(GeometryError::out_of_range(index, len));
        }
        Ok(position as usize)
    }

    /// Link a new node between `previous` and `next`
    fn prepare_segment(
        &mut self,
        segment: Segment,
        previous: Option<SegmentId>,
        next: Option<SegmentId>,
    ) -> SegmentId {
        let id = SegmentId(self.nodes.len());
        self.nodes.push(Node {
            segment,
            previous,
            next,
            subpath_start: None,
        });
        if let Some(previous) = previous {
            self.node_mut(previous).next = Some(id);
        }
        if let Some(next) = next {
            self.node_mut(next).previous = Some(id);
        }

        let update_from = if segment.is_subpath_start() {
            self.node_mut(id).subpath_start = Some(id);
            next
        } else {
            Some(id)
        };
        if let Some(from) = update_from {
            self.update_subpath_start_segment(from);
        }
        id
    }

    /// Drop an unlinked node, moving the last node into its slot
    ///
    /// Nothing may still refer to `id`.
    fn release(&mut self, id: SegmentId) {
        let last = SegmentId(self.nodes.len() - 1);
        self.nodes.swap_remove(id.0);
        if id == last {
            return;
        }
        let remap = |link: &mut Option<SegmentId>| {
            if *link == Some(last) {
                *link = Some(id);
            }
        };
        for node in &mut self.nodes {
            remap(&mut node.previous);
            remap(&mut node.next);
            remap(&mut node.subpath_start);
        }
        for entry in &mut self.order {
            if *entry == last {
                *entry = id;
            }
        }
    }

    /// Copy the previous segment's subpath start forward until the next moveto
    fn update_subpath_start_segment(&mut self, from: SegmentId) {
        let mut previous = self.node(from).previous;
        let mut current = Some(from);
        let mut relinked = 0usize;

        while let Some(id) = current {
            if self.node(id).segment.is_subpath_start() {
                break;
            }
            let subpath_start = previous.and_then(|p| self.node(p).subpath_start);
            let node = self.node_mut(id);
            node.subpath_start = subpath_start;
            previous = Some(id);
            current = node.next;
            relinked += 1;
        }
        trace!(relinked, "updated subpath starts");
    }

    fn subdivisions_for<'a>(&self, opt: &PathOptions<'a>) -> Cow<'a, [Vec<Curve>]> {
        match opt.segment_subdivisions {
            Some(subdivisions) => Cow::Borrowed(subdivisions),
            None => Cow::Owned(self.get_segment_subdivisions(opt.precision)),
        }
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) -> &mut Self {
        for position in 0..self.order.len() {
            let id = self.order[position];
            let node = self.node_mut(id);
            node.segment = node.segment.map_points(&f);
        }
        self
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<Line> for Path {
    fn from(line: Line) -> Self {
        Path::from_pieces([PathPiece::Line(line)])
    }
}

impl From<Curve> for Path {
    fn from(curve: Curve) -> Self {
        Path::from_pieces([PathPiece::Curve(curve)])
    }
}

impl From<&Polyline> for Path {
    fn from(polyline: &Polyline) -> Self {
        Path::from_segments(polyline.points.iter().enumerate().map(|(i, p)| {
            if i == 0 {
                Segment::moveto(*p)
            } else {
                Segment::lineto(*p)
            }
        }))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments().map(|segment| segment.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Direction and magnitude of a signed length; negative means from the end
fn split_length(length: f64) -> (bool, f64) {
    if length < 0.0 {
        (false, -length)
    } else {
        (true, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::options::PathOptions;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn square() -> Path {
        Path::parse("M0,0 L10,0 L10,10 Z").unwrap()
    }

    fn subpath_start_ends(path: &Path) -> Vec<Option<Point>> {
        path.order
            .iter()
            .map(|id| path.node(*id).subpath_start.map(|s| path.end_of(s)))
            .collect()
    }

    #[test]
    fn test_closepath_ends_at_subpath_start() {
        let path = square();
        let close = path.get_segment(-1).unwrap();
        assert_eq!(close.start, Some(Point::new(10.0, 10.0)));
        assert_eq!(close.end, Point::ZERO);
        assert!(close.is_differentiable());
    }

    #[test]
    fn test_bbox() {
        assert_eq!(square().bbox(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(Path::new().bbox(), None);
        let only_moves = Path::parse("M 5 5 M 7 8").unwrap();
        assert_eq!(only_moves.bbox(), Some(Rect::new(7.0, 8.0, 0.0, 0.0)));
    }

    #[test]
    fn test_get_segment_errors() {
        assert!(matches!(Path::new().get_segment(0), Err(GeometryError::EmptyPath)));
        let path = square();
        assert!(path.get_segment(-4).is_ok());
        assert!(matches!(
            path.get_segment(-5),
            Err(GeometryError::IndexOutOfRange { index: -5, len: 4 })
        ));
        assert!(path.get_segment(4).is_err());
    }

    #[test]
    fn test_insert_moveto_relinks_closepath() {
        let mut path = square();
        path.insert_segment(2, Segment::moveto(Point::new(20.0, 20.0)))
            .unwrap();
        // M0,0 L10,0 M20,20 L10,10 Z
        let close = path.get_segment(-1).unwrap();
        assert_eq!(close.end, Point::new(20.0, 20.0));
        assert_eq!(
            subpath_start_ends(&path),
            vec![
                Some(Point::ZERO),
                Some(Point::ZERO),
                Some(Point::new(20.0, 20.0)),
                Some(Point::new(20.0, 20.0)),
                Some(Point::new(20.0, 20.0)),
            ]
        );

        path.remove_segment(2).unwrap();
        assert_eq!(path.get_segment(-1).unwrap().end, Point::ZERO);
    }

    #[test]
    fn test_replace_moveto() {
        let mut path = square();
        path.replace_segment(0, Segment::moveto(Point::new(0.0, 10.0)))
            .unwrap();
        assert_eq!(path.get_segment(-1).unwrap().end, Point::new(0.0, 10.0));
        assert_eq!(path.get_segment(1).unwrap().start, Some(Point::new(0.0, 10.0)));

        path.replace_segment(0, Segment::lineto(Point::new(1.0, 1.0)))
            .unwrap();
        assert!(!path.is_valid());
        assert_eq!(subpath_start_ends(&path), vec![None; 4]);
    }

    #[test]
    fn test_repeated_edits_reuse_node_slots() {
        let mut path = Path::parse("M 0 0 L 10 0").unwrap();
        for i in 0..1000 {
            path.replace_segment(1, Segment::lineto(Point::new(i as f64, 5.0)))
                .unwrap();
        }
        assert_eq!(path.nodes.len(), 2);
        assert_eq!(path.serialize().unwrap(), "M 0 0 L 999 5");

        for _ in 0..100 {
            path.insert_segment(1, Segment::moveto(Point::new(3.0, 3.0)))
                .unwrap();
            path.remove_segment(1).unwrap();
        }
        assert_eq!(path.nodes.len(), 2);
        assert_eq!(path.get_segment(1).unwrap().start, Some(Point::ZERO));
    }

    #[test]
    fn test_removal_keeps_links_after_slot_reuse() {
        let mut path = square();
        // the closepath node moves into slot 0
        path.remove_segment(0).unwrap();
        assert_eq!(path.nodes.len(), path.len());
        path.insert_segment(0, Segment::moveto(Point::new(5.0, 5.0)))
            .unwrap();
        assert_eq!(path.serialize().unwrap(), "M 5 5 L 10 0 L 10 10 Z");
        assert_eq!(path.get_segment(-1).unwrap().end, Point::new(5.0, 5.0));

        path.replace_segments(1, Vec::<Segment>::new()).unwrap();
        assert_eq!(path.nodes.len(), 3);
        assert_eq!(path.serialize().unwrap(), "M 5 5 L 10 10 Z");
        assert_eq!(path.get_segment(1).unwrap().start, Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_insert_negative_indices() {
        let mut path = square();
        path.insert_segment(-1, Segment::moveto(Point::new(1.0, 1.0)))
            .unwrap();
        assert_eq!(path.get_segment(-1).unwrap().letter(), 'M');
        path.insert_segment(-6, Segment::moveto(Point::new(2.0, 2.0)))
            .unwrap();
        assert_eq!(path.get_segment(0).unwrap().end, Point::new(2.0, 2.0));
        assert!(path.insert_segment(-8, Segment::Closepath).is_err());
        assert!(path.insert_segment(7, Segment::Closepath).is_err());
        assert!(path.insert_segment(6, Segment::Closepath).is_ok());
    }

    #[test]
    fn test_serialize_and_validate() {
        assert_eq!(square().serialize().unwrap(), "M 0 0 L 10 0 L 10 10 Z");
        let mut invalid = Path::parse("L 10 10").unwrap();
        assert!(matches!(invalid.serialize(), Err(GeometryError::InvalidPath)));
        invalid.validate();
        assert_eq!(invalid.serialize().unwrap(), "M 0 0 L 10 10");
    }

    #[test]
    fn test_length_and_point_at() {
        let path = square();
        let opt = PathOptions::default();
        let diagonal = 200f64.sqrt();
        assert!(approx_eq(path.length(opt), 20.0 + diagonal));
        assert_eq!(path.point_at_length(15.0, opt), Some(Point::new(10.0, 5.0)));
        assert_eq!(path.point_at(0.0, opt), Some(Point::ZERO));
        assert_eq!(path.point_at(1.0, opt), Some(Point::ZERO));
        assert_eq!(path.point_at_length(-5.0, opt).map(|p| p.round(6)), {
            let p = Line::new(Point::new(10.0, 10.0), Point::ZERO).point_at_length(-5.0);
            Some(p.round(6))
        });
    }

    #[test]
    fn test_segment_index_at_length() {
        let path = square();
        let opt = PathOptions::default();
        assert_eq!(path.segment_index_at_length(0.0, opt), Some(1));
        assert_eq!(path.segment_index_at_length(15.0, opt), Some(2));
        assert_eq!(path.segment_index_at_length(1000.0, opt), Some(3));
        assert_eq!(path.segment_at(0.0, opt).map(|s| s.letter()), Some('L'));
    }

    #[test]
    fn test_closest_point() {
        let path = square();
        let opt = PathOptions::default();
        assert_eq!(path.closest_point(Point::new(5.0, -5.0), opt), Some(Point::new(5.0, 0.0)));
        let t = path.closest_point_t(Point::new(15.0, 5.0), opt).unwrap();
        assert_eq!(t, PathT::new(2, 0.5));
        assert!(approx_eq(path.closest_point_length(Point::new(15.0, 5.0), opt), 15.0));
    }

    #[test]
    fn test_closest_point_without_visible_segments() {
        let only_moves = Path::parse("M 5 5 M 7 8").unwrap();
        let opt = PathOptions::default();
        let t = only_moves.closest_point_t(Point::new(100.0, 100.0), opt);
        assert_eq!(t, Some(PathT::new(1, 1.0)));
        assert_eq!(only_moves.closest_point(Point::ZERO, opt), Some(Point::new(7.0, 8.0)));
        assert_eq!(Path::new().closest_point_t(Point::ZERO, opt), None);
    }

    #[test]
    fn test_tangent_at_length() {
        let path = square();
        let tangent = path.tangent_at_length(15.0, PathOptions::default()).unwrap();
        assert_eq!(tangent.start, Point::new(10.0, 5.0));
        assert_eq!(tangent.end, Point::new(10.0, 15.0));
    }

    #[test]
    fn test_contains_point() {
        let path = square();
        let opt = PathOptions::default();
        assert!(path.contains_point(Point::new(8.0, 2.0), opt));
        assert!(!path.contains_point(Point::new(2.0, 8.0), opt));
    }

    #[test]
    fn test_to_points_splits_subpaths() {
        let path = Path::parse("M0,0 L10,0 M20,0 L30,0").unwrap();
        let points = path.to_points(PathOptions::default()).unwrap();
        assert_eq!(
            points,
            vec![
                vec![Point::ZERO, Point::new(10.0, 0.0)],
                vec![Point::new(20.0, 0.0), Point::new(30.0, 0.0)],
            ]
        );
    }

    #[test]
    fn test_get_subpaths() {
        let path = Path::parse("L10,0 M20,0 L30,0 Z").unwrap();
        let subpaths = path.get_subpaths();
        assert_eq!(subpaths.len(), 2);
        assert_eq!(subpaths[0].serialize().unwrap(), "M 0 0 L 10 0");
        assert_eq!(subpaths[1].serialize().unwrap(), "M 20 0 L 30 0 Z");
        assert_eq!(subpaths[1].get_segment(-1).unwrap().end, Point::new(20.0, 0.0));
    }

    #[test]
    fn test_divide_at_length() {
        let path = Path::parse("M0,0 L10,0 L10,10").unwrap();
        let [first, second] = path.divide_at_length(5.0, PathOptions::default()).unwrap();
        assert_eq!(first.serialize().unwrap(), "M 0 0 L 5 0");
        assert_eq!(second.serialize().unwrap(), "M 5 0 L 10 0 L 10 10");

        let [first, second] = path.divide_at_length(10.0, PathOptions::default()).unwrap();
        assert_eq!(first.serialize().unwrap(), "M 0 0 L 10 0");
        assert_eq!(second.serialize().unwrap(), "M 10 0 L 10 10");
    }

    #[test]
    fn test_divide_converts_orphaned_closepath() {
        let path = square();
        let [first, second] = path.divide_at_length(5.0, PathOptions::default()).unwrap();
        assert_eq!(first.serialize().unwrap(), "M 0 0 L 5 0");
        assert_eq!(second.serialize().unwrap(), "M 5 0 L 10 0 L 10 10 L 0 0");
    }

    #[test]
    fn test_divide_without_differentiable_segment() {
        let path = Path::parse("M0,0 L0,0").unwrap();
        assert!(path.divide_at(0.5, PathOptions::default()).is_none());
    }

    #[test]
    fn test_from_pieces_inserts_movetos() {
        let path = Path::from_pieces([
            PathPiece::Line(Line::new(Point::ZERO, Point::new(10.0, 0.0))),
            PathPiece::Line(Line::new(Point::new(10.0, 0.0), Point::new(10.0, 10.0))),
            PathPiece::Line(Line::new(Point::new(20.0, 0.0), Point::new(30.0, 0.0))),
        ]);
        assert_eq!(
            path.serialize().unwrap(),
            "M 0 0 L 10 0 L 10 10 M 20 0 L 30 0"
        );
    }

    #[test]
    fn test_transforms() {
        let mut path = square();
        path.translate(5.0, 5.0).scale(2.0, 2.0, Point::ZERO);
        assert_eq!(path.serialize().unwrap(), "M 10 10 L 30 10 L 30 30 Z");
        assert_eq!(path.get_segment(-1).unwrap().end, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_equals() {
        assert_eq!(square(), Path::parse("M 0 0 L 10 0 L 10 10 z").unwrap());
        assert_ne!(square(), Path::parse("M 0 0 L 10 0 L 10 10").unwrap());
    }

    #[test]
    fn test_start_and_end() {
        let path = Path::parse("M 1 1 L 5 5 M 9 9").unwrap();
        assert_eq!(path.start(), Some(Point::new(1.0, 1.0)));
        assert_eq!(path.end(), Some(Point::new(5.0, 5.0)));
        assert_eq!(Path::new().start(), None);
    }
}
