//! Path segments
//!
//! A [`Segment`] is the owned description of one path command. Once it sits
//! in a [`Path`](super::Path) its start point comes from the previous
//! segment and a closepath ends where its subpath started; [`PathSegment`]
//! is the resolved view carrying those borrowed points.

use std::fmt;

use crate::geometry::curve::Curve;
use crate::geometry::error::GeometryError;
use crate::geometry::line::Line;
use crate::geometry::options::CurveOptions;
use crate::geometry::point::Point;
use crate::geometry::rect::Rect;

/// One command of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Starts a subpath; invisible and zero-length
    Moveto { end: Point },
    Lineto { end: Point },
    Curveto {
        control_point1: Point,
        control_point2: Point,
        end: Point,
    },
    /// Straight line back to the end of the subpath's moveto
    Closepath,
}

impl Segment {
    pub fn moveto(end: Point) -> Self {
        Segment::Moveto { end }
    }

    pub fn lineto(end: Point) -> Self {
        Segment::Lineto { end }
    }

    pub fn curveto(control_point1: Point, control_point2: Point, end: Point) -> Self {
        Segment::Curveto {
            control_point1,
            control_point2,
            end,
        }
    }

    pub fn closepath() -> Self {
        Segment::Closepath
    }

    /// Build segments from a command letter and its coordinates
    ///
    /// Chained coordinates produce several segments: `M` with more than one
    /// pair continues with linetos, `L` and `C` repeat per pair or sextuple.
    pub fn create(command: char, coords: &[f64]) -> Result<Vec<Segment>, GeometryError> {
        let group = match command {
            'M' | 'L' => 2,
            'C' => 6,
            'Z' | 'z' => {
                if !coords.is_empty() {
                    return Err(GeometryError::WrongArity {
                        command,
                        expected: 0,
                        found: coords.len(),
                    });
                }
                return Ok(vec![Segment::Closepath]);
            }
            other => return Err(GeometryError::UnknownSegmentType(other)),
        };

        if coords.is_empty() || coords.len() % group != 0 {
            return Err(GeometryError::WrongArity {
                command,
                expected: group,
                found: coords.len(),
            });
        }

        let segments = coords
            .chunks_exact(group)
            .enumerate()
            .map(|(i, c)| match (command, i) {
                ('M', 0) => Segment::moveto(Point::new(c[0], c[1])),
                ('M', _) | ('L', _) => Segment::lineto(Point::new(c[0], c[1])),
                _ => Segment::curveto(
                    Point::new(c[0], c[1]),
                    Point::new(c[2], c[3]),
                    Point::new(c[4], c[5]),
                ),
            })
            .collect();
        Ok(segments)
    }

    /// Command letter: `M`, `L`, `C` or `Z`
    pub fn letter(&self) -> char {
        match self {
            Segment::Moveto { .. } => 'M',
            Segment::Lineto { .. } => 'L',
            Segment::Curveto { .. } => 'C',
            Segment::Closepath => 'Z',
        }
    }

    pub fn is_subpath_start(&self) -> bool {
        matches!(self, Segment::Moveto { .. })
    }

    pub fn is_visible(&self) -> bool {
        !self.is_subpath_start()
    }

    /// The stored end point; a closepath stores none
    pub fn own_end(&self) -> Option<Point> {
        match self {
            Segment::Moveto { end } | Segment::Lineto { end } | Segment::Curveto { end, .. } => {
                Some(*end)
            }
            Segment::Closepath => None,
        }
    }

    pub fn serialize(&self) -> String {
        match self {
            Segment::Moveto { end } => format!("M {} {}", end.x, end.y),
            Segment::Lineto { end } => format!("L {} {}", end.x, end.y),
            Segment::Curveto {
                control_point1: c1,
                control_point2: c2,
                end,
            } => format!(
                "C {} {} {} {} {} {}",
                c1.x, c1.y, c2.x, c2.y, end.x, end.y
            ),
            Segment::Closepath => "Z".to_string(),
        }
    }

    /// Apply `f` to every stored point
    pub(crate) fn map_points(self, f: impl Fn(Point) -> Point) -> Segment {
        match self {
            Segment::Moveto { end } => Segment::Moveto { end: f(end) },
            Segment::Lineto { end } => Segment::Lineto { end: f(end) },
            Segment::Curveto {
                control_point1,
                control_point2,
                end,
            } => Segment::Curveto {
                control_point1: f(control_point1),
                control_point2: f(control_point2),
                end: f(end),
            },
            Segment::Closepath => Segment::Closepath,
        }
    }
}

/// A segment resolved against its path
///
/// `start` is `None` for movetos and for a first segment that is not a
/// moveto. Such a segment is treated as a point at its end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub segment: Segment,
    pub start: Option<Point>,
    pub end: Point,
}

impl PathSegment {
    pub fn letter(&self) -> char {
        self.segment.letter()
    }

    /// Start point, borrowed from the previous segment
    pub fn start(&self) -> Result<Point, GeometryError> {
        self.start.ok_or(GeometryError::NoStart)
    }

    pub fn is_subpath_start(&self) -> bool {
        self.segment.is_subpath_start()
    }

    pub fn is_visible(&self) -> bool {
        self.segment.is_visible()
    }

    pub fn is_differentiable(&self) -> bool {
        match self.segment {
            Segment::Moveto { .. } => false,
            Segment::Lineto { .. } | Segment::Closepath => {
                self.start.map_or(false, |start| start != self.end)
            }
            Segment::Curveto { .. } => self.start.is_some() && self.curve().is_differentiable(),
        }
    }

    /// The line a lineto or closepath draws
    pub fn line(&self) -> Line {
        Line::new(self.start.unwrap_or(self.end), self.end)
    }

    /// The curve a curveto draws; other segments give a straight curve
    pub fn curve(&self) -> Curve {
        let start = self.start.unwrap_or(self.end);
        match self.segment {
            Segment::Curveto {
                control_point1,
                control_point2,
                end,
            } => Curve::new(start, control_point1, control_point2, end),
            _ => Curve::new(start, start, self.end, self.end),
        }
    }

    pub fn bbox(&self) -> Option<Rect> {
        match self.segment {
            Segment::Moveto { .. } => None,
            Segment::Lineto { .. } | Segment::Closepath => Some(self.line().bbox()),
            Segment::Curveto { .. } => Some(self.curve().bbox()),
        }
    }

    pub fn closest_point(&self, p: Point, opt: CurveOptions<'_>) -> Point {
        match self.segment {
            Segment::Moveto { .. } => self.end,
            Segment::Lineto { .. } | Segment::Closepath => self.line().closest_point(p),
            Segment::Curveto { .. } => self.curve().closest_point(p, opt),
        }
    }

    pub fn closest_point_length(&self, p: Point, opt: CurveOptions<'_>) -> f64 {
        match self.segment {
            Segment::Moveto { .. } => 0.0,
            Segment::Lineto { .. } | Segment::Closepath => self.line().closest_point_length(p),
            Segment::Curveto { .. } => self.curve().closest_point_length(p, opt),
        }
    }

    pub fn closest_point_normalized_length(&self, p: Point, opt: CurveOptions<'_>) -> f64 {
        match self.segment {
            Segment::Moveto { .. } => 0.0,
            Segment::Lineto { .. } | Segment::Closepath => {
                self.line().closest_point_normalized_length(p)
            }
            Segment::Curveto { .. } => self.curve().closest_point_normalized_length(p, opt),
        }
    }

    /// Segment parameter of the closest point; 1 for a moveto
    pub fn closest_point_t(&self, p: Point, opt: CurveOptions<'_>) -> f64 {
        match self.segment {
            Segment::Moveto { .. } => 1.0,
            Segment::Lineto { .. } | Segment::Closepath => {
                self.line().closest_point_normalized_length(p)
            }
            Segment::Curveto { .. } => self.curve().closest_point_t(p, opt),
        }
    }

    pub fn closest_point_tangent(&self, p: Point, opt: CurveOptions<'_>) -> Option<Line> {
        match self.segment {
            Segment::Moveto { .. } => None,
            Segment::Lineto { .. } | Segment::Closepath => self.line().closest_point_tangent(p),
            Segment::Curveto { .. } => self.curve().closest_point_tangent(p, opt),
        }
    }

    /// Split at a length ratio into two unlinked segments
    pub fn divide_at(&self, ratio: f64, opt: CurveOptions<'_>) -> [Segment; 2] {
        match self.segment {
            Segment::Moveto { .. } => [self.segment, self.segment],
            Segment::Lineto { .. } | Segment::Closepath => {
                self.straight_parts(self.line().divide_at(ratio))
            }
            Segment::Curveto { .. } => curve_parts(self.curve().divide_at(ratio, opt)),
        }
    }

    pub fn divide_at_length(&self, length: f64, opt: CurveOptions<'_>) -> [Segment; 2] {
        match self.segment {
            Segment::Moveto { .. } => [self.segment, self.segment],
            Segment::Lineto { .. } | Segment::Closepath => {
                self.straight_parts(self.line().divide_at_length(length))
            }
            Segment::Curveto { .. } => curve_parts(self.curve().divide_at_length(length, opt)),
        }
    }

    pub fn divide_at_t(&self, t: f64) -> [Segment; 2] {
        match self.segment {
            Segment::Moveto { .. } => [self.segment, self.segment],
            Segment::Lineto { .. } | Segment::Closepath => {
                self.straight_parts(self.line().divide_at(t))
            }
            Segment::Curveto { .. } => curve_parts(self.curve().divide_at_t(t)),
        }
    }

    /// Flattening used for arc-length queries; empty for straight segments
    pub fn get_subdivisions(&self, precision: u32) -> Vec<Curve> {
        match self.segment {
            Segment::Curveto { .. } => self.curve().get_subdivisions(precision),
            _ => Vec::new(),
        }
    }

    pub fn length(&self, opt: CurveOptions<'_>) -> f64 {
        match self.segment {
            Segment::Moveto { .. } => 0.0,
            Segment::Lineto { .. } | Segment::Closepath => self.line().length(),
            Segment::Curveto { .. } => self.curve().length(opt),
        }
    }

    pub fn length_at_t(&self, t: f64, opt: CurveOptions<'_>) -> f64 {
        match self.segment {
            Segment::Moveto { .. } => 0.0,
            Segment::Lineto { .. } | Segment::Closepath => {
                if t <= 0.0 {
                    return 0.0;
                }
                let length = self.line().length();
                if t >= 1.0 {
                    length
                } else {
                    length * t
                }
            }
            Segment::Curveto { .. } => self.curve().length_at_t(t, opt),
        }
    }

    pub fn point_at(&self, ratio: f64, opt: CurveOptions<'_>) -> Point {
        match self.segment {
            Segment::Moveto { .. } => self.end,
            Segment::Lineto { .. } | Segment::Closepath => self.line().point_at(ratio),
            Segment::Curveto { .. } => self.curve().point_at(ratio, opt),
        }
    }

    pub fn point_at_length(&self, length: f64, opt: CurveOptions<'_>) -> Point {
        match self.segment {
            Segment::Moveto { .. } => self.end,
            Segment::Lineto { .. } | Segment::Closepath => self.line().point_at_length(length),
            Segment::Curveto { .. } => self.curve().point_at_length(length, opt),
        }
    }

    pub fn point_at_t(&self, t: f64) -> Point {
        match self.segment {
            Segment::Moveto { .. } => self.end,
            Segment::Lineto { .. } | Segment::Closepath => self.line().point_at(t),
            Segment::Curveto { .. } => self.curve().point_at_t(t),
        }
    }

    pub fn tangent_at(&self, ratio: f64, opt: CurveOptions<'_>) -> Option<Line> {
        match self.segment {
            Segment::Moveto { .. } => None,
            Segment::Lineto { .. } | Segment::Closepath => self.line().tangent_at(ratio),
            Segment::Curveto { .. } => self.curve().tangent_at(ratio, opt),
        }
    }

    pub fn tangent_at_length(&self, length: f64, opt: CurveOptions<'_>) -> Option<Line> {
        match self.segment {
            Segment::Moveto { .. } => None,
            Segment::Lineto { .. } | Segment::Closepath => self.line().tangent_at_length(length),
            Segment::Curveto { .. } => self.curve().tangent_at_length(length, opt),
        }
    }

    pub fn tangent_at_t(&self, t: f64) -> Option<Line> {
        match self.segment {
            Segment::Moveto { .. } => None,
            Segment::Lineto { .. } | Segment::Closepath => self.line().tangent_at(t),
            Segment::Curveto { .. } => self.curve().tangent_at_t(t),
        }
    }

    pub fn serialize(&self) -> String {
        self.segment.serialize()
    }

    /// Lineto halves; a closepath that was not actually cut stays a closepath
    fn straight_parts(&self, [first, second]: [Line; 2]) -> [Segment; 2] {
        let head = match self.segment {
            Segment::Closepath if !second.is_differentiable() => Segment::Closepath,
            _ => Segment::lineto(first.end),
        };
        [head, Segment::lineto(second.end)]
    }
}

fn curve_parts([first, second]: [Curve; 2]) -> [Segment; 2] {
    [
        Segment::curveto(first.control_point1, first.control_point2, first.end),
        Segment::curveto(second.control_point1, second.control_point2, second.end),
    ]
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start.unwrap_or(self.end);
        match self.segment {
            Segment::Moveto { end } => write!(f, "M {}", end),
            Segment::Lineto { .. } => write!(f, "L {} {}", start, self.end),
            Segment::Curveto {
                control_point1,
                control_point2,
                end,
            } => write!(f, "C {} {} {} {}", start, control_point1, control_point2, end),
            Segment::Closepath => write!(f, "Z {} {}", start, self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_chains_coordinates() {
        let segments = Segment::create('M', &[0.0, 0.0, 10.0, 0.0, 10.0, 10.0]).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::moveto(Point::new(0.0, 0.0)),
                Segment::lineto(Point::new(10.0, 0.0)),
                Segment::lineto(Point::new(10.0, 10.0)),
            ]
        );
        let curves = Segment::create('C', &[1.0; 12]).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(Segment::create('z', &[]).unwrap(), vec![Segment::Closepath]);
    }

    #[test]
    fn test_create_rejects_bad_arity() {
        assert!(matches!(
            Segment::create('L', &[1.0, 2.0, 3.0]),
            Err(GeometryError::WrongArity {
                command: 'L',
                expected: 2,
                found: 3
            })
        ));
        assert!(Segment::create('C', &[1.0, 2.0]).is_err());
        assert!(Segment::create('M', &[]).is_err());
        assert!(Segment::create('Z', &[1.0]).is_err());
        assert!(matches!(
            Segment::create('Q', &[1.0, 2.0]),
            Err(GeometryError::UnknownSegmentType('Q'))
        ));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(Segment::moveto(Point::new(1.0, 2.5)).serialize(), "M 1 2.5");
        assert_eq!(
            Segment::curveto(Point::new(1.0, 2.0), Point::new(3.0, 4.0), Point::new(5.0, 6.0))
                .serialize(),
            "C 1 2 3 4 5 6"
        );
        assert_eq!(Segment::Closepath.serialize(), "Z");
    }

    #[test]
    fn test_unlinked_lineto_is_not_differentiable() {
        let lone = PathSegment {
            segment: Segment::lineto(Point::new(5.0, 5.0)),
            start: None,
            end: Point::new(5.0, 5.0),
        };
        assert!(!lone.is_differentiable());
        assert!(matches!(lone.start(), Err(GeometryError::NoStart)));
        assert_eq!(lone.length(CurveOptions::default()), 0.0);
    }

    #[test]
    fn test_closepath_division_keeps_uncut_head() {
        let close = PathSegment {
            segment: Segment::Closepath,
            start: Some(Point::new(10.0, 0.0)),
            end: Point::new(0.0, 0.0),
        };
        let [head, tail] = close.divide_at_t(0.5);
        assert_eq!(head, Segment::lineto(Point::new(5.0, 0.0)));
        assert_eq!(tail, Segment::lineto(Point::new(0.0, 0.0)));

        let [head, _] = close.divide_at_t(1.0);
        assert_eq!(head, Segment::Closepath);
    }
}
