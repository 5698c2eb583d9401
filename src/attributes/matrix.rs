//! 2D affine matrices and SVG transform lists
//!
//! A matrix `[a c e; b d f; 0 0 1]` maps `(x, y)` to
//! `(a·x + c·y + e, b·x + d·y + f)`. Angles are in degrees and grow
//! clockwise, so `rotate(90)` turns the positive x-axis onto the positive
//! y-axis.
//!
//! Rectangles are transformed with loose bounds: the four corners are mapped
//! and the axis-aligned box around them is returned.

use logos::Logos;

use crate::geometry::{to_rad, Point, Rect};

use super::error::AttributeError;
use super::value::format_number;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Clockwise rotation by `angle` degrees about the origin
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = to_rad(angle).sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn skew_x(angle: f64) -> Self {
        Self::new(1.0, 0.0, to_rad(angle).tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(angle: f64) -> Self {
        Self::new(1.0, to_rad(angle).tan(), 0.0, 1.0, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// `self × other`: `other` is applied first
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Inverse, or `None` for a singular matrix
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Matrix {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Bounding box of the transformed corners of `rect`
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            rect.top_left(),
            rect.top_right(),
            rect.bottom_left(),
            rect.bottom_right(),
        ];
        Rect::from_point_union(corners.into_iter().map(|p| self.transform_point(p)))
            .unwrap_or(*rect)
    }

    /// Per-axis scale: the lengths of the transformed unit vectors
    pub fn scale_factors(&self) -> (f64, f64) {
        (
            (self.a * self.a + self.b * self.b).sqrt(),
            (self.c * self.c + self.d * self.d).sqrt(),
        )
    }

    /// Parse an SVG transform list such as `translate(10 20) rotate(45)`
    ///
    /// The empty string is the identity.
    pub fn parse(input: &str) -> Result<Matrix, AttributeError> {
        let mut tokens = TransformToken::lexer(input).spanned();
        let mut matrix = Matrix::identity();

        while let Some((token, span)) = tokens.next() {
            let name = match token {
                Ok(TransformToken::Function(name)) => name,
                _ => {
                    return Err(AttributeError::invalid_transform(
                        input,
                        format!("expected a transform function at {}", span.start),
                    ))
                }
            };
            if !matches!(tokens.next(), Some((Ok(TransformToken::LParen), _))) {
                return Err(AttributeError::invalid_transform(
                    input,
                    format!("expected '(' after {}", name),
                ));
            }

            let mut args = Vec::new();
            loop {
                match tokens.next() {
                    Some((Ok(TransformToken::Number(n)), _)) => args.push(n),
                    Some((Ok(TransformToken::RParen), _)) => break,
                    _ => {
                        return Err(AttributeError::invalid_transform(
                            input,
                            format!("unterminated {}(...)", name),
                        ))
                    }
                }
            }

            let step = function_matrix(&name, &args).ok_or_else(|| {
                AttributeError::invalid_transform(
                    input,
                    format!("{} does not take {} arguments", name, args.len()),
                )
            })?;
            matrix = matrix.multiply(&step);
        }

        Ok(matrix)
    }

    /// `matrix(a,b,c,d,e,f)`
    pub fn to_transform_string(&self) -> String {
        let values: Vec<String> = [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .map(|v| format_number(*v))
            .collect();
        format!("matrix({})", values.join(","))
    }
}

fn function_matrix(name: &str, args: &[f64]) -> Option<Matrix> {
    let m = match (name, args) {
        ("matrix", [a, b, c, d, e, f]) => Matrix::new(*a, *b, *c, *d, *e, *f),
        ("translate", [tx]) => Matrix::translation(*tx, 0.0),
        ("translate", [tx, ty]) => Matrix::translation(*tx, *ty),
        ("scale", [s]) => Matrix::scaling(*s, *s),
        ("scale", [sx, sy]) => Matrix::scaling(*sx, *sy),
        ("rotate", [angle]) => Matrix::rotation(*angle),
        ("rotate", [angle, cx, cy]) => Matrix::translation(*cx, *cy)
            .multiply(&Matrix::rotation(*angle))
            .multiply(&Matrix::translation(-cx, -cy)),
        ("skewX", [angle]) => Matrix::skew_x(*angle),
        ("skewY", [angle]) => Matrix::skew_y(*angle),
        _ => return None,
    };
    Some(m)
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f,]+")]
enum TransformToken {
    #[regex(r"[A-Za-z]+", |lex| lex.slice().to_string())]
    Function(String),

    #[regex(r"[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}
