//! Registry of special attribute definitions and the built-in set
//!
//! Relative values follow one rule throughout: a percentage or a number in
//! `[0, 1]` is a fraction of the reference dimension, anything else is an
//! absolute distance. Sizes clamp at zero; positions do not.

use std::collections::HashMap;

use crate::geometry::{Path, Point, Polyline, Rect};

use super::definition::{AttributeDefinition, SetResult};
use super::node::NodeRef;
use super::value::{attr_map, AttrMap, AttrValue};

/// String attributes whose SVG name differs from the camel-case one
const NAME_ALIASES: &[(&str, &str)] = &[
    ("xlinkShow", "xlink:show"),
    ("xlinkRole", "xlink:role"),
    ("xlinkType", "xlink:type"),
    ("xlinkArcrole", "xlink:arcrole"),
    ("xlinkTitle", "xlink:title"),
    ("xlinkActuate", "xlink:actuate"),
    ("xlinkHref", "xlink:href"),
    ("xmlSpace", "xml:space"),
    ("xmlBase", "xml:base"),
    ("xmlLang", "xml:lang"),
    ("preserveAspectRatio", "preserveAspectRatio"),
    ("requiredExtension", "requiredExtension"),
    ("requiredFeatures", "requiredFeatures"),
    ("systemLanguage", "systemLanguage"),
    ("externalResourcesRequired", "externalResourcesRequired"),
];

/// Alternative spellings of built-in definitions
const DEFINITION_ALIASES: &[(&str, &str)] = &[
    ("refX2", "refX"),
    ("refY2", "refY"),
    ("ref-x", "refX"),
    ("ref-y", "refY"),
    ("ref-dx", "refDx"),
    ("ref-dy", "refDy"),
    ("refWidth2", "refWidth"),
    ("refHeight2", "refHeight"),
    ("ref-width", "refWidth"),
    ("ref-height", "refHeight"),
    ("refR", "refRInscribed"),
    ("refD", "refDResetOffset"),
    ("refPoints", "refPointsResetOffset"),
    ("x-alignment", "xAlignment"),
    ("y-alignment", "yAlignment"),
];

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, p: Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    fn point(self, value: f64) -> Point {
        match self {
            Axis::X => Point::new(value, 0.0),
            Axis::Y => Point::new(0.0, value),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Dimension {
    Width,
    Height,
    Diagonal,
}

impl Dimension {
    fn of(self, rect: &Rect) -> f64 {
        match self {
            Dimension::Width => rect.width,
            Dimension::Height => rect.height,
            Dimension::Diagonal => rect.width.hypot(rect.height),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ShapeKind {
    Path,
    Points,
}

/// Named attribute definitions consulted by the engine
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    definitions: HashMap<String, AttributeDefinition>,
}

impl AttributeRegistry {
    /// An empty registry: every attribute passes through as a plain one
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in definitions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for (name, target) in NAME_ALIASES {
            registry.register(*name, AttributeDefinition::alias(*target));
        }

        registry
            .register("ref", AttributeDefinition::new())
            .register("refX", position(Axis::X, Dimension::Width, false))
            .register("refY", position(Axis::Y, Dimension::Height, false))
            .register("refDx", position(Axis::X, Dimension::Width, true))
            .register("refDy", position(Axis::Y, Dimension::Height, true))
            .register("refWidth", size("width", Dimension::Width))
            .register("refHeight", size("height", Dimension::Height))
            .register("refRx", size("rx", Dimension::Width))
            .register("refRy", size("ry", Dimension::Height))
            .register("refCx", size("cx", Dimension::Width))
            .register("refCy", size("cy", Dimension::Height))
            .register("refRInscribed", inscribed_radius())
            .register("refRCircumscribed", size("r", Dimension::Diagonal))
            .register("xAlignment", alignment(Axis::X, Dimension::Width, "right"))
            .register("yAlignment", alignment(Axis::Y, Dimension::Height, "bottom"))
            .register("resetOffset", reset_offset())
            .register("refDResetOffset", fit_shape(ShapeKind::Path, true))
            .register("refDKeepOffset", fit_shape(ShapeKind::Path, false))
            .register("refPointsResetOffset", fit_shape(ShapeKind::Points, true))
            .register("refPointsKeepOffset", fit_shape(ShapeKind::Points, false))
            .register("port", port())
            .register("fill", paint_server())
            .register("stroke", paint_server())
            .register("filter", paint_server());

        for (alias, name) in DEFINITION_ALIASES {
            if let Some(def) = registry.get(name).cloned() {
                registry.register(*alias, def);
            }
        }

        registry
    }

    /// Add or replace a definition
    pub fn register(&mut self, name: impl Into<String>, def: AttributeDefinition) -> &mut Self {
        self.definitions.insert(name.into(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Fraction of the value, or `None` when it is not numeric
fn relative_number(value: &AttrValue) -> Option<(f64, bool)> {
    let percentage = value.is_percentage();
    let mut n = value.parse_float()?;
    if percentage {
        n /= 100.0;
    }
    n.is_finite().then_some((n, percentage))
}

fn relative_size(value: &AttrValue, reference: f64) -> Option<f64> {
    let (n, percentage) = relative_number(value)?;
    if percentage || (0.0..=1.0).contains(&n) {
        Some(n * reference)
    } else {
        Some((n + reference).max(0.0))
    }
}

fn size(attr: &'static str, dimension: Dimension) -> AttributeDefinition {
    AttributeDefinition::new().with_set(move |value, ref_bbox, _, _| {
        let attrs = match relative_size(value, dimension.of(&ref_bbox)) {
            Some(v) => attr_map([(attr, v)]),
            None => AttrMap::new(),
        };
        Ok(SetResult::Attrs(attrs))
    })
}

/// `r` against the shorter side of the reference box
fn inscribed_radius() -> AttributeDefinition {
    AttributeDefinition::new().with_set(|value, ref_bbox, _, _| {
        let dimension = if ref_bbox.height > ref_bbox.width {
            Dimension::Width
        } else {
            Dimension::Height
        };
        let attrs = match relative_size(value, dimension.of(&ref_bbox)) {
            Some(v) => attr_map([("r", v)]),
            None => AttrMap::new(),
        };
        Ok(SetResult::Attrs(attrs))
    })
}

/// Translation from the reference origin (or corner, for `refDx`/`refDy`)
fn position(axis: Axis, dimension: Dimension, from_corner: bool) -> AttributeDefinition {
    AttributeDefinition::new().with_position(move |value, ref_bbox, _, _| {
        let delta = match relative_number(value) {
            Some((n, percentage)) => {
                let anchor = if from_corner {
                    ref_bbox.corner()
                } else {
                    ref_bbox.origin()
                };
                if percentage || (n > 0.0 && n < 1.0) {
                    axis.of(anchor) + dimension.of(&ref_bbox) * n
                } else {
                    axis.of(anchor) + n
                }
            }
            None => 0.0,
        };
        Some(axis.point(delta))
    })
}

/// Shift the node so `value` names the point of its box that sits at the position
fn alignment(axis: Axis, dimension: Dimension, far_edge: &'static str) -> AttributeDefinition {
    AttributeDefinition::new().with_offset(move |value, node_bbox, _, _| {
        let extent = dimension.of(&node_bbox);
        let delta = match value.as_str() {
            Some("middle") => extent / 2.0,
            Some(s) if s == far_edge => extent,
            _ => match value.as_finite() {
                Some(n) if n > -1.0 && n < 1.0 => -extent * n,
                Some(n) => -n,
                None if value.is_percentage() => {
                    extent * value.parse_float().unwrap_or(0.0) / 100.0
                }
                None => 0.0,
            },
        };
        Some(axis.point(-(axis.of(node_bbox.origin()) + delta)))
    })
}

fn reset_offset() -> AttributeDefinition {
    AttributeDefinition::new().with_offset(|value, node_bbox, _, _| {
        if value.is_truthy() {
            Some(Point::new(-node_bbox.x, -node_bbox.y))
        } else {
            Some(Point::new(0.0, 0.0))
        }
    })
}

/// Scale factors that stretch `shape` over `reference`, plus the scale origin
fn fit_factors(shape: Rect, reference: Rect) -> (f64, f64, Point) {
    let shape_origin = shape.origin();
    let ref_origin = reference.origin();
    let moved = Rect::new(ref_origin.x, ref_origin.y, shape.width, shape.height);
    let fit = reference.max_rect_scale_to_fit(&moved, Some(ref_origin));
    let sx = if moved.width == 0.0 || reference.width == 0.0 {
        1.0
    } else {
        fit.sx
    };
    let sy = if moved.height == 0.0 || reference.height == 0.0 {
        1.0
    } else {
        fit.sy
    };
    (sx, sy, shape_origin)
}

/// Scale shape data to fit the reference box
///
/// Path data goes through [`Path::parse`], so only `M`, `L`, `C` and `Z`
/// are accepted. Any other command fails with a geometry error.
fn fit_shape(kind: ShapeKind, reset: bool) -> AttributeDefinition {
    AttributeDefinition::new().with_set(move |value, ref_bbox, _, _| {
        let data = value.to_string();
        let attrs = match kind {
            ShapeKind::Path => {
                let mut path = Path::parse(&data)?;
                if let Some(bbox) = path.bbox() {
                    let (sx, sy, origin) = fit_factors(bbox, ref_bbox);
                    path.scale(sx, sy, origin);
                    if reset {
                        path.translate(-origin.x, -origin.y);
                    }
                }
                let d = if path.is_empty() {
                    String::new()
                } else {
                    path.serialize()?
                };
                attr_map([("d", d)])
            }
            ShapeKind::Points => {
                let mut polyline = Polyline::parse(&data)?;
                if let Some(bbox) = polyline.bbox() {
                    let (sx, sy, origin) = fit_factors(bbox, ref_bbox);
                    polyline.scale(sx, sy, origin);
                    if reset {
                        polyline.translate(-origin.x, -origin.y);
                    }
                }
                attr_map([("points", polyline.serialize())])
            }
        };
        Ok(SetResult::Attrs(attrs))
    })
}

/// A port object collapses to its id
fn port() -> AttributeDefinition {
    AttributeDefinition::new().with_set(|value, _, _, _| {
        let result = match value {
            AttrValue::Object(port) => match port.get("id") {
                Some(id) => SetResult::Value(id.clone()),
                None => SetResult::Attrs(port.clone()),
            },
            other => SetResult::Value(other.clone()),
        };
        Ok(result)
    })
}

/// Gradient or filter objects become `url(#id)` references
fn paint_server() -> AttributeDefinition {
    AttributeDefinition::new()
        .with_qualify(|value, _: NodeRef<'_>, _| value.is_object())
        .with_set(|value, _, _, _| {
            let id = value.as_object().and_then(|def| def.get("id"));
            Ok(match id {
                Some(id) => SetResult::Value(AttrValue::String(format!("url(#{})", id))),
                None => SetResult::Unset,
            })
        })
}
