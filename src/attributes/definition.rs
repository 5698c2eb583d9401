//! Special attribute definitions
//!
//! A definition turns a declarative attribute such as `refWidth: "50%"` into
//! concrete element attributes. It may carry up to four hooks:
//!
//! - `qualify` decides whether the definition applies to a given value;
//!   when it does not, the attribute passes through unchanged.
//! - `set` either renames the attribute or computes new attributes from the
//!   reference bounding box.
//! - `position` returns a translation computed from the reference box.
//! - `offset` returns a translation computed from the node's own box.

use std::fmt;
use std::sync::Arc;

use crate::geometry::{Point, Rect};

use super::error::AttributeError;
use super::node::NodeRef;
use super::value::{AttrMap, AttrValue};

/// Outcome of a computing `set` hook
#[derive(Debug, Clone, PartialEq)]
pub enum SetResult {
    /// Attributes merged into the node's plain attributes
    Attrs(AttrMap),
    /// Stored under the special attribute's own name
    Value(AttrValue),
    /// Nothing to write
    Unset,
}

pub type QualifyFn = Arc<dyn Fn(&AttrValue, NodeRef<'_>, &AttrMap) -> bool + Send + Sync>;

pub type SetFn = Arc<
    dyn Fn(&AttrValue, Rect, NodeRef<'_>, &AttrMap) -> Result<SetResult, AttributeError>
        + Send
        + Sync,
>;

/// Position and offset hooks; `None` contributes no translation
pub type TranslateFn = Arc<dyn Fn(&AttrValue, Rect, NodeRef<'_>, &AttrMap) -> Option<Point> + Send + Sync>;

#[derive(Clone)]
pub enum Setter {
    /// Write the value under another attribute name
    Alias(String),
    Compute(SetFn),
}

#[derive(Clone, Default)]
pub struct AttributeDefinition {
    pub qualify: Option<QualifyFn>,
    pub set: Option<Setter>,
    pub position: Option<TranslateFn>,
    pub offset: Option<TranslateFn>,
}

impl AttributeDefinition {
    /// A definition with no hooks; the attribute is consumed and never written
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(target: impl Into<String>) -> Self {
        Self {
            set: Some(Setter::Alias(target.into())),
            ..Self::default()
        }
    }

    pub fn with_qualify<F>(mut self, f: F) -> Self
    where
        F: Fn(&AttrValue, NodeRef<'_>, &AttrMap) -> bool + Send + Sync + 'static,
    {
        self.qualify = Some(Arc::new(f));
        self
    }

    pub fn with_set<F>(mut self, f: F) -> Self
    where
        F: Fn(&AttrValue, Rect, NodeRef<'_>, &AttrMap) -> Result<SetResult, AttributeError>
            + Send
            + Sync
            + 'static,
    {
        self.set = Some(Setter::Compute(Arc::new(f)));
        self
    }

    pub fn with_position<F>(mut self, f: F) -> Self
    where
        F: Fn(&AttrValue, Rect, NodeRef<'_>, &AttrMap) -> Option<Point> + Send + Sync + 'static,
    {
        self.position = Some(Arc::new(f));
        self
    }

    pub fn with_offset<F>(mut self, f: F) -> Self
    where
        F: Fn(&AttrValue, Rect, NodeRef<'_>, &AttrMap) -> Option<Point> + Send + Sync + 'static,
    {
        self.offset = Some(Arc::new(f));
        self
    }

    /// Whether the definition applies to `value` on `node`
    pub fn qualifies(&self, value: &AttrValue, node: NodeRef<'_>, attrs: &AttrMap) -> bool {
        self.qualify.as_ref().map_or(true, |q| q(value, node, attrs))
    }

    pub fn alias_target(&self) -> Option<&str> {
        match &self.set {
            Some(Setter::Alias(name)) => Some(name),
            _ => None,
        }
    }

    pub fn set_fn(&self) -> Option<&SetFn> {
        match &self.set {
            Some(Setter::Compute(f)) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = match &self.set {
            Some(Setter::Alias(name)) => format!("alias({})", name),
            Some(Setter::Compute(_)) => "compute".to_string(),
            None => "none".to_string(),
        };
        f.debug_struct("AttributeDefinition")
            .field("qualify", &self.qualify.is_some())
            .field("set", &set)
            .field("position", &self.position.is_some())
            .field("offset", &self.offset.is_some())
            .finish()
    }
}
