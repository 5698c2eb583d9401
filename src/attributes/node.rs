//! The node tree the engine resolves attributes against

use std::fmt;

use crate::geometry::Rect;

use super::matrix::Matrix;
use super::value::{AttrMap, AttrValue};

/// Handle of a node inside a [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// What an attribute resolver may know about the node it runs for
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub id: NodeId,
    pub tag: &'a str,
}

/// A rendered element subtree
///
/// The engine only reads geometry through this trait and writes final
/// attributes back through it, so any retained-mode scene can host it.
pub trait NodeTree {
    /// Nodes matched by `selector` under `root`; `"."` selects `root` itself
    fn find_by_selector(&self, selector: &str, root: NodeId) -> Vec<NodeId>;

    /// Whether `selector` names exactly this one node
    fn is_unique_selector(&self, selector: &str, node: NodeId) -> bool;

    /// Element name such as `rect` or `g`
    fn tag(&self, node: NodeId) -> &str;

    /// Short human-readable label used in errors and logs
    fn describe(&self, node: NodeId) -> String;

    fn attributes(&self, node: NodeId) -> AttrMap;

    /// Write `attrs` onto the node; a null value removes the attribute
    fn set_attributes(&mut self, node: NodeId, attrs: &AttrMap);

    fn set_attribute(&mut self, node: NodeId, name: &str, value: AttrValue) {
        let mut attrs = AttrMap::new();
        attrs.insert(name.to_string(), value);
        self.set_attributes(node, &attrs);
    }

    /// The node's own transform
    fn transform(&self, node: NodeId) -> Matrix;

    /// Bounding box in the node's local coordinates, before its own transform
    fn local_bbox(&self, node: NodeId) -> Rect;

    /// Bounding box in the coordinate system of `target`
    fn bbox_relative_to(&self, node: NodeId, target: NodeId) -> Rect;

    /// Whether `node` is a strict descendant of `ancestor`
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Scale applied by the node's own transform
    fn scale(&self, node: NodeId) -> (f64, f64) {
        self.transform(node).scale_factors()
    }
}
