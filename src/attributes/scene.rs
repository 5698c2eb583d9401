//! In-memory node tree with computed SVG geometry
//!
//! A `Scene` stands in for a rendered element subtree. Bounding boxes are
//! computed from the geometric attributes of each element (`rect`, `circle`,
//! `ellipse`, `line`, `path`, `polyline`, `polygon`, `image`); groups take
//! the union of their children.
//!
//! Selectors resolve in this order: `.` is the root, then unique selector
//! names, then group selector names, then a small CSS subset (`#id`,
//! `.class`, or a tag name) over the root's descendants. `#id` counts as a
//! unique selector.

use std::path::Path as FsPath;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::geometry::{Path, Point, Polyline, Rect};

use super::engine::UpdateOptions;
use super::matrix::Matrix;
use super::node::{NodeId, NodeTree};
use super::value::{AttrMap, AttrValue, SelectorAttrs};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Unique selector name
    pub selector: Option<String>,
    /// Group selector names
    pub groups: Vec<String>,
    pub attributes: AttrMap,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            selector: None,
            groups: Vec::new(),
            attributes: AttrMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A tree of [`SceneNode`]s; the first node is the root
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new(root: SceneNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append `node` as the last child of `parent`
    pub fn add(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Descendants of `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        self.node(id).and_then(|n| n.attributes.get(name))
    }

    /// Node whose unique selector is `selector`
    pub fn find_unique(&self, selector: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.selector.as_deref() == Some(selector))
            .map(NodeId)
    }

    /// Build a scene from a declared node hierarchy
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let mut scene = Scene::new(spec.to_node());
        let root = scene.root();
        scene.add_children(root, &spec.children);
        scene
    }

    fn add_children(&mut self, parent: NodeId, specs: &[NodeSpec]) {
        for spec in specs {
            let id = self.add(parent, spec.to_node());
            self.add_children(id, &spec.children);
        }
    }

    fn number(&self, id: NodeId, name: &str) -> f64 {
        self.get_attribute(id, name)
            .and_then(AttrValue::parse_float)
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    fn text(&self, id: NodeId, name: &str) -> Option<String> {
        self.get_attribute(id, name).map(AttrValue::to_string)
    }

    /// Box of a child in its parent's coordinates
    fn bbox_in_parent(&self, id: NodeId) -> Rect {
        self.transform(id).transform_rect(&self.local_bbox(id))
    }

    fn matches_css(&self, id: NodeId, selector: &str) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if let Some(id_name) = selector.strip_prefix('#') {
            node.id.as_deref() == Some(id_name)
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag == selector
        }
    }
}

impl NodeTree for Scene {
    fn find_by_selector(&self, selector: &str, root: NodeId) -> Vec<NodeId> {
        if selector.is_empty() || selector == "." {
            return vec![root];
        }

        let mut subtree = vec![root];
        subtree.extend(self.descendants(root));

        if let Some(unique) = subtree
            .iter()
            .copied()
            .find(|&id| self.node(id).and_then(|n| n.selector.as_deref()) == Some(selector))
        {
            return vec![unique];
        }

        let grouped: Vec<NodeId> = subtree
            .iter()
            .copied()
            .filter(|&id| self.node(id).map_or(false, |n| n.groups.iter().any(|g| g == selector)))
            .collect();
        if !grouped.is_empty() {
            return grouped;
        }

        subtree
            .into_iter()
            .skip(1)
            .filter(|&id| self.matches_css(id, selector))
            .collect()
    }

    fn is_unique_selector(&self, selector: &str, node: NodeId) -> bool {
        let Some(n) = self.node(node) else {
            return false;
        };
        n.selector.as_deref() == Some(selector)
            || selector
                .strip_prefix('#')
                .map_or(false, |id| n.id.as_deref() == Some(id))
    }

    fn tag(&self, node: NodeId) -> &str {
        self.node(node).map_or("", |n| n.tag.as_str())
    }

    fn describe(&self, node: NodeId) -> String {
        match self.node(node) {
            Some(SceneNode {
                selector: Some(selector),
                ..
            }) => selector.clone(),
            Some(SceneNode { id: Some(id), .. }) => format!("#{}", id),
            Some(n) => format!("{}[{}]", n.tag, node.0),
            None => node.to_string(),
        }
    }

    fn attributes(&self, node: NodeId) -> AttrMap {
        self.node(node)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    fn set_attributes(&mut self, node: NodeId, attrs: &AttrMap) {
        let Some(n) = self.nodes.get_mut(node.0) else {
            return;
        };
        for (name, value) in attrs {
            if value.is_null() {
                n.attributes.remove(name);
            } else {
                n.attributes.insert(name.clone(), value.clone());
            }
        }
    }

    fn transform(&self, node: NodeId) -> Matrix {
        self.text(node, "transform")
            .and_then(|t| Matrix::parse(&t).ok())
            .unwrap_or_default()
    }

    fn local_bbox(&self, node: NodeId) -> Rect {
        let n = |name: &str| self.number(node, name);
        match self.tag(node) {
            "rect" | "image" | "foreignObject" | "use" => {
                Rect::new(n("x"), n("y"), n("width"), n("height"))
            }
            "circle" => {
                let r = n("r");
                Rect::new(n("cx") - r, n("cy") - r, 2.0 * r, 2.0 * r)
            }
            "ellipse" => {
                let (rx, ry) = (n("rx"), n("ry"));
                Rect::new(n("cx") - rx, n("cy") - ry, 2.0 * rx, 2.0 * ry)
            }
            "line" => Rect::from_points(Point::new(n("x1"), n("y1")), Point::new(n("x2"), n("y2")))
                .normalize(),
            "path" => self
                .text(node, "d")
                .and_then(|d| Path::parse(&d).ok())
                .and_then(|p| p.bbox())
                .unwrap_or_default(),
            "polyline" | "polygon" => self
                .text(node, "points")
                .and_then(|points| Polyline::parse(&points).ok())
                .and_then(|p| p.bbox())
                .unwrap_or_default(),
            "text" => Rect::new(n("x"), n("y"), 0.0, 0.0),
            _ => Rect::from_rect_union(self.children(node).iter().map(|&c| self.bbox_in_parent(c)))
                .unwrap_or_default(),
        }
    }

    fn bbox_relative_to(&self, node: NodeId, target: NodeId) -> Rect {
        let mut matrix = Matrix::identity();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == target {
                break;
            }
            matrix = self.transform(id).multiply(&matrix);
            current = self.parent(id);
        }
        matrix.transform_rect(&self.local_bbox(node))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

/// Declared node in a scene file
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub class: Vec<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub attributes: AttrMap,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    fn to_node(&self) -> SceneNode {
        SceneNode {
            tag: self.tag.clone(),
            id: self.id.clone(),
            classes: self.class.clone(),
            selector: self.selector.clone(),
            groups: self.groups.clone(),
            attributes: self.attributes.clone(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SizeSpec {
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct SceneFile {
    root: NodeSpec,
    #[serde(default)]
    size: Option<SizeSpec>,
    #[serde(default)]
    attrs: SelectorAttrs,
    #[serde(default)]
    ro_attrs: Option<SelectorAttrs>,
    #[serde(default)]
    scalable: Option<String>,
    #[serde(default)]
    rotatable: Option<String>,
}

/// A scene file: the node tree, the attributes to resolve and the update options
#[derive(Debug, Clone)]
pub struct SceneDocument {
    pub scene: Scene,
    pub attrs: SelectorAttrs,
    pub options: UpdateOptions,
}

impl SceneDocument {
    pub fn from_file(path: &FsPath) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: SceneFile = toml::from_str(content)?;
        let scene = Scene::from_spec(&file.root);
        let root = scene.root();

        let root_bbox = match file.size {
            Some(size) => Rect::new(0.0, 0.0, size.width, size.height),
            None => scene.local_bbox(root),
        };
        let mut options = UpdateOptions::new(root, root_bbox);

        let lookup = |selector: &str| {
            scene
                .find_unique(selector)
                .ok_or_else(|| ConfigError::Invalid(format!("no node has the selector '{}'", selector)))
        };
        if let Some(selector) = &file.scalable {
            options = options.with_scalable(lookup(selector)?);
        }
        if let Some(selector) = &file.rotatable {
            options = options.with_rotatable(lookup(selector)?);
        }
        if let Some(ro) = file.ro_attrs {
            options = options.with_ro_attributes(ro);
        }

        Ok(Self {
            scene,
            attrs: file.attrs,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::value::attr_map;
    use pretty_assertions::assert_eq;

    fn scene() -> Scene {
        let mut scene = Scene::new(SceneNode::new("g").with_selector("root"));
        let root = scene.root();
        let group = scene.add(
            root,
            SceneNode::new("g")
                .with_selector("scalable")
                .with_attr("transform", "translate(10 20) scale(2)"),
        );
        scene.add(
            group,
            SceneNode::new("rect")
                .with_selector("body")
                .with_class("shape")
                .with_attr("width", 50)
                .with_attr("height", 30),
        );
        scene.add(
            root,
            SceneNode::new("circle")
                .with_id("port")
                .with_class("shape")
                .with_group("ports")
                .with_attr("cx", 5)
                .with_attr("cy", 5)
                .with_attr("r", 5),
        );
        scene
    }

    #[test]
    fn test_descendants_in_document_order() {
        let scene = scene();
        assert_eq!(scene.descendants(scene.root()), vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(scene.children(NodeId(1)), &[NodeId(2)]);
    }

    #[test]
    fn test_find_by_selector() {
        let scene = scene();
        let root = scene.root();
        assert_eq!(scene.find_by_selector(".", root), vec![root]);
        assert_eq!(scene.find_by_selector("body", root), vec![NodeId(2)]);
        assert_eq!(scene.find_by_selector("ports", root), vec![NodeId(3)]);
        assert_eq!(scene.find_by_selector(".shape", root), vec![NodeId(2), NodeId(3)]);
        assert_eq!(scene.find_by_selector("#port", root), vec![NodeId(3)]);
        assert_eq!(scene.find_by_selector("circle", root), vec![NodeId(3)]);
        assert!(scene.find_by_selector("ellipse", root).is_empty());
        assert_eq!(scene.find_by_selector("body", NodeId(3)), Vec::<NodeId>::new());
    }

    #[test]
    fn test_unique_selectors() {
        let scene = scene();
        assert!(scene.is_unique_selector("body", NodeId(2)));
        assert!(scene.is_unique_selector("#port", NodeId(3)));
        assert!(!scene.is_unique_selector(".shape", NodeId(2)));
        assert!(!scene.is_unique_selector("ports", NodeId(3)));
    }

    #[test]
    fn test_local_bbox_by_tag() {
        let scene = scene();
        assert_eq!(scene.local_bbox(NodeId(2)), Rect::new(0.0, 0.0, 50.0, 30.0));
        assert_eq!(scene.local_bbox(NodeId(3)), Rect::new(0.0, 0.0, 10.0, 10.0));
        // group: union of its children in its own frame, before its transform
        assert_eq!(scene.local_bbox(NodeId(1)), Rect::new(0.0, 0.0, 50.0, 30.0));
        assert_eq!(scene.local_bbox(scene.root()), Rect::new(0.0, 0.0, 110.0, 80.0));
    }

    #[test]
    fn test_bbox_relative_to() {
        let scene = scene();
        assert_eq!(
            scene.bbox_relative_to(NodeId(2), scene.root()),
            Rect::new(10.0, 20.0, 100.0, 60.0)
        );
        assert_eq!(
            scene.bbox_relative_to(NodeId(2), NodeId(1)),
            Rect::new(0.0, 0.0, 50.0, 30.0)
        );
    }

    #[test]
    fn test_contains_and_scale() {
        let scene = scene();
        assert!(scene.contains(NodeId(1), NodeId(2)));
        assert!(scene.contains(scene.root(), NodeId(2)));
        assert!(!scene.contains(NodeId(2), NodeId(2)));
        assert!(!scene.contains(NodeId(1), NodeId(3)));
        assert_eq!(scene.scale(NodeId(1)), (2.0, 2.0));
    }

    #[test]
    fn test_null_attribute_removes_key() {
        let mut scene = scene();
        let body = NodeId(2);
        scene.set_attributes(body, &attr_map([("fill", AttrValue::from("red")), ("width", AttrValue::Null)]));
        assert_eq!(scene.get_attribute(body, "fill"), Some(&AttrValue::from("red")));
        assert_eq!(scene.get_attribute(body, "width"), None);
        assert_eq!(scene.local_bbox(body), Rect::new(0.0, 0.0, 0.0, 30.0));

        scene.set_attribute(body, "fill", AttrValue::Null);
        scene.set_attribute(body, "missing", AttrValue::Null);
        assert!(!scene.attributes(body).contains_key("fill"));
        assert!(!scene.attributes(body).contains_key("missing"));
    }

    #[test]
    fn test_describe() {
        let scene = scene();
        assert_eq!(scene.describe(NodeId(2)), "body");
        assert_eq!(scene.describe(NodeId(3)), "#port");
        let mut plain = Scene::new(SceneNode::new("g"));
        let child = plain.add(plain.root(), SceneNode::new("path"));
        assert_eq!(plain.describe(child), "path[1]");
    }

    #[test]
    fn test_path_and_points_geometry() {
        let mut scene = Scene::new(SceneNode::new("g"));
        let root = scene.root();
        let path = scene.add(root, SceneNode::new("path").with_attr("d", "M 10 10 L 30 40"));
        let polygon = scene.add(root, SceneNode::new("polygon").with_attr("points", "0,0 10,5 4,8"));
        let broken = scene.add(root, SceneNode::new("path").with_attr("d", "M 10 x"));
        assert_eq!(scene.local_bbox(path), Rect::new(10.0, 10.0, 20.0, 30.0));
        assert_eq!(scene.local_bbox(polygon), Rect::new(0.0, 0.0, 10.0, 8.0));
        assert_eq!(scene.local_bbox(broken), Rect::default());
    }

    #[test]
    fn test_scene_document_from_str() {
        let doc = SceneDocument::from_str(
            r#"
            scalable = "scalable"

            [size]
            width = 120
            height = 60

            [root]
            tag = "g"
            selector = "root"

            [[root.children]]
            tag = "g"
            selector = "scalable"

            [[root.children.children]]
            tag = "rect"
            selector = "body"
            attributes = { width = 10, height = 10 }

            [attrs.body]
            refWidth = "100%"
            fill = "red"
            "#,
        )
        .unwrap();

        assert_eq!(doc.scene.len(), 3);
        assert_eq!(doc.options.root_bbox, Rect::new(0.0, 0.0, 120.0, 60.0));
        assert_eq!(doc.options.scalable, Some(NodeId(1)));
        assert_eq!(doc.attrs["body"]["refWidth"], AttrValue::from("100%"));
        assert_eq!(doc.scene.get_attribute(NodeId(2), "width"), Some(&AttrValue::from(10.0)));
    }

    #[test]
    fn test_scene_document_unknown_group() {
        let err = SceneDocument::from_str(
            r#"
            rotatable = "missing"
            [root]
            tag = "g"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
