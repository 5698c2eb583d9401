//! Attribute resolution
//!
//! Resolution runs in three stages:
//!
//! 1. **Fan-out**: each selector is matched against the node tree and its
//!    attribute map is merged into the maps of every matched node. Fewer
//!    matches means higher precedence; a unique selector beats every group.
//! 2. **Classification**: each node's map is split into plain attributes and
//!    the `set`, `position` and `offset` buckets of special attributes.
//! 3. **Relative update**: nodes with special attributes are ordered so that
//!    a node's `ref` target is updated first, then their attributes and
//!    transforms are computed from the reference bounding box.
//!
//! With a partial overlay (`ro_attributes`) only the overlay's nodes are
//! touched, but their special attributes still see the full attribute set.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace, warn};

use crate::geometry::{Point, Rect};

use super::config::{CyclePolicy, EngineConfig};
use super::definition::SetResult;
use super::error::AttributeError;
use super::matrix::Matrix;
use super::node::{NodeId, NodeRef, NodeTree};
use super::registry::AttributeRegistry;
use super::value::{deep_merge, to_kebab_case, AttrMap, AttrValue, SelectorAttrs};

/// A node's attributes split by how they are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedAttributes {
    pub raw: AttrMap,
    /// Written as-is, under kebab-case names
    pub normal: Option<AttrMap>,
    pub set: Option<AttrMap>,
    pub position: Option<AttrMap>,
    pub offset: Option<AttrMap>,
}

impl ProcessedAttributes {
    /// Whether any special attribute needs a reference box
    pub fn is_relative(&self) -> bool {
        self.set.is_some() || self.position.is_some() || self.offset.is_some()
    }
}

/// Merged attributes for every node a selector map touches, in first-match order
#[derive(Debug, Clone, Default)]
pub struct NodesAttributes {
    entries: Vec<(NodeId, AttrMap)>,
    index: HashMap<NodeId, usize>,
}

impl NodesAttributes {
    pub fn get(&self, node: NodeId) -> Option<&AttrMap> {
        self.index.get(&node).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &AttrMap)> {
        self.entries.iter().map(|(node, attrs)| (*node, attrs))
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries.iter().map(|(node, _)| *node).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a subtree update runs and what it measures against
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub root: NodeId,
    /// Reference box for nodes without a `ref`
    pub root_bbox: Rect,
    /// Group whose scale is compensated in positions and offsets
    pub scalable: Option<NodeId>,
    /// Group whose rotation is applied to boxes referenced from outside it
    pub rotatable: Option<NodeId>,
    /// Partial overlay; only its nodes are updated
    pub ro_attributes: Option<SelectorAttrs>,
}

impl UpdateOptions {
    pub fn new(root: NodeId, root_bbox: Rect) -> Self {
        Self {
            root,
            root_bbox,
            scalable: None,
            rotatable: None,
            ro_attributes: None,
        }
    }

    pub fn with_scalable(mut self, node: NodeId) -> Self {
        self.scalable = Some(node);
        self
    }

    pub fn with_rotatable(mut self, node: NodeId) -> Self {
        self.rotatable = Some(node);
        self
    }

    pub fn with_ro_attributes(mut self, attrs: SelectorAttrs) -> Self {
        self.ro_attributes = Some(attrs);
        self
    }
}

/// A node waiting for its relative attributes
#[derive(Debug, Clone)]
struct RelativeItem {
    node: NodeId,
    ref_node: Option<NodeId>,
    processed: ProcessedAttributes,
    all_attributes: Option<AttrMap>,
}

/// Resolves selector-keyed attribute maps against a [`NodeTree`]
#[derive(Debug, Clone)]
pub struct AttributeEngine<'r> {
    registry: &'r AttributeRegistry,
    config: EngineConfig,
}

impl<'r> AttributeEngine<'r> {
    pub fn new(registry: &'r AttributeRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &AttributeRegistry {
        self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Split a node's attributes into plain ones and special buckets
    pub fn process_node_attributes<T: NodeTree + ?Sized>(
        &self,
        tree: &T,
        node: NodeId,
        attrs: &AttrMap,
    ) -> ProcessedAttributes {
        let node_ref = NodeRef {
            id: node,
            tag: tree.tag(node),
        };
        let mut normal: Option<AttrMap> = None;
        let mut relatives = Vec::new();

        for (name, value) in attrs {
            match self.registry.get(name) {
                Some(def) if def.qualifies(value, node_ref, attrs) => {
                    if let Some(target) = def.alias_target() {
                        normal
                            .get_or_insert_with(AttrMap::new)
                            .insert(target.to_string(), value.clone());
                    }
                    if !value.is_null() {
                        relatives.push((name, value, def));
                    }
                }
                _ => {
                    normal
                        .get_or_insert_with(AttrMap::new)
                        .insert(to_kebab_case(name), value.clone());
                }
            }
        }

        let mut processed = ProcessedAttributes {
            raw: attrs.clone(),
            normal,
            ..ProcessedAttributes::default()
        };
        for (name, value, def) in relatives {
            if def.set_fn().is_some() {
                processed
                    .set
                    .get_or_insert_with(AttrMap::new)
                    .insert(name.clone(), value.clone());
            }
            if def.position.is_some() {
                processed
                    .position
                    .get_or_insert_with(AttrMap::new)
                    .insert(name.clone(), value.clone());
            }
            if def.offset.is_some() {
                processed
                    .offset
                    .get_or_insert_with(AttrMap::new)
                    .insert(name.clone(), value.clone());
            }
        }

        debug!(
            node = %tree.describe(node),
            normal = processed.normal.as_ref().map_or(0, AttrMap::len),
            set = processed.set.as_ref().map_or(0, AttrMap::len),
            position = processed.position.as_ref().map_or(0, AttrMap::len),
            offset = processed.offset.as_ref().map_or(0, AttrMap::len),
            "classified attributes"
        );
        processed
    }

    /// Overlay the buckets of a partial update onto the full classification
    ///
    /// Plain attributes come from the overlay only; a `transform` from the
    /// full set is carried over so positioning keeps its base.
    pub fn merge_processed_attributes(processed: &mut ProcessedAttributes, overlay: ProcessedAttributes) {
        let ProcessedAttributes {
            normal: overlay_normal,
            set,
            position,
            offset,
            ..
        } = overlay;

        processed
            .set
            .get_or_insert_with(AttrMap::new)
            .extend(set.unwrap_or_default());
        processed
            .position
            .get_or_insert_with(AttrMap::new)
            .extend(position.unwrap_or_default());
        processed
            .offset
            .get_or_insert_with(AttrMap::new)
            .extend(offset.unwrap_or_default());

        let transform = processed
            .normal
            .as_ref()
            .and_then(|normal| normal.get("transform"))
            .cloned();
        processed.normal = overlay_normal.map(|mut normal| {
            if let Some(transform) = transform {
                normal.insert("transform".to_string(), transform);
            }
            normal
        });
    }

    /// Fan selector maps out to the nodes they match
    ///
    /// `selector_cache` receives every selector's matches for later `ref` lookups.
    pub fn find_nodes_attributes<T: NodeTree + ?Sized>(
        &self,
        tree: &T,
        attrs: &SelectorAttrs,
        root: NodeId,
        selector_cache: &mut HashMap<String, Vec<NodeId>>,
    ) -> NodesAttributes {
        // (precedence, attrs) per node, sorted by ascending match count
        let mut pending: Vec<(NodeId, Vec<(isize, &AttrMap)>)> = Vec::new();
        let mut index: HashMap<NodeId, usize> = HashMap::new();

        for (selector, node_attrs) in attrs {
            let selected = tree.find_by_selector(selector, root);
            let count = selected.len() as isize;
            trace!(selector = %selector, matched = selected.len(), "selector matched");

            for &node in &selected {
                let unique = tree.is_unique_selector(selector, node);
                let slot = *index.entry(node).or_insert_with(|| {
                    pending.push((node, Vec::new()));
                    pending.len() - 1
                });
                let layers = &mut pending[slot].1;
                if unique {
                    layers.insert(0, (-1, node_attrs));
                } else {
                    let at = layers.partition_point(|(n, _)| *n < count);
                    layers.insert(at, (count, node_attrs));
                }
            }
            selector_cache.insert(selector.clone(), selected);
        }

        let entries = pending
            .into_iter()
            .map(|(node, layers)| {
                let mut merged = AttrMap::new();
                for (_, layer) in layers.iter().rev() {
                    deep_merge(&mut merged, layer);
                }
                (node, merged)
            })
            .collect();

        NodesAttributes { entries, index }
    }

    /// Apply one node's processed attributes against its reference box
    pub fn update_relative_attributes<T: NodeTree + ?Sized>(
        &self,
        tree: &mut T,
        node: NodeId,
        processed: &ProcessedAttributes,
        ref_bbox: Rect,
        opt: &UpdateOptions,
    ) -> Result<(), AttributeError> {
        let raw = &processed.raw;
        let mut node_attrs = processed.normal.clone().unwrap_or_default();
        let tag = tree.tag(node).to_string();
        let node_ref = NodeRef { id: node, tag: &tag };

        for (name, value) in processed.set.iter().flatten() {
            let Some(set) = self.registry.get(name).and_then(|def| def.set_fn()) else {
                continue;
            };
            match set(value, ref_bbox, node_ref, raw)? {
                SetResult::Attrs(attrs) => node_attrs.extend(attrs),
                SetResult::Value(v) => {
                    node_attrs.insert(name.clone(), v);
                }
                SetResult::Unset => {}
            }
        }

        let node_transform = node_attrs.remove("transform");
        let mut matrix = match &node_transform {
            Some(transform) => Matrix::parse(&transform.to_string())?,
            None => Matrix::identity(),
        };
        let mut position = Point::new(matrix.e, matrix.f);
        matrix.e = 0.0;
        matrix.f = 0.0;

        let (sx, sy) = if processed.position.is_some() || processed.offset.is_some() {
            self.node_scale(tree, node, opt.scalable)
        } else {
            (1.0, 1.0)
        };
        let origin = Point::new(0.0, 0.0);

        let mut positioned = false;
        for (name, value) in processed.position.iter().flatten() {
            let translate = self.registry.get(name).and_then(|def| def.position.as_ref());
            if let Some(t) = translate.and_then(|f| f(value, ref_bbox, node_ref, raw)) {
                let t = t.scale(sx, sy, origin);
                position = position.offset(t.x, t.y);
                positioned = true;
            }
        }

        tree.set_attributes(node, &node_attrs);

        let mut offseted = false;
        if let Some(offsets) = &processed.offset {
            let client_rect = tree.local_bbox(node);
            if client_rect.width > 0.0 && client_rect.height > 0.0 {
                let node_bbox = matrix
                    .transform_rect(&client_rect)
                    .scale(1.0 / sx, 1.0 / sy, origin);
                for (name, value) in offsets {
                    let translate = self.registry.get(name).and_then(|def| def.offset.as_ref());
                    if let Some(t) = translate.and_then(|f| f(value, node_bbox, node_ref, raw)) {
                        let t = t.scale(sx, sy, origin);
                        position = position.offset(t.x, t.y);
                        offseted = true;
                    }
                }
            } else {
                debug!(node = %tree.describe(node), "skipped offsets of an empty node");
            }
        }

        if node_transform.is_some() || positioned || offseted {
            let position = position.round(self.config.transform_precision);
            matrix.e = position.x;
            matrix.f = position.y;
            tree.set_attribute(node, "transform", AttrValue::String(matrix.to_transform_string()));
        }

        Ok(())
    }

    /// Resolve `attrs` over the subtree under `opt.root` and write the results
    ///
    /// Returns the updated nodes in the order they were first matched.
    pub fn update_dom_subtree_attributes<T: NodeTree + ?Sized>(
        &self,
        tree: &mut T,
        attrs: &SelectorAttrs,
        opt: &UpdateOptions,
    ) -> Result<Vec<NodeId>, AttributeError> {
        let mut selector_cache = HashMap::new();
        let ro_attrs = opt.ro_attributes.as_ref();

        let nodes_attrs =
            self.find_nodes_attributes(&*tree, ro_attrs.unwrap_or(attrs), opt.root, &mut selector_cache);
        let nodes_all_attrs = match ro_attrs {
            Some(_) => Some(self.find_nodes_attributes(&*tree, attrs, opt.root, &mut selector_cache)),
            None => None,
        };
        let all_attrs = nodes_all_attrs.as_ref().unwrap_or(&nodes_attrs);

        let mut items = Vec::new();
        for (node, node_attrs) in nodes_attrs.iter() {
            let processed = self.process_node_attributes(&*tree, node, node_attrs);
            if !processed.is_relative() {
                tree.set_attributes(node, processed.normal.as_ref().unwrap_or(&AttrMap::new()));
                continue;
            }

            let node_all_attrs = all_attrs.get(node);
            let ref_selector = match node_all_attrs {
                Some(all) if !node_attrs.contains_key("ref") => all.get("ref"),
                _ => node_attrs.get("ref"),
            };
            let ref_node = match ref_selector.filter(|r| r.is_truthy()) {
                Some(selector) => {
                    let selector = selector.to_string();
                    let found = match selector_cache.get(&selector) {
                        Some(nodes) => nodes.first().copied(),
                        None => tree.find_by_selector(&selector, opt.root).first().copied(),
                    };
                    Some(found.ok_or_else(|| AttributeError::dangling(selector))?)
                }
                None => None,
            };

            items.push(RelativeItem {
                node,
                ref_node,
                processed,
                all_attributes: node_all_attrs.cloned(),
            });
        }

        let items = self.order_relative_items(&*tree, items)?;

        let mut bbox_cache: HashMap<Option<NodeId>, Rect> = HashMap::new();
        let mut rotatable_matrix: Option<Matrix> = None;

        for item in items {
            let RelativeItem {
                node,
                ref_node,
                processed,
                all_attributes,
            } = item;

            let rotatable = opt
                .rotatable
                .filter(|&rotatable| ref_node.map_or(false, |r| tree.contains(rotatable, r)));
            let unrotated = *bbox_cache.entry(ref_node).or_insert_with(|| match ref_node {
                Some(r) => tree.bbox_relative_to(r, rotatable.unwrap_or(opt.root)),
                None => opt.root_bbox,
            });

            let processed = match ro_attrs {
                Some(_) => {
                    let mut full = self.process_node_attributes(
                        &*tree,
                        node,
                        all_attributes.as_ref().unwrap_or(&AttrMap::new()),
                    );
                    Self::merge_processed_attributes(&mut full, processed);
                    full
                }
                None => processed,
            };

            let ref_bbox = match rotatable {
                Some(rotatable) if !tree.contains(rotatable, node) => {
                    let matrix = *rotatable_matrix.get_or_insert_with(|| tree.transform(rotatable));
                    matrix.transform_rect(&unrotated)
                }
                _ => unrotated,
            };

            trace!(
                node = %tree.describe(node),
                reference = %ref_bbox,
                "updating relative attributes"
            );
            self.update_relative_attributes(tree, node, &processed, ref_bbox, opt)?;
        }

        Ok(nodes_attrs.nodes())
    }

    /// Update the subtree and return the final attributes of every updated node
    pub fn resolve<T: NodeTree + ?Sized>(
        &self,
        tree: &mut T,
        attrs: &SelectorAttrs,
        opt: &UpdateOptions,
    ) -> Result<BTreeMap<NodeId, AttrMap>, AttributeError> {
        let updated = self.update_dom_subtree_attributes(tree, attrs, opt)?;
        Ok(updated
            .into_iter()
            .map(|node| (node, tree.attributes(node)))
            .collect())
    }

    /// Inverse scale of the scalable group for nodes inside it
    fn node_scale<T: NodeTree + ?Sized>(
        &self,
        tree: &T,
        node: NodeId,
        scalable: Option<NodeId>,
    ) -> (f64, f64) {
        match scalable {
            Some(group) if tree.contains(group, node) => {
                let (sx, sy) = tree.scale(group);
                (1.0 / sx, 1.0 / sy)
            }
            _ => (1.0, 1.0),
        }
    }

    /// Order items so every `ref` target is updated before the nodes measuring it
    fn order_relative_items<T: NodeTree + ?Sized>(
        &self,
        tree: &T,
        items: Vec<RelativeItem>,
    ) -> Result<Vec<RelativeItem>, AttributeError> {
        let cycle = find_ref_cycle(&items);

        match self.config.cycle_policy {
            CyclePolicy::Strict => {
                if let Some(cycle) = cycle {
                    let labels = cycle.iter().map(|&i| tree.describe(items[i].node)).collect();
                    return Err(AttributeError::circular(labels));
                }
                Ok(topological_order(items))
            }
            CyclePolicy::BestEffort => {
                if let Some(cycle) = cycle {
                    let labels: Vec<String> =
                        cycle.iter().map(|&i| tree.describe(items[i].node)).collect();
                    warn!(cycle = %labels.join(" -> "), "circular ref dependency, resolving in arrival order");
                }
                Ok(arrival_order(items))
            }
        }
    }
}

/// Each item goes before the first queued item that references its node
fn arrival_order(items: Vec<RelativeItem>) -> Vec<RelativeItem> {
    let mut ordered: Vec<RelativeItem> = Vec::with_capacity(items.len());
    for item in items {
        match ordered.iter().position(|queued| queued.ref_node == Some(item.node)) {
            Some(at) => ordered.insert(at, item),
            None => ordered.push(item),
        }
    }
    ordered
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Item index of the node each item references, when that node is itself an item
fn ref_targets(items: &[RelativeItem]) -> Vec<Option<usize>> {
    let by_node: HashMap<NodeId, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.node, i))
        .collect();
    items
        .iter()
        .map(|item| item.ref_node.and_then(|r| by_node.get(&r).copied()))
        .collect()
}

/// First ref cycle in arrival order, closed by repeating its first item
fn find_ref_cycle(items: &[RelativeItem]) -> Option<Vec<usize>> {
    let targets = ref_targets(items);
    let mut marks = vec![Mark::Unvisited; items.len()];

    for start in 0..items.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // each item has at most one ref, so the walk is a simple chain
        let mut chain = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match marks[i] {
                Mark::Done => break,
                Mark::Visiting => {
                    let from = chain.iter().position(|&c| c == i).unwrap_or(0);
                    let mut cycle = chain[from..].to_vec();
                    cycle.push(i);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    marks[i] = Mark::Visiting;
                    chain.push(i);
                    current = targets[i];
                }
            }
        }
        for i in chain {
            marks[i] = Mark::Done;
        }
    }
    None
}

/// Dependencies first, otherwise arrival order; assumes no cycles
fn topological_order(items: Vec<RelativeItem>) -> Vec<RelativeItem> {
    let targets = ref_targets(&items);
    let mut placed = vec![false; items.len()];
    let mut order = Vec::with_capacity(items.len());

    for start in 0..items.len() {
        let mut chain = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            if placed[i] || chain.contains(&i) {
                break;
            }
            chain.push(i);
            current = targets[i];
        }
        for &i in chain.iter().rev() {
            placed[i] = true;
            order.push(i);
        }
    }

    let mut slots: Vec<Option<RelativeItem>> = items.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::scene::{Scene, SceneNode};
    use crate::attributes::value::attr_map;
    use pretty_assertions::assert_eq;

    fn item(node: usize, ref_node: Option<usize>) -> RelativeItem {
        RelativeItem {
            node: NodeId(node),
            ref_node: ref_node.map(NodeId),
            processed: ProcessedAttributes::default(),
            all_attributes: None,
        }
    }

    fn nodes(items: &[RelativeItem]) -> Vec<usize> {
        items.iter().map(|i| i.node.0).collect()
    }

    fn selector_attrs(entries: Vec<(&str, AttrMap)>) -> SelectorAttrs {
        entries
            .into_iter()
            .map(|(selector, attrs)| (selector.to_string(), attrs))
            .collect()
    }

    /// root > [body rect (selector "body"), label text (selector "label"), two ".dot" circles]
    fn scene() -> Scene {
        let mut scene = Scene::new(SceneNode::new("g").with_selector("root"));
        let root = scene.root();
        scene.add(
            root,
            SceneNode::new("rect")
                .with_selector("body")
                .with_attr("x", 0)
                .with_attr("y", 0)
                .with_attr("width", 100)
                .with_attr("height", 40),
        );
        scene.add(
            root,
            SceneNode::new("rect")
                .with_selector("label")
                .with_attr("width", 20)
                .with_attr("height", 10),
        );
        scene.add(root, SceneNode::new("circle").with_class("dot").with_id("first"));
        scene.add(root, SceneNode::new("circle").with_class("dot"));
        scene
    }

    #[test]
    fn test_process_node_attributes_buckets() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let scene = scene();
        let attrs = attr_map([
            ("strokeWidth", AttrValue::from(2)),
            ("refWidth", AttrValue::from("50%")),
            ("refX", AttrValue::from(10)),
            ("xAlignment", AttrValue::from("middle")),
            ("xlinkHref", AttrValue::from("#icon")),
            ("ref", AttrValue::from("body")),
        ]);
        let processed = engine.process_node_attributes(&scene, NodeId(1), &attrs);

        assert_eq!(
            processed.normal,
            Some(attr_map([("stroke-width", AttrValue::from(2)), ("xlink:href", "#icon".into())]))
        );
        assert_eq!(processed.set, Some(attr_map([("refWidth", "50%")])));
        assert_eq!(processed.position, Some(attr_map([("refX", 10)])));
        assert_eq!(processed.offset, Some(attr_map([("xAlignment", "middle")])));
        assert_eq!(processed.raw, attrs);
        assert!(processed.is_relative());
    }

    #[test]
    fn test_process_null_special_is_dropped() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let attrs = attr_map([("refX", AttrValue::Null), ("fill", AttrValue::from("red"))]);
        let processed = engine.process_node_attributes(&scene(), NodeId(1), &attrs);

        assert_eq!(processed.normal, Some(attr_map([("fill", "red")])));
        assert!(!processed.is_relative());
    }

    #[test]
    fn test_merge_processed_attributes_keeps_transform() {
        let mut full = ProcessedAttributes {
            normal: Some(attr_map([("transform", "translate(5 5)"), ("fill", "red")])),
            position: Some(attr_map([("refX", 10)])),
            ..ProcessedAttributes::default()
        };
        let overlay = ProcessedAttributes {
            normal: Some(attr_map([("stroke", "blue")])),
            offset: Some(attr_map([("xAlignment", "middle")])),
            ..ProcessedAttributes::default()
        };
        AttributeEngine::merge_processed_attributes(&mut full, overlay);

        assert_eq!(
            full.normal,
            Some(attr_map([("stroke", "blue"), ("transform", "translate(5 5)")]))
        );
        assert_eq!(full.position, Some(attr_map([("refX", 10)])));
        assert_eq!(full.offset, Some(attr_map([("xAlignment", "middle")])));
        assert_eq!(full.set, Some(AttrMap::new()));
    }

    #[test]
    fn test_find_nodes_attributes_precedence() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let scene = scene();
        let attrs = selector_attrs(vec![
            ("circle", attr_map([("fill", AttrValue::from("red")), ("r", AttrValue::from(3))])),
            (".dot", attr_map([("fill", "green")])),
            ("#first", attr_map([("fill", "blue")])),
        ]);
        let mut cache = HashMap::new();
        let found = engine.find_nodes_attributes(&scene, &attrs, scene.root(), &mut cache);

        assert_eq!(found.len(), 2);
        assert_eq!(found.nodes(), vec![NodeId(3), NodeId(4)]);
        assert_eq!(found.get(NodeId(3)), Some(&attr_map([("fill", AttrValue::from("blue")), ("r", 3.into())])));
        // equal match counts: the selector visited last wins
        assert_eq!(found.get(NodeId(4)), Some(&attr_map([("fill", AttrValue::from("red")), ("r", 3.into())])));
        assert_eq!(cache.get(".dot"), Some(&vec![NodeId(3), NodeId(4)]));
    }

    #[test]
    fn test_arrival_order_puts_targets_first() {
        // 1 refs 2, 2 refs 3
        let ordered = arrival_order(vec![item(1, Some(2)), item(2, Some(3)), item(3, None)]);
        assert_eq!(nodes(&ordered), vec![3, 2, 1]);
    }

    #[test]
    fn test_topological_order_handles_late_targets() {
        // arrival order alone would update 2 before 3
        let items = vec![item(1, Some(2)), item(3, None), item(2, Some(3))];
        assert_eq!(nodes(&arrival_order(items.clone())), vec![2, 1, 3]);
        assert_eq!(nodes(&topological_order(items)), vec![3, 2, 1]);
    }

    #[test]
    fn test_find_ref_cycle() {
        let items = vec![item(1, Some(2)), item(2, Some(1)), item(3, None)];
        assert_eq!(find_ref_cycle(&items), Some(vec![0, 1, 0]));
        let items = vec![item(1, Some(2)), item(2, None), item(3, Some(9))];
        assert_eq!(find_ref_cycle(&items), None);
    }

    #[test]
    fn test_strict_policy_rejects_cycles() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let mut scene = scene();
        let attrs = selector_attrs(vec![
            ("body", attr_map([("ref", "label"), ("refWidth", "50%")])),
            ("label", attr_map([("ref", "body"), ("refWidth", "50%")])),
        ]);
        let opt = UpdateOptions::new(scene.root(), Rect::new(0.0, 0.0, 200.0, 100.0));
        let err = engine
            .update_dom_subtree_attributes(&mut scene, &attrs, &opt)
            .unwrap_err();
        assert_eq!(err.to_string(), "circular ref dependency: body -> label -> body");
    }

    #[test]
    fn test_best_effort_policy_resolves_cycles() {
        let registry = AttributeRegistry::with_builtins();
        let config = EngineConfig::new().with_cycle_policy(CyclePolicy::BestEffort);
        let engine = AttributeEngine::new(&registry, config);
        let mut scene = scene();
        let attrs = selector_attrs(vec![
            ("body", attr_map([("ref", "label"), ("refWidth", "50%")])),
            ("label", attr_map([("ref", "body"), ("refWidth", "50%")])),
        ]);
        let opt = UpdateOptions::new(scene.root(), Rect::new(0.0, 0.0, 200.0, 100.0));
        assert!(engine.update_dom_subtree_attributes(&mut scene, &attrs, &opt).is_ok());
    }

    #[test]
    fn test_dangling_reference() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let mut scene = scene();
        let attrs = selector_attrs(vec![("label", attr_map([("ref", AttrValue::from("missing")), ("refX", AttrValue::from(5))]))]);
        let opt = UpdateOptions::new(scene.root(), Rect::new(0.0, 0.0, 200.0, 100.0));
        let err = engine
            .update_dom_subtree_attributes(&mut scene, &attrs, &opt)
            .unwrap_err();
        assert_eq!(err.to_string(), "\"missing\" reference does not exist.");
    }

    #[test]
    fn test_update_relative_attributes_position_and_offset() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let mut scene = scene();
        let label = NodeId(2);
        let processed = engine.process_node_attributes(
            &scene,
            label,
            &attr_map([
                ("refX", AttrValue::from("50%")),
                ("refY", "50%".into()),
                ("xAlignment", "middle".into()),
                ("yAlignment", "middle".into()),
            ]),
        );
        let opt = UpdateOptions::new(scene.root(), Rect::default());
        engine
            .update_relative_attributes(&mut scene, label, &processed, Rect::new(0.0, 0.0, 100.0, 40.0), &opt)
            .unwrap();

        assert_eq!(
            scene.get_attribute(label, "transform"),
            Some(&AttrValue::from("matrix(1,0,0,1,40,15)"))
        );
    }

    #[test]
    fn test_update_relative_attributes_keeps_declared_transform() {
        let registry = AttributeRegistry::with_builtins();
        let engine = AttributeEngine::new(&registry, EngineConfig::default());
        let mut scene = scene();
        let label = NodeId(2);
        let processed = engine.process_node_attributes(
            &scene,
            label,
            &attr_map([("transform", AttrValue::from("translate(3 4) scale(2)")), ("refX", 10.into())]),
        );
        let opt = UpdateOptions::new(scene.root(), Rect::default());
        engine
            .update_relative_attributes(&mut scene, label, &processed, Rect::new(5.0, 0.0, 100.0, 40.0), &opt)
            .unwrap();

        assert_eq!(
            scene.get_attribute(label, "transform"),
            Some(&AttrValue::from("matrix(2,0,0,2,18,4)"))
        );
    }
}
