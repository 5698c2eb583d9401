//! Attribute resolution engine
//!
//! Turns selector-keyed attribute maps into concrete element attributes.
//! Special attributes such as `refX: "50%"` or `xAlignment: "middle"` are
//! resolved against the bounding box of a reference node and folded into
//! the element's `transform`.
//!
//! # Example
//!
//! ```rust
//! use diagram_kernel::attributes::{
//!     attr_map, AttributeEngine, AttributeRegistry, EngineConfig, Scene, SceneNode,
//!     SelectorAttrs, UpdateOptions,
//! };
//! use diagram_kernel::geometry::Rect;
//!
//! let mut scene = Scene::new(SceneNode::new("g"));
//! let body = scene.add(scene.root(), SceneNode::new("rect").with_selector("body"));
//!
//! let mut attrs = SelectorAttrs::new();
//! attrs.insert("body".to_string(), attr_map([("refWidth", "100%"), ("refHeight", "100%")]));
//!
//! let registry = AttributeRegistry::with_builtins();
//! let engine = AttributeEngine::new(&registry, EngineConfig::default());
//! let opt = UpdateOptions::new(scene.root(), Rect::new(0.0, 0.0, 80.0, 40.0));
//! let resolved = engine.resolve(&mut scene, &attrs, &opt).unwrap();
//!
//! assert_eq!(resolved[&body]["width"].to_string(), "80");
//! ```

pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod node;
pub mod registry;
pub mod scene;
pub mod value;

pub use config::{CyclePolicy, EngineConfig};
pub use definition::{AttributeDefinition, SetResult, Setter};
pub use engine::{AttributeEngine, NodesAttributes, ProcessedAttributes, UpdateOptions};
pub use error::AttributeError;
pub use matrix::Matrix;
pub use node::{NodeId, NodeRef, NodeTree};
pub use registry::AttributeRegistry;
pub use scene::{NodeSpec, Scene, SceneDocument, SceneNode};
pub use value::{attr_map, AttrMap, AttrValue, SelectorAttrs};
