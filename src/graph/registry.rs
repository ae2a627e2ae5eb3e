//! Node factory registry.
//!
//! The engine instantiates one [`NodeBehavior`] per node per ability
//! instance. Games register a factory for every node kind they author
//! graphs with; a kind with no factory instantiates as the built-in
//! missing-node placeholder, which refuses eligibility and aborts
//! execution.
//!
//! ## Example
//!
//! ```
//! use ability_flow::graph::{NodeBehavior, NodeRegistry};
//!
//! struct Noop;
//! impl NodeBehavior for Noop {}
//!
//! let mut registry = NodeRegistry::new();
//! registry.register("Noop", |_node| Box::new(Noop));
//! ```

use rustc_hash::FxHashMap;

use super::graph::GraphNode;
use super::node::{MissingNode, NodeBehavior};

/// Factory closure building a behavior from its node declaration.
pub type NodeFactory = Box<dyn Fn(&GraphNode) -> Box<dyn NodeBehavior>>;

/// Registry of node behavior factories, keyed by kind string.
#[derive(Default)]
pub struct NodeRegistry {
    factories: FxHashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a node kind. A later registration for the
    /// same kind replaces the earlier one.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&GraphNode) -> Box<dyn NodeBehavior> + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    /// Check if a kind has a registered factory.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Build the behavior for a node. Unregistered kinds get the
    /// missing-node placeholder, with a diagnostic.
    #[must_use]
    pub fn instantiate(&self, node: &GraphNode) -> Box<dyn NodeBehavior> {
        match self.factories.get(node.kind()) {
            Some(factory) => factory(node),
            None => {
                tracing::warn!(node = %node.id(), kind = node.kind(), "no factory for node kind, using placeholder");
                Box::new(MissingNode::new(node.kind()))
            }
        }
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("kinds", &self.factories.len())
            .finish()
    }
}
