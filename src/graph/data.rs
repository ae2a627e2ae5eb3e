//! Serialized graph descriptions.
//!
//! A graph is persisted as a structural description: nodes with their
//! ports, connections between ports, and blackboard variable defaults.
//! The exact authoring pipeline is out of scope; the engine accepts the
//! JSON form below (or [`GraphData`] built in code) and compiles it into
//! an [`AbilityGraph`](super::AbilityGraph).
//!
//! ```json
//! {
//!   "nodes": [
//!     {"id": 1, "kind": "PlayCard", "variant": "Entry",
//!      "outports": [{"name": "next", "kind": "Flow"}]},
//!     {"id": 2, "kind": "Heal", "variant": "Process",
//!      "inports": [{"name": "previous", "kind": "Flow"},
//!                  {"name": "value", "kind": "Int"}]}
//!   ],
//!   "connections": [
//!     {"from": {"node": 1, "port": "next"}, "to": {"node": 2, "port": "previous"}}
//!   ],
//!   "blackboard": [{"key": "cost", "value": 2}]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{NodeVariant, PortKind};

/// A declared blackboard variable: key and initial integer value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackboardVariable {
    /// Unique key within the graph.
    pub key: String,
    /// Initial value seeded into every instance.
    pub value: i64,
}

impl BlackboardVariable {
    /// Create a new variable declaration.
    pub fn new(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A port declaration on a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortData {
    /// Port name, unique per direction within the node.
    pub name: String,
    /// Port kind.
    pub kind: PortKind,
}

impl PortData {
    /// Create a new port declaration.
    pub fn new(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One end of a connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRef {
    /// Declared node id.
    pub node: u32,
    /// Port name on that node.
    pub port: String,
}

/// A directed connection from an outport to an inport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    /// Source outport.
    pub from: PortRef,
    /// Destination inport.
    pub to: PortRef,
}

impl ConnectionData {
    /// Create a connection between two named ports.
    pub fn new(from_node: u32, from_port: impl Into<String>, to_node: u32, to_port: impl Into<String>) -> Self {
        Self {
            from: PortRef {
                node: from_node,
                port: from_port.into(),
            },
            to: PortRef {
                node: to_node,
                port: to_port.into(),
            },
        }
    }
}

/// A node declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Graph-unique node id.
    pub id: u32,
    /// Factory key resolved through the node registry.
    pub kind: String,
    /// Node variant.
    pub variant: NodeVariant,
    /// Input port declarations.
    #[serde(default)]
    pub inports: Vec<PortData>,
    /// Output port declarations.
    #[serde(default)]
    pub outports: Vec<PortData>,
    /// Opaque parameters handed to the node factory.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl NodeData {
    /// Create a node declaration with no ports.
    pub fn new(id: u32, kind: impl Into<String>, variant: NodeVariant) -> Self {
        Self {
            id,
            kind: kind.into(),
            variant,
            inports: Vec::new(),
            outports: Vec::new(),
            params: serde_json::Value::Null,
        }
    }

    /// Add an inport (builder pattern).
    #[must_use]
    pub fn with_inport(mut self, name: impl Into<String>, kind: PortKind) -> Self {
        self.inports.push(PortData::new(name, kind));
        self
    }

    /// Add an outport (builder pattern).
    #[must_use]
    pub fn with_outport(mut self, name: impl Into<String>, kind: PortKind) -> Self {
        self.outports.push(PortData::new(name, kind));
        self
    }

    /// Set the factory parameters (builder pattern).
    #[must_use]
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }
}

/// A complete serialized graph.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    /// Node declarations, in authoring order.
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    /// Connections between declared ports.
    #[serde(default)]
    pub connections: Vec<ConnectionData>,
    /// Blackboard variable defaults.
    #[serde(default)]
    pub blackboard: Vec<BlackboardVariable>,
}
