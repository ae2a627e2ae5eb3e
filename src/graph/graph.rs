//! The compiled ability graph.
//!
//! An [`AbilityGraph`] is the immutable template built from a serialized
//! [`GraphData`] description: the node set, resolved connections, the
//! entry-node list, and the blackboard defaults. Graphs are shared
//! (`Arc`) between every instance of the same ability; all per-run state
//! lives with the instance.
//!
//! ## Validation policy
//!
//! Structural corruption (unparseable source, duplicate node ids) is a
//! hard [`GraphError`]. Bad connections degrade instead of failing the
//! load: a connection naming an unknown node or port, mismatching kinds,
//! or doubling up on an already-connected value inport is logged and
//! dropped, leaving the inport unconnected so reads yield the `Missing`
//! sentinel.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use super::data::{GraphData, NodeData};
use super::node::{NodeId, NodeVariant};
use super::port::{Inport, Outport, OutportRef, PortKind};
use super::BlackboardVariable;

/// Errors building a graph from its serialized description.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The source text was not a valid graph description.
    #[error("failed to parse graph source: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two node declarations share an id.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
}

/// A compiled node: declaration plus resolved connection data.
#[derive(Clone, Debug)]
pub struct GraphNode {
    id: NodeId,
    kind: String,
    variant: NodeVariant,
    inports: SmallVec<[Inport; 4]>,
    outports: SmallVec<[Outport; 4]>,
    /// Resolved `Next` relation: flow outport name to successor node.
    flow_targets: SmallVec<[(String, NodeId); 2]>,
    params: serde_json::Value,
}

impl GraphNode {
    /// Node id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Factory kind string.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Node variant.
    #[must_use]
    pub fn variant(&self) -> NodeVariant {
        self.variant
    }

    /// Opaque factory parameters from the graph source.
    #[must_use]
    pub fn params(&self) -> &serde_json::Value {
        &self.params
    }

    /// Find an inport by name.
    #[must_use]
    pub fn inport(&self, name: &str) -> Option<&Inport> {
        self.inports.iter().find(|port| port.name == name)
    }

    /// Find an outport by name.
    #[must_use]
    pub fn outport(&self, name: &str) -> Option<&Outport> {
        self.outports.iter().find(|port| port.name == name)
    }

    /// The successor reached through the named flow outport.
    #[must_use]
    pub fn flow_target(&self, port: &str) -> Option<NodeId> {
        self.flow_targets
            .iter()
            .find(|(name, _)| name == port)
            .map(|&(_, node)| node)
    }

    fn inport_mut(&mut self, name: &str) -> Option<&mut Inport> {
        self.inports.iter_mut().find(|port| port.name == name)
    }
}

/// An immutable ability graph template.
#[derive(Debug, Default)]
pub struct AbilityGraph {
    nodes: Vec<GraphNode>,
    index: FxHashMap<NodeId, usize>,
    entry_nodes: Vec<NodeId>,
    blackboard: Vec<BlackboardVariable>,
    slot_count: usize,
}

impl AbilityGraph {
    /// Build a graph from JSON source text.
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        let data: GraphData = serde_json::from_str(source)?;
        Self::from_data(data)
    }

    /// Build a graph from an in-memory description.
    pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
        let mut graph = AbilityGraph::default();

        for node_data in data.nodes {
            graph.add_node(node_data)?;
        }

        for connection in data.connections {
            graph.connect(
                NodeId::new(connection.from.node),
                &connection.from.port,
                NodeId::new(connection.to.node),
                &connection.to.port,
            );
        }

        graph.entry_nodes = graph
            .nodes
            .iter()
            .filter(|node| node.variant == NodeVariant::Entry)
            .map(GraphNode::id)
            .collect();
        graph.blackboard = data.blackboard;

        Ok(graph)
    }

    fn add_node(&mut self, data: NodeData) -> Result<(), GraphError> {
        let id = NodeId::new(data.id);
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        let inports = data
            .inports
            .into_iter()
            .map(|port| Inport {
                name: port.name,
                kind: port.kind,
                source: None,
            })
            .collect();

        let outports = data
            .outports
            .into_iter()
            .map(|port| {
                let slot = port.kind.carries_value().then(|| {
                    let slot = self.slot_count;
                    self.slot_count += 1;
                    slot
                });
                Outport {
                    name: port.name,
                    kind: port.kind,
                    slot,
                }
            })
            .collect();

        self.index.insert(id, self.nodes.len());
        self.nodes.push(GraphNode {
            id,
            kind: data.kind,
            variant: data.variant,
            inports,
            outports,
            flow_targets: SmallVec::new(),
            params: data.params,
        });
        Ok(())
    }

    /// Resolve one connection; invalid connections are logged and
    /// dropped.
    fn connect(&mut self, from_node: NodeId, from_port: &str, to_node: NodeId, to_port: &str) {
        let Some(&from_index) = self.index.get(&from_node) else {
            tracing::warn!(%from_node, "connection from unknown node, dropped");
            return;
        };
        let Some(&to_index) = self.index.get(&to_node) else {
            tracing::warn!(%to_node, "connection to unknown node, dropped");
            return;
        };

        let Some(outport) = self.nodes[from_index].outport(from_port) else {
            tracing::warn!(%from_node, port = from_port, "connection from unknown outport, dropped");
            return;
        };
        let Some(inport) = self.nodes[to_index].inport(to_port) else {
            tracing::warn!(%to_node, port = to_port, "connection to unknown inport, dropped");
            return;
        };

        if !outport.kind.can_connect(inport.kind) {
            tracing::warn!(
                %from_node,
                from_port,
                %to_node,
                to_port,
                "incompatible port kinds {:?} -> {:?}, connection dropped",
                outport.kind,
                inport.kind,
            );
            return;
        }

        if outport.kind == PortKind::Flow {
            // The Next relation: one successor per named flow outport.
            if self.nodes[from_index].flow_target(from_port).is_some() {
                tracing::warn!(%from_node, port = from_port, "flow outport already connected, keeping first");
                return;
            }
            if !self.nodes[to_index].variant.is_flow() {
                tracing::warn!(%to_node, "flow connection into a non-flow node, dropped");
                return;
            }
            self.nodes[from_index]
                .flow_targets
                .push((from_port.to_string(), to_node));
        } else {
            let slot = outport.slot.expect("value outports always carry a slot");
            let inport = self.nodes[to_index]
                .inport_mut(to_port)
                .expect("looked up above");
            if inport.source.is_some() {
                tracing::warn!(%to_node, port = to_port, "inport already connected, keeping first");
                return;
            }
            inport.source = Some(OutportRef {
                node: from_node,
                slot,
            });
        }
    }

    /// All nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.index.get(&id).map(|&index| &self.nodes[index])
    }

    /// Entry nodes in declaration order.
    #[must_use]
    pub fn entry_nodes(&self) -> &[NodeId] {
        &self.entry_nodes
    }

    /// The entry node at `index` in entry order.
    #[must_use]
    pub fn entry_node_at(&self, index: usize) -> Option<NodeId> {
        self.entry_nodes.get(index).copied()
    }

    /// Declared blackboard defaults.
    #[must_use]
    pub fn blackboard_variables(&self) -> &[BlackboardVariable] {
        &self.blackboard
    }

    /// Number of value slots an instance's port store needs.
    #[must_use]
    pub(crate) fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// The successor of `node` through the named flow outport.
    #[must_use]
    pub fn flow_target(&self, node: NodeId, port: &str) -> Option<NodeId> {
        self.node(node).and_then(|node| node.flow_target(port))
    }
}
