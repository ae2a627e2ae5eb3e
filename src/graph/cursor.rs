//! Traversal cursor over a graph's flow nodes.
//!
//! The cursor tracks the single "current" flow node plus a pending-push
//! stack. Pushing lets a node decide what runs immediately after it
//! without touching the graph's static `Next` relation; a pushed node
//! always wins over the `Next` target on the following
//! [`move_next`](GraphCursor::move_next).

use smallvec::SmallVec;

use super::graph::AbilityGraph;
use super::node::{NextMove, NodeArena, NodeId, FLOW_OUT};

/// Per-instance traversal state.
#[derive(Debug, Default)]
pub struct GraphCursor {
    current: Option<NodeId>,
    /// Entry index armed by `reset`, consumed by the first `move_next`.
    start: Option<usize>,
    pending: SmallVec<[NodeId; 4]>,
    exhausted: bool,
}

impl GraphCursor {
    /// Create a cursor with no position. Call
    /// [`reset`](GraphCursor::reset) before traversing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: None,
            start: None,
            pending: SmallVec::new(),
            exhausted: true,
        }
    }

    /// Position before the entry node at `start_index` in entry order
    /// and clear the pending stack. The first `move_next` yields that
    /// entry node.
    pub fn reset(&mut self, start_index: usize) {
        self.current = None;
        self.start = Some(start_index);
        self.pending.clear();
        self.exhausted = false;
    }

    /// The node the cursor currently rests on.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Place a flow node on the pending stack. Pushing a value node is a
    /// logged no-op.
    pub fn push(&mut self, graph: &AbilityGraph, node: NodeId) {
        let is_flow = graph.node(node).is_some_and(|n| n.variant().is_flow());
        if !is_flow {
            tracing::warn!(%node, "only flow nodes can be pushed, ignored");
            return;
        }
        self.pending.push(node);
    }

    /// Advance to the next flow node.
    ///
    /// A pending pushed node wins over the `Next` relation. Otherwise
    /// the current node's behavior picks a successor ([`NextMove`]),
    /// defaulting to the connection of its `next` flow outport. Returns
    /// `false` once traversal is exhausted; after that, only
    /// [`reset`](GraphCursor::reset) revives the cursor.
    pub fn move_next(&mut self, graph: &AbilityGraph, nodes: &NodeArena) -> bool {
        if let Some(node) = self.pending.pop() {
            self.current = Some(node);
            return true;
        }

        if self.exhausted {
            return false;
        }

        if let Some(start_index) = self.start.take() {
            match graph.entry_node_at(start_index) {
                Some(entry) => {
                    self.current = Some(entry);
                    return true;
                }
                None => {
                    tracing::warn!(start_index, "no entry node at start index, traversal empty");
                    self.exhaust();
                    return false;
                }
            }
        }

        let Some(current) = self.current else {
            self.exhaust();
            return false;
        };

        let choice = match nodes.get(current) {
            Some(behavior) => behavior.next(),
            None => NextMove::Follow,
        };
        let target = match &choice {
            NextMove::Follow => graph.flow_target(current, FLOW_OUT),
            NextMove::Branch(port) => graph.flow_target(current, port),
            NextMove::Stop => None,
        };

        match target {
            Some(next) => {
                self.current = Some(next);
                true
            }
            None => {
                self.exhaust();
                false
            }
        }
    }

    fn exhaust(&mut self) {
        self.current = None;
        self.exhausted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::data::{ConnectionData, GraphData, NodeData};
    use crate::graph::{NodeBehavior, NodeVariant, PortKind};

    struct Inert;
    impl NodeBehavior for Inert {}

    struct AltBrancher;
    impl NodeBehavior for AltBrancher {
        fn next(&self) -> NextMove {
            NextMove::Branch("alt".to_string())
        }
    }

    fn chain_graph() -> AbilityGraph {
        // 1 -> 2 -> 3
        AbilityGraph::from_data(GraphData {
            nodes: vec![
                NodeData::new(1, "A", NodeVariant::Entry).with_outport(FLOW_OUT, PortKind::Flow),
                NodeData::new(2, "B", NodeVariant::Process)
                    .with_inport("previous", PortKind::Flow)
                    .with_outport(FLOW_OUT, PortKind::Flow),
                NodeData::new(3, "C", NodeVariant::Process).with_inport("previous", PortKind::Flow),
            ],
            connections: vec![
                ConnectionData::new(1, FLOW_OUT, 2, "previous"),
                ConnectionData::new(2, FLOW_OUT, 3, "previous"),
            ],
            blackboard: vec![],
        })
        .unwrap()
    }

    fn arena_for(graph: &AbilityGraph) -> NodeArena {
        let mut arena = NodeArena::new();
        for node in graph.nodes() {
            arena.insert(node.id(), Box::new(Inert));
        }
        arena
    }

    #[test]
    fn test_walks_chain_then_exhausts() {
        let graph = chain_graph();
        let arena = arena_for(&graph);
        let mut cursor = GraphCursor::new();
        cursor.reset(0);

        let mut visited = Vec::new();
        while cursor.move_next(&graph, &arena) {
            visited.push(cursor.current().unwrap().raw());
        }

        assert_eq!(visited, vec![1, 2, 3]);
        // Exhausted stays exhausted without a reset.
        assert!(!cursor.move_next(&graph, &arena));
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn test_reset_revives_traversal() {
        let graph = chain_graph();
        let arena = arena_for(&graph);
        let mut cursor = GraphCursor::new();
        cursor.reset(0);
        while cursor.move_next(&graph, &arena) {}

        cursor.reset(0);
        assert!(cursor.move_next(&graph, &arena));
        assert_eq!(cursor.current(), Some(NodeId::new(1)));
    }

    #[test]
    fn test_branch_choice_routes_through_named_outport() {
        // 1 -next-> 2, 1 -alt-> 3
        let graph = AbilityGraph::from_data(GraphData {
            nodes: vec![
                NodeData::new(1, "A", NodeVariant::Entry)
                    .with_outport(FLOW_OUT, PortKind::Flow)
                    .with_outport("alt", PortKind::Flow),
                NodeData::new(2, "B", NodeVariant::Process)
                    .with_inport("previous", PortKind::Flow),
                NodeData::new(3, "C", NodeVariant::Process)
                    .with_inport("previous", PortKind::Flow),
            ],
            connections: vec![
                ConnectionData::new(1, FLOW_OUT, 2, "previous"),
                ConnectionData::new(1, "alt", 3, "previous"),
            ],
            blackboard: vec![],
        })
        .unwrap();

        let mut arena = NodeArena::new();
        arena.insert(NodeId::new(1), Box::new(AltBrancher));
        arena.insert(NodeId::new(2), Box::new(Inert));
        arena.insert(NodeId::new(3), Box::new(Inert));

        let mut cursor = GraphCursor::new();
        cursor.reset(0);
        assert!(cursor.move_next(&graph, &arena)); // at 1, pending stack empty

        // The behavior's choice routes through "alt", not the default
        // next outport.
        assert!(cursor.move_next(&graph, &arena));
        assert_eq!(cursor.current(), Some(NodeId::new(3)));

        assert!(!cursor.move_next(&graph, &arena));
    }

    #[test]
    fn test_branch_to_unwired_outport_exhausts() {
        // Node 1 declares no "alt" outport at all.
        let graph = chain_graph();
        let mut arena = arena_for(&graph);
        arena.insert(NodeId::new(1), Box::new(AltBrancher));

        let mut cursor = GraphCursor::new();
        cursor.reset(0);
        assert!(cursor.move_next(&graph, &arena)); // at 1

        assert!(!cursor.move_next(&graph, &arena));
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn test_pushed_node_wins_over_next() {
        let graph = chain_graph();
        let arena = arena_for(&graph);
        let mut cursor = GraphCursor::new();
        cursor.reset(0);

        assert!(cursor.move_next(&graph, &arena)); // at 1
        cursor.push(&graph, NodeId::new(3));

        // Next relation says 2, but the pushed node wins.
        assert!(cursor.move_next(&graph, &arena));
        assert_eq!(cursor.current(), Some(NodeId::new(3)));
    }

    #[test]
    fn test_push_rejects_value_nodes() {
        let graph = AbilityGraph::from_data(GraphData {
            nodes: vec![
                NodeData::new(1, "A", NodeVariant::Entry),
                NodeData::new(2, "V", NodeVariant::Value),
            ],
            connections: vec![],
            blackboard: vec![],
        })
        .unwrap();
        let arena = arena_for(&graph);
        let mut cursor = GraphCursor::new();
        cursor.reset(0);
        assert!(cursor.move_next(&graph, &arena)); // at 1

        cursor.push(&graph, NodeId::new(2));
        // The rejected push leaves only the exhausted Next relation.
        assert!(!cursor.move_next(&graph, &arena));
    }

    #[test]
    fn test_missing_start_index_is_empty_traversal() {
        let graph = chain_graph();
        let arena = arena_for(&graph);
        let mut cursor = GraphCursor::new();
        cursor.reset(5);
        assert!(!cursor.move_next(&graph, &arena));
    }
}
