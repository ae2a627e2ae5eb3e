//! Graph nodes and the node behavior contract.
//!
//! The engine knows nothing about what nodes *do*. A graph stores
//! [`GraphNode`] descriptions (kind, variant, ports, params); the game
//! registers a factory per kind string in a
//! [`NodeRegistry`](super::NodeRegistry), and each ability instance gets
//! its own boxed [`NodeBehavior`] per node. Per-run mutable node state
//! therefore lives with the instance, never in the shared graph
//! template.
//!
//! ## Variants
//!
//! - `Entry`: flow node with an eligibility predicate over the event
//!   payload; the traversal start point.
//! - `Process`: flow node executed when the cursor reaches it.
//! - `Value`: pull-evaluated on demand when a downstream inport reads;
//!   has no position in the flow chain.

use serde::{Deserialize, Serialize};

use crate::ability::{EligibilityContext, EventContext, ExecutionContext, ResumeContext};

/// Name of the conventional flow outport that defines the `Next`
/// relation of a flow node.
pub const FLOW_OUT: &str = "next";

/// Name of the conventional flow inport targeted by `Next` connections.
pub const FLOW_IN: &str = "previous";

/// Identifier of a node within one graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Node variant. Entry and Process nodes are flow nodes; Value nodes are
/// pull-evaluated and never entered by the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeVariant {
    /// Flow node with an eligibility predicate; traversal start point.
    Entry,
    /// Flow node executed in chain order.
    Process,
    /// Pull-evaluated data node.
    Value,
}

impl NodeVariant {
    /// Whether nodes of this variant participate in the flow chain.
    #[must_use]
    pub fn is_flow(self) -> bool {
        matches!(self, NodeVariant::Entry | NodeVariant::Process)
    }
}

/// Result of running or resuming one flow node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    /// Node finished; traversal continues.
    Success,
    /// Node suspended awaiting an external resume context.
    Pause,
    /// Node failed; the run aborts.
    Abort,
}

/// How a flow node chooses its successor.
///
/// Consulted by the cursor when following the `Next` relation; lets a
/// node branch on internal per-run state (e.g. take a "selection"
/// successor once, then its normal successor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextMove {
    /// Follow the connection of the conventional [`FLOW_OUT`] outport.
    Follow,
    /// Follow the connection of the named flow outport instead.
    Branch(String),
    /// No successor; traversal is exhausted here.
    Stop,
}

/// The contract between the engine and concrete node types.
///
/// One boxed behavior exists per node per ability instance; everything a
/// behavior touches during evaluation arrives through the context
/// argument, so implementations hold only their own per-run state.
///
/// Only the methods relevant to a node's variant need overriding: entry
/// nodes implement [`can_execute`](NodeBehavior::can_execute), value
/// nodes implement [`evaluate`](NodeBehavior::evaluate), pausing nodes
/// implement [`check_resume`](NodeBehavior::check_resume) and
/// [`resume`](NodeBehavior::resume).
pub trait NodeBehavior {
    /// Run this flow node. Default: succeed without doing anything.
    fn on_execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> FlowState {
        FlowState::Success
    }

    /// Eligibility predicate for entry nodes.
    ///
    /// Must be side-effect free: the engine calls this any number of
    /// times before a single execution. Non-entry nodes keep the
    /// default.
    fn can_execute(&self, _ctx: &EligibilityContext<'_>, _payload: Option<&dyn EventContext>) -> bool {
        false
    }

    /// Whether `resume` would accept this context. Called while the node
    /// is paused; a `false` leaves the pause untouched.
    fn check_resume(&self, _resume: &dyn ResumeContext) -> bool {
        false
    }

    /// Continue a paused node with external data.
    fn resume(&mut self, _ctx: &mut ExecutionContext<'_>, _resume: &dyn ResumeContext) -> FlowState {
        FlowState::Abort
    }

    /// Compute this value node's outports. Pull-evaluated on demand when
    /// a downstream inport reads.
    fn evaluate(&mut self, _ctx: &mut ExecutionContext<'_>) {}

    /// Choose the successor for the `Next` relation.
    fn next(&self) -> NextMove {
        NextMove::Follow
    }

    /// Restore internal per-run state before a fresh execution.
    fn reset(&mut self) {}
}

/// Placeholder behavior for node kinds with no registered factory.
///
/// Mirrors the engine's missing-port policy: refuses eligibility and
/// aborts on execution, with a diagnostic naming the kind.
pub(crate) struct MissingNode {
    kind: String,
}

impl MissingNode {
    pub(crate) fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl NodeBehavior for MissingNode {
    fn on_execute(&mut self, _ctx: &mut ExecutionContext<'_>) -> FlowState {
        tracing::error!(kind = %self.kind, "executed node with no registered behavior, aborting run");
        FlowState::Abort
    }
}

/// Per-instance arena of node behaviors.
///
/// Slots are taken out while their node evaluates, which both satisfies
/// the borrow checker during nested pull-evaluation and detects
/// evaluation cycles: a slot that is already empty when taken again is a
/// cycle.
pub struct NodeArena {
    slots: rustc_hash::FxHashMap<NodeId, Option<Box<dyn NodeBehavior>>>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self {
            slots: rustc_hash::FxHashMap::default(),
        }
    }

    pub(crate) fn insert(&mut self, node: NodeId, behavior: Box<dyn NodeBehavior>) {
        self.slots.insert(node, Some(behavior));
    }

    /// Borrow a behavior without taking it. `None` while the node is
    /// mid-evaluation.
    pub(crate) fn get(&self, node: NodeId) -> Option<&dyn NodeBehavior> {
        self.slots.get(&node).and_then(|slot| slot.as_deref())
    }

    /// Take a behavior out for evaluation. `None` if the node is unknown
    /// or already mid-evaluation.
    pub(crate) fn take(&mut self, node: NodeId) -> Option<Box<dyn NodeBehavior>> {
        self.slots.get_mut(&node).and_then(Option::take)
    }

    /// Return a behavior taken with [`take`](Self::take).
    pub(crate) fn put(&mut self, node: NodeId, behavior: Box<dyn NodeBehavior>) {
        self.slots.insert(node, Some(behavior));
    }

    pub(crate) fn reset_all(&mut self) {
        for slot in self.slots.values_mut() {
            if let Some(behavior) = slot {
                behavior.reset();
            }
        }
    }
}

impl std::fmt::Debug for NodeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeArena")
            .field("nodes", &self.slots.len())
            .finish()
    }
}
