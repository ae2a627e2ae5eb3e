//! Ability instances: one stateful execution of an ability graph.
//!
//! An instance pairs a shared, immutable graph template with everything
//! one run needs to mutate: its own node behaviors, outport value cache,
//! blackboard, traversal cursor, payload, and lifecycle state. Instances
//! live in their owner's ability list; the ability system creates them
//! from the loaded-graph table.
//!
//! ## Misuse policy
//!
//! Illegal calls (execute while running or paused, resume while not
//! paused, a resume context the paused node rejects) are logged and
//! leave the instance untouched, so a caller can correct the
//! precondition and retry.

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::{
    AbilityGraph, GraphCursor, FlowState, NodeArena, NodeId, NodeRegistry, PortStore, PortValue,
};
use crate::stats::{OwnerId, StatOwner};

use super::blackboard::Blackboard;
use super::context::{EligibilityContext, EventContext, ExecutionContext, ResumeContext, RunEffects};
use super::state::AbilityState;

/// Identifier of a loaded ability graph template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(pub u32);

impl AbilityId {
    /// Create a new ability ID.
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

impl std::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ability({})", self.0)
    }
}

/// System-unique identity of one ability instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl InstanceId {
    /// Create a new instance ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.0)
    }
}

/// One stateful execution of an ability for a specific owner.
pub struct AbilityInstance {
    ability_id: AbilityId,
    instance_id: InstanceId,
    owner: Option<OwnerId>,
    graph: Arc<AbilityGraph>,
    nodes: NodeArena,
    ports: PortStore,
    blackboard: Blackboard,
    cursor: GraphCursor,
    payload: Option<Rc<dyn EventContext>>,
    state: AbilityState,
    user_data: Option<Box<dyn Any>>,
}

impl AbilityInstance {
    /// Build an instance over a shared graph template, instantiating one
    /// behavior per node through the registry.
    #[must_use]
    pub fn new(
        ability_id: AbilityId,
        instance_id: InstanceId,
        graph: Arc<AbilityGraph>,
        registry: &NodeRegistry,
    ) -> Self {
        let mut nodes = NodeArena::new();
        for node in graph.nodes() {
            nodes.insert(node.id(), registry.instantiate(node));
        }
        let ports = PortStore::new(graph.slot_count());
        let blackboard = Blackboard::from_defaults(graph.blackboard_variables());

        Self {
            ability_id,
            instance_id,
            owner: None,
            graph,
            nodes,
            ports,
            blackboard,
            cursor: GraphCursor::new(),
            payload: None,
            state: AbilityState::Clean,
            user_data: None,
        }
    }

    /// The ability this instance was created from.
    #[must_use]
    pub fn ability_id(&self) -> AbilityId {
        self.ability_id
    }

    /// System-unique identity of this instance.
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// The stat owner this instance is attached to, if any.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<OwnerId>) {
        self.owner = owner;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AbilityState {
        self.state
    }

    /// The shared graph template.
    #[must_use]
    pub fn graph(&self) -> &AbilityGraph {
        &self.graph
    }

    /// Set (or clear) the event payload for the next execution.
    pub fn set_payload(&mut self, payload: Option<Rc<dyn EventContext>>) {
        self.payload = payload;
    }

    /// The current event payload.
    #[must_use]
    pub fn payload(&self) -> Option<&dyn EventContext> {
        self.payload.as_deref()
    }

    /// Attach opaque per-instance data that nodes may downcast.
    pub fn set_user_data(&mut self, data: Box<dyn Any>) {
        self.user_data = Some(data);
    }

    /// Downcast the attached user data.
    #[must_use]
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_deref().and_then(<dyn Any>::downcast_ref)
    }

    /// Read a blackboard variable (unknown keys read as 0, logged).
    #[must_use]
    pub fn blackboard_value(&self, key: &str) -> i64 {
        self.blackboard.get(key)
    }

    /// Override a declared blackboard variable (unknown keys are logged
    /// no-ops).
    pub fn override_blackboard(&mut self, key: &str, value: i64) {
        self.blackboard.set(key, value);
    }

    /// The instance's blackboard.
    #[must_use]
    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Inspect the cached value of an outport after a run.
    #[must_use]
    pub fn outport_value(&self, node: NodeId, port: &str) -> PortValue {
        let Some(outport) = self.graph.node(node).and_then(|n| n.outport(port)) else {
            return PortValue::Missing;
        };
        match outport.slot() {
            Some(slot) => self.ports.get(slot).clone(),
            None => PortValue::Missing,
        }
    }

    /// Ask the graph's first entry node whether `payload` is eligible.
    ///
    /// False when the graph has no entry node. Repeatable without side
    /// effects; the runner calls this as a filter before enqueueing.
    #[must_use]
    pub fn can_execute(
        &self,
        payload: Option<&dyn EventContext>,
        owner: Option<&StatOwner>,
    ) -> bool {
        let Some(&entry) = self.graph.entry_nodes().first() else {
            return false;
        };
        let Some(behavior) = self.nodes.get(entry) else {
            return false;
        };
        let ctx = EligibilityContext {
            node: entry,
            blackboard: &self.blackboard,
            owner,
            user_data: self.user_data.as_deref(),
        };
        behavior.can_execute(&ctx, payload)
    }

    /// Execute the graph from its first entry node against the stored
    /// payload.
    ///
    /// Illegal from `Running`/`Pause` (logged no-op), and a no-op when
    /// the payload fails the entry condition. Returns the side effects
    /// the run produced; the caller is responsible for feeding them to
    /// the event queue.
    #[must_use = "run effects must be flushed into the event queue"]
    pub fn execute(&mut self, mut owner: Option<&mut StatOwner>) -> RunEffects {
        let mut effects = RunEffects::default();

        if !self.state.can_start() {
            tracing::error!(
                instance = %self.instance_id,
                state = ?self.state,
                "cannot execute an unfinished ability instance",
            );
            return effects;
        }
        if !self.can_execute(self.payload.as_deref(), owner.as_deref()) {
            tracing::error!(
                instance = %self.instance_id,
                "payload does not match the entry condition; call can_execute first",
            );
            return effects;
        }

        self.begin_run();
        self.iterate_graph(&mut owner, &mut effects);
        effects
    }

    /// Resume a paused instance with external data.
    ///
    /// Illegal unless paused; the paused node's `check_resume` gates the
    /// context (a mismatch is logged and leaves the pause untouched).
    #[must_use = "run effects must be flushed into the event queue"]
    pub fn resume(
        &mut self,
        resume: &dyn ResumeContext,
        mut owner: Option<&mut StatOwner>,
    ) -> RunEffects {
        let mut effects = RunEffects::default();

        if self.state != AbilityState::Pause {
            tracing::error!(
                instance = %self.instance_id,
                state = ?self.state,
                "cannot resume an unpaused ability instance",
            );
            return effects;
        }
        let Some(node) = self.cursor.current() else {
            tracing::error!(instance = %self.instance_id, "paused instance lost its current node");
            return effects;
        };
        let accepted = self
            .nodes
            .get(node)
            .is_some_and(|behavior| behavior.check_resume(resume));
        if !accepted {
            tracing::error!(
                instance = %self.instance_id,
                %node,
                "resume context rejected by the paused node",
            );
            return effects;
        }

        self.state = self.resume_node(node, resume, &mut owner, &mut effects);
        if self.state == AbilityState::Running {
            self.iterate_graph(&mut owner, &mut effects);
        }
        effects
    }

    /// Force the instance back to a fresh state: cursor to start, state
    /// `Clean`, payload cleared, blackboard restored to graph defaults.
    pub fn reset(&mut self) {
        self.begin_run();
        self.state = AbilityState::Clean;
        self.payload = None;
        self.blackboard.reset(self.graph.blackboard_variables());
    }

    /// Rewind traversal state without touching payload or blackboard.
    fn begin_run(&mut self) {
        self.cursor.reset(0);
        self.ports.clear();
        self.nodes.reset_all();
    }

    fn iterate_graph(&mut self, owner: &mut Option<&mut StatOwner>, effects: &mut RunEffects) {
        while self.cursor.move_next(&self.graph, &self.nodes) {
            let Some(node) = self.cursor.current() else {
                break;
            };
            self.state = self.run_node(node, owner, effects);
            if self.state != AbilityState::Running {
                return;
            }
        }
        self.state = AbilityState::Done;
    }

    fn run_node(
        &mut self,
        node: NodeId,
        owner: &mut Option<&mut StatOwner>,
        effects: &mut RunEffects,
    ) -> AbilityState {
        let Some(mut behavior) = self.nodes.take(node) else {
            tracing::error!(instance = %self.instance_id, %node, "node behavior unavailable, aborting");
            return AbilityState::Abort;
        };

        let mut push_requests = Vec::new();
        let flow = {
            let mut ctx = ExecutionContext {
                graph: &self.graph,
                node,
                nodes: &mut self.nodes,
                ports: &mut self.ports,
                blackboard: &mut self.blackboard,
                payload: self.payload.as_deref(),
                owner: owner.as_deref_mut(),
                user_data: &mut self.user_data,
                events: &mut effects.events,
                push_requests: &mut push_requests,
            };
            behavior.on_execute(&mut ctx)
        };
        self.nodes.put(node, behavior);
        self.apply_pushes(push_requests);

        Self::adopt(flow)
    }

    fn resume_node(
        &mut self,
        node: NodeId,
        resume: &dyn ResumeContext,
        owner: &mut Option<&mut StatOwner>,
        effects: &mut RunEffects,
    ) -> AbilityState {
        let Some(mut behavior) = self.nodes.take(node) else {
            tracing::error!(instance = %self.instance_id, %node, "node behavior unavailable, aborting");
            return AbilityState::Abort;
        };

        let mut push_requests = Vec::new();
        let flow = {
            let mut ctx = ExecutionContext {
                graph: &self.graph,
                node,
                nodes: &mut self.nodes,
                ports: &mut self.ports,
                blackboard: &mut self.blackboard,
                payload: self.payload.as_deref(),
                owner: owner.as_deref_mut(),
                user_data: &mut self.user_data,
                events: &mut effects.events,
                push_requests: &mut push_requests,
            };
            behavior.resume(&mut ctx, resume)
        };
        self.nodes.put(node, behavior);
        self.apply_pushes(push_requests);

        Self::adopt(flow)
    }

    fn apply_pushes(&mut self, requests: Vec<NodeId>) {
        for node in requests {
            self.cursor.push(&self.graph, node);
        }
    }

    fn adopt(flow: FlowState) -> AbilityState {
        match flow {
            FlowState::Success => AbilityState::Running,
            FlowState::Pause => AbilityState::Pause,
            FlowState::Abort => AbilityState::Abort,
        }
    }
}

impl std::fmt::Debug for AbilityInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityInstance")
            .field("ability_id", &self.ability_id)
            .field("instance_id", &self.instance_id)
            .field("owner", &self.owner)
            .field("state", &self.state)
            .finish()
    }
}
