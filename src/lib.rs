//! # ability-flow
//!
//! A graph-driven execution engine for game abilities: skills, spells,
//! card effects. Each ability is a directed node graph; the engine runs
//! that graph against live game state, stat values, and asynchronous
//! player input.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded node types, events, or stats.
//!    Games register node factories, define event payloads, and declare
//!    their stat list at startup.
//!
//! 2. **Resumable**: Execution suspends at node boundaries to await
//!    external input (target selection, choices) and resumes later with
//!    a matching context.
//!
//! 3. **Deterministic Cascades**: Abilities triggered while an event is
//!    being processed drain at their own queue level before the outer
//!    level continues; activation order follows owner registration
//!    order and ability-list order, always.
//!
//! ## Architecture
//!
//! - **Shared templates, owned state**: a loaded graph is an immutable
//!   `Arc` template; each instance owns its node behaviors, port cache,
//!   blackboard, and cursor.
//!
//! - **Context threading**: nodes never hold back-pointers into the
//!   engine; everything they touch arrives through an execution context
//!   parameter.
//!
//! - **Cooperative single-threaded execution**: no node runs
//!   concurrently with another; misuse is logged and no-ops rather than
//!   unwinding through the game loop.
//!
//! ## Modules
//!
//! - `graph`: nodes, typed ports, connections, traversal cursor
//! - `ability`: ability instances, blackboard, lifecycle state machine
//! - `events`: cached-event queue and the nested activation runner
//! - `stats`: stat owners, modifiers, refresh pipeline
//! - `system`: the facade wiring it all together

pub mod ability;
pub mod events;
pub mod graph;
pub mod stats;
pub mod system;

// Re-export commonly used types
pub use crate::graph::{
    AbilityGraph, BlackboardVariable, ConnectionData, FlowState, GraphData, GraphError,
    NextMove, NodeBehavior, NodeData, NodeId, NodeRegistry, NodeVariant, PortKind, PortValue,
    FLOW_IN, FLOW_OUT,
};

pub use crate::ability::{
    AbilityId, AbilityInstance, AbilityState, Blackboard, EligibilityContext, EventContext,
    ExecutionContext, InstanceId, ResumeContext, RunEffects,
};

pub use crate::events::{AbilityEventQueue, AbilityRunner};

pub use crate::stats::{
    ModifierOp, OwnerId, Stat, StatDefinition, StatId, StatModifier, StatOwner,
    StatOwnerRepository, StatRefreshEvent,
};

pub use crate::system::{AbilitySystem, EventSubscriber};
