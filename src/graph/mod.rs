//! Node/port graph model and traversal.
//!
//! An ability is authored as a directed node graph. This module holds
//! the static side of that picture and the cursor that walks it:
//!
//! - [`AbilityGraph`]: the immutable template (nodes, resolved
//!   connections, entry list, blackboard defaults), built from a
//!   serialized [`GraphData`] description and shared between instances.
//! - [`NodeBehavior`]: the contract concrete node types implement, with
//!   [`NodeRegistry`] mapping kind strings to factories.
//! - Typed [`port`] values, with the `Missing` sentinel for absent data.
//! - [`GraphCursor`]: the per-instance traversal state (current flow
//!   node plus pending-push stack).
//!
//! The engine never interprets what a node does; games define node types
//! and the graphs wiring them together.

mod cursor;
mod data;
#[allow(clippy::module_inception)]
mod graph;
mod node;
mod port;
mod registry;

pub use cursor::GraphCursor;
pub use data::{BlackboardVariable, ConnectionData, GraphData, NodeData, PortData, PortRef};
pub use graph::{AbilityGraph, GraphError, GraphNode};
pub use node::{FlowState, NextMove, NodeArena, NodeBehavior, NodeId, NodeVariant, FLOW_IN, FLOW_OUT};
pub use port::{Inport, Outport, OutportRef, PortKind, PortStore, PortValue};
pub use registry::{NodeFactory, NodeRegistry};
