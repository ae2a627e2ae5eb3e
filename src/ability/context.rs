//! Evaluation contexts and payload contracts.
//!
//! Nodes never hold references back into their owning instance. Instead
//! the engine threads a context through every evaluation call:
//! [`ExecutionContext`] for running nodes (mutable access to ports,
//! blackboard, owner stats, event buffering) and [`EligibilityContext`]
//! for the side-effect-free entry predicates.
//!
//! [`EventContext`] and [`ResumeContext`] are the opaque payload
//! contracts: games define concrete event/resume types and nodes
//! downcast to the ones they understand.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::graph::{AbilityGraph, NodeArena, NodeId, NodeVariant, PortStore, PortValue};
use crate::stats::StatOwner;

use super::blackboard::Blackboard;

/// An opaque event payload.
///
/// Anything a game fires as an event implements this. Payloads must be
/// inspectable without mutation: eligibility checks may run any number
/// of times before one execution.
pub trait EventContext: Any + fmt::Debug {
    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

impl dyn EventContext {
    /// Check the concrete payload type.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete payload type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// External data resuming a paused node.
///
/// Must identify (to the paused node's satisfaction) what it is resuming
/// and carry whatever the node needs to continue, e.g. selected targets.
pub trait ResumeContext: Any + fmt::Debug {
    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

impl dyn ResumeContext {
    /// Check the concrete context type.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete context type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// Side effects collected while an instance runs.
///
/// Events a node enqueues are buffered here and flushed into the
/// system's event queue when the run returns control.
#[derive(Debug, Default)]
pub struct RunEffects {
    /// Events enqueued by node logic, in enqueue order.
    pub events: Vec<Rc<dyn EventContext>>,
}

impl RunEffects {
    /// Whether the run produced no side effects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Read-only context for entry-node eligibility predicates.
pub struct EligibilityContext<'a> {
    pub(crate) node: NodeId,
    pub(crate) blackboard: &'a Blackboard,
    pub(crate) owner: Option<&'a StatOwner>,
    pub(crate) user_data: Option<&'a dyn Any>,
}

impl<'a> EligibilityContext<'a> {
    /// The entry node being asked.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The instance's blackboard.
    #[must_use]
    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    /// The owning stat owner, when the instance is attached to one.
    #[must_use]
    pub fn owner(&self) -> Option<&StatOwner> {
        self.owner
    }

    /// Downcast the instance's user data.
    #[must_use]
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.and_then(<dyn Any>::downcast_ref)
    }
}

/// Mutable context threaded through node execution and evaluation.
///
/// Gives the running node its ports, blackboard, payload, owning stat
/// owner, and the engine services it may invoke: enqueueing follow-up
/// events and pushing nodes onto the traversal's pending stack.
pub struct ExecutionContext<'a> {
    pub(crate) graph: &'a AbilityGraph,
    pub(crate) node: NodeId,
    pub(crate) nodes: &'a mut NodeArena,
    pub(crate) ports: &'a mut PortStore,
    pub(crate) blackboard: &'a mut Blackboard,
    pub(crate) payload: Option<&'a dyn EventContext>,
    pub(crate) owner: Option<&'a mut StatOwner>,
    pub(crate) user_data: &'a mut Option<Box<dyn Any>>,
    pub(crate) events: &'a mut Vec<Rc<dyn EventContext>>,
    pub(crate) push_requests: &'a mut Vec<NodeId>,
}

impl<'a> ExecutionContext<'a> {
    /// The node currently evaluating.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Read an inport of the current node.
    ///
    /// Follows the port's single connection to the source outport. A
    /// value-node source is pull-evaluated first; process/entry sources
    /// read whatever their last evaluation cached. Unknown or
    /// unconnected ports, and evaluation cycles, read as
    /// [`PortValue::Missing`].
    pub fn read_inport(&mut self, name: &str) -> PortValue {
        let Some(inport) = self.graph.node(self.node).and_then(|node| node.inport(name)) else {
            tracing::warn!(node = %self.node, port = name, "read of undeclared inport");
            return PortValue::Missing;
        };
        let Some(source) = inport.source() else {
            return PortValue::Missing;
        };

        let source_variant = self.graph.node(source.node).map(|node| node.variant());
        if source_variant == Some(NodeVariant::Value) {
            if let Some(mut behavior) = self.nodes.take(source.node) {
                let mut child = ExecutionContext {
                    graph: self.graph,
                    node: source.node,
                    nodes: &mut *self.nodes,
                    ports: &mut *self.ports,
                    blackboard: &mut *self.blackboard,
                    payload: self.payload,
                    owner: self.owner.as_deref_mut(),
                    user_data: &mut *self.user_data,
                    events: &mut *self.events,
                    push_requests: &mut *self.push_requests,
                };
                behavior.evaluate(&mut child);
                self.nodes.put(source.node, behavior);
            } else {
                tracing::warn!(node = %source.node, "value node evaluation cycle, reading missing");
                return PortValue::Missing;
            }
        }

        self.ports.get(source.slot).clone()
    }

    /// Write an outport of the current node.
    ///
    /// Kind-checked against the declaration; mismatches and undeclared
    /// ports are logged and dropped.
    pub fn write_outport(&mut self, name: &str, value: impl Into<PortValue>) {
        let value = value.into();
        let Some(outport) = self.graph.node(self.node).and_then(|node| node.outport(name)) else {
            tracing::warn!(node = %self.node, port = name, "write to undeclared outport");
            return;
        };
        if outport.kind() != value.kind() {
            tracing::warn!(
                node = %self.node,
                port = name,
                "outport kind {:?} refuses value of kind {:?}",
                outport.kind(),
                value.kind(),
            );
            return;
        }
        if let Some(slot) = outport.slot() {
            self.ports.set(slot, value);
        }
    }

    /// The successor wired to the named flow outport of the current
    /// node, if any. Lets a node branch only when a successor is
    /// actually connected.
    #[must_use]
    pub fn flow_target(&self, port: &str) -> Option<NodeId> {
        self.graph.flow_target(self.node, port)
    }

    /// The raw event payload of this run, if any.
    #[must_use]
    pub fn payload_ref(&self) -> Option<&dyn EventContext> {
        self.payload
    }

    /// Downcast the event payload of this run.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.and_then(<dyn EventContext>::downcast_ref)
    }

    /// The instance's blackboard.
    #[must_use]
    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    /// Mutable access to the instance's blackboard.
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        self.blackboard
    }

    /// The owning stat owner, when the instance is attached to one.
    #[must_use]
    pub fn owner(&self) -> Option<&StatOwner> {
        self.owner.as_deref()
    }

    /// Mutable access to the owning stat owner (e.g. to append
    /// modifiers).
    pub fn owner_mut(&mut self) -> Option<&mut StatOwner> {
        self.owner.as_deref_mut()
    }

    /// Downcast the instance's user data.
    #[must_use]
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_deref().and_then(<dyn Any>::downcast_ref)
    }

    /// Mutable downcast of the instance's user data.
    pub fn user_data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.user_data.as_deref_mut().and_then(<dyn Any>::downcast_mut)
    }

    /// Enqueue a follow-up event.
    ///
    /// Buffered with the run and flushed into the ability system's event
    /// queue when the run returns control; cascades triggered by it
    /// resolve at a deeper queue level.
    pub fn enqueue_event(&mut self, event: impl EventContext) {
        self.events.push(Rc::new(event));
    }

    /// Push the current node onto the pending stack, so it runs again
    /// after the next advancement resolves.
    pub fn push_self(&mut self) {
        self.push_requests.push(self.node);
    }

    /// Push an arbitrary flow node onto the pending stack.
    pub fn push_node(&mut self, node: NodeId) {
        self.push_requests.push(node);
    }
}
