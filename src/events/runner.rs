//! The nested activation runner.
//!
//! Pending ability activations are held as a stack of FIFO queues, one
//! level per nesting depth of cascaded triggering. Events resolved while
//! draining one level enqueue their activations into a *new* level,
//! which is fully drained before the outer level continues. Within one
//! level, activations run strictly FIFO.
//!
//! The runner is bookkeeping only: the ability system owns the drain
//! loop, because executing an activation needs the owner repository and
//! the event queue.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::ability::{EventContext, InstanceId};

/// One pending activation: which instance, fired by which event.
pub(crate) struct QueuedActivation {
    pub instance: InstanceId,
    pub event: Rc<dyn EventContext>,
}

/// Stack of FIFO activation queues, one level per cascade depth.
///
/// At least one (base) level always exists. At most one instance can be
/// paused at a time; while it is, the drain loop is frozen until a
/// matching resume arrives.
pub struct AbilityRunner {
    levels: Vec<VecDeque<QueuedActivation>>,
    paused: Option<InstanceId>,
}

impl Default for AbilityRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl AbilityRunner {
    /// Create a runner with its base level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![VecDeque::new()],
            paused: None,
        }
    }

    /// Current nesting depth (the base level counts as 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total pending activations across all levels.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.levels.iter().map(VecDeque::len).sum()
    }

    /// Enqueue an activation at the current (top) level.
    pub(crate) fn add(&mut self, instance: InstanceId, event: Rc<dyn EventContext>) {
        self.levels
            .last_mut()
            .expect("base level always exists")
            .push_back(QueuedActivation { instance, event });
    }

    /// Open a new nesting level for the activations of a fresh batch of
    /// events.
    pub fn push_new_queue(&mut self) {
        self.levels.push(VecDeque::new());
    }

    /// Drop drained levels from the top, keeping the base level.
    pub fn pop_empty_queues(&mut self) {
        while self.levels.len() > 1 && self.levels.last().is_some_and(VecDeque::is_empty) {
            self.levels.pop();
        }
    }

    /// Take the next activation, always from the deepest non-empty
    /// level.
    pub(crate) fn dequeue(&mut self) -> Option<QueuedActivation> {
        loop {
            let top = self.levels.last_mut().expect("base level always exists");
            if let Some(activation) = top.pop_front() {
                return Some(activation);
            }
            if self.levels.len() == 1 {
                return None;
            }
            self.levels.pop();
        }
    }

    /// The instance currently paused, if any.
    #[must_use]
    pub fn paused_instance(&self) -> Option<InstanceId> {
        self.paused
    }

    /// Whether an instance is paused and freezing the drain loop.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    pub(crate) fn set_paused(&mut self, instance: InstanceId) {
        self.paused = Some(instance);
    }

    pub(crate) fn clear_paused(&mut self) {
        self.paused = None;
    }
}

impl std::fmt::Debug for AbilityRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityRunner")
            .field("depth", &self.levels.len())
            .field("pending", &self.pending_count())
            .field("paused", &self.paused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;
    impl EventContext for Ping {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn ping() -> Rc<dyn EventContext> {
        Rc::new(Ping)
    }

    #[test]
    fn test_fifo_within_a_level() {
        let mut runner = AbilityRunner::new();
        runner.add(InstanceId::new(1), ping());
        runner.add(InstanceId::new(2), ping());

        assert_eq!(runner.dequeue().unwrap().instance, InstanceId::new(1));
        assert_eq!(runner.dequeue().unwrap().instance, InstanceId::new(2));
        assert!(runner.dequeue().is_none());
    }

    #[test]
    fn test_deeper_level_drains_first() {
        let mut runner = AbilityRunner::new();
        runner.add(InstanceId::new(1), ping());

        runner.push_new_queue();
        runner.add(InstanceId::new(2), ping());
        runner.add(InstanceId::new(3), ping());

        assert_eq!(runner.depth(), 2);
        assert_eq!(runner.dequeue().unwrap().instance, InstanceId::new(2));
        assert_eq!(runner.dequeue().unwrap().instance, InstanceId::new(3));
        // The drained level collapses and the outer level continues.
        assert_eq!(runner.dequeue().unwrap().instance, InstanceId::new(1));
        assert_eq!(runner.depth(), 1);
    }

    #[test]
    fn test_pop_empty_queues_keeps_base() {
        let mut runner = AbilityRunner::new();
        runner.push_new_queue();
        runner.push_new_queue();
        runner.pop_empty_queues();
        assert_eq!(runner.depth(), 1);
    }

    #[test]
    fn test_pause_bookkeeping() {
        let mut runner = AbilityRunner::new();
        assert!(!runner.is_paused());

        runner.set_paused(InstanceId::new(7));
        assert_eq!(runner.paused_instance(), Some(InstanceId::new(7)));

        runner.clear_paused();
        assert!(!runner.is_paused());
    }
}
