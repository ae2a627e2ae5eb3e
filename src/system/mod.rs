//! The ability system facade.
//!
//! Owns the owner repository, the loaded-graph table, the cached-event
//! queue, and the nested activation runner, and drives the control flow
//! between them: an external event is enqueued, the trigger pass pairs
//! it with every eligible ability, and the drain loop executes those
//! pairs in deterministic order, opening a deeper queue level for every
//! cascade of events raised mid-run.
//!
//! Everything here assumes exclusive single-threaded access; suspension
//! happens cooperatively at node boundaries, never concurrently.
//!
//! ## Control flow
//!
//! ```text
//! enqueue_event -> [event queue] -> trigger_cached_events
//!     -> [runner level N+1: (instance, event) pairs]
//!     -> run: reset, set payload, execute each pair FIFO
//!         -> node logic enqueues more events -> deeper level, drained
//!            before this one continues
//!         -> a pause freezes the runner until resume() arrives
//! ```

use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ability::{
    AbilityId, AbilityInstance, AbilityState, EventContext, InstanceId, ResumeContext, RunEffects,
};
use crate::events::{AbilityEventQueue, AbilityRunner, QueuedActivation};
use crate::graph::{AbilityGraph, GraphData, NodeRegistry};
use crate::stats::{
    InstanceLocation, OwnerId, StatDefinition, StatOwner, StatOwnerRepository, StatRefreshEvent,
};

/// Callback invoked synchronously whenever an event is enqueued.
pub type EventSubscriber = Box<dyn FnMut(&dyn EventContext)>;

/// The engine facade: owner repository, graph table, event queue, and
/// activation runner behind one API.
pub struct AbilitySystem {
    repository: StatOwnerRepository,
    runner: AbilityRunner,
    event_queue: AbilityEventQueue,
    graph_table: FxHashMap<AbilityId, Arc<AbilityGraph>>,
    registry: NodeRegistry,
    override_iterator: Option<Vec<OwnerId>>,
    subscribers: Vec<EventSubscriber>,
    next_instance_id: u64,
}

impl AbilitySystem {
    /// Create a system with the game's stat definition list and node
    /// factory registry.
    #[must_use]
    pub fn new(definitions: Vec<StatDefinition>, registry: NodeRegistry) -> Self {
        Self {
            repository: StatOwnerRepository::new(definitions),
            runner: AbilityRunner::new(),
            event_queue: AbilityEventQueue::new(),
            graph_table: FxHashMap::default(),
            registry,
            override_iterator: None,
            subscribers: Vec::new(),
            next_instance_id: 1,
        }
    }

    // === Owners ===

    /// Create a stat owner.
    pub fn create_owner(&mut self) -> OwnerId {
        self.repository.create_owner()
    }

    /// Remove a stat owner and all its ability instances.
    pub fn remove_owner(&mut self, owner: OwnerId) {
        if self.repository.remove_owner(owner) {
            // A paused instance belonging to the removed owner can never
            // be resumed; unfreeze the runner.
            if let Some(paused) = self.runner.paused_instance() {
                if self.repository.locate_instance(paused).is_none() {
                    tracing::warn!(%paused, "paused instance removed with its owner, unfreezing runner");
                    self.runner.clear_paused();
                }
            }
        }
    }

    /// Look up an owner.
    #[must_use]
    pub fn get_owner(&self, owner: OwnerId) -> Option<&StatOwner> {
        self.repository.get_owner(owner)
    }

    /// Mutable lookup of an owner.
    pub fn get_owner_mut(&mut self, owner: OwnerId) -> Option<&mut StatOwner> {
        self.repository.get_owner_mut(owner)
    }

    /// The owner repository.
    #[must_use]
    pub fn owner_repository(&self) -> &StatOwnerRepository {
        &self.repository
    }

    // === Graph table ===

    /// Register a graph template under an ability id, from JSON source.
    ///
    /// Duplicate ids are rejected: the first registration wins and the
    /// failure is logged, not fatal.
    pub fn load_ability_graph(&mut self, id: AbilityId, source: &str) -> bool {
        match AbilityGraph::from_json(source) {
            Ok(graph) => self.insert_graph(id, Arc::new(graph)),
            Err(error) => {
                tracing::error!(ability = %id, %error, "load graph failed");
                false
            }
        }
    }

    /// Register a graph template from an in-memory description.
    pub fn load_ability_graph_data(&mut self, id: AbilityId, data: GraphData) -> bool {
        match AbilityGraph::from_data(data) {
            Ok(graph) => self.insert_graph(id, Arc::new(graph)),
            Err(error) => {
                tracing::error!(ability = %id, %error, "load graph failed");
                false
            }
        }
    }

    fn insert_graph(&mut self, id: AbilityId, graph: Arc<AbilityGraph>) -> bool {
        if self.graph_table.contains_key(&id) {
            tracing::error!(ability = %id, "load graph failed, a graph with this id already exists");
            return false;
        }
        self.graph_table.insert(id, graph);
        true
    }

    /// Build an unowned instance of a loaded ability, e.g. for tools or
    /// tests. Unknown ids are logged and yield `None`.
    pub fn get_ability_instance(&mut self, id: AbilityId) -> Option<AbilityInstance> {
        let Some(graph) = self.graph_table.get(&id) else {
            tracing::error!(ability = %id, "get instance failed, no graph with this id");
            return None;
        };
        let graph = Arc::clone(graph);
        let instance_id = self.allocate_instance_id();
        Some(AbilityInstance::new(id, instance_id, graph, &self.registry))
    }

    /// Late access to the node factory registry.
    pub fn node_registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    // === Ability lists ===

    /// Instantiate an ability and append it to an owner's list.
    pub fn append_ability(&mut self, owner: OwnerId, ability_id: AbilityId) -> Option<InstanceId> {
        let mut instance = self.get_ability_instance(ability_id)?;
        let Some(owner_ref) = self.repository.get_owner_mut(owner) else {
            tracing::error!(%owner, "append ability failed, unknown owner");
            return None;
        };
        instance.set_owner(Some(owner));
        let instance_id = instance.instance_id();
        owner_ref.append_ability(instance);
        Some(instance_id)
    }

    /// Remove the first instance of an ability from an owner's list.
    pub fn remove_ability(&mut self, owner: OwnerId, ability_id: AbilityId) {
        match self.repository.get_owner_mut(owner) {
            Some(owner_ref) => {
                owner_ref.remove_ability(ability_id);
            }
            None => tracing::warn!(%owner, "remove ability from unknown owner"),
        }
    }

    /// Drop every ability instance an owner holds.
    pub fn clear_all_abilities(&mut self, owner: OwnerId) {
        match self.repository.get_owner_mut(owner) {
            Some(owner_ref) => owner_ref.clear_all_abilities(),
            None => tracing::warn!(%owner, "clear abilities of unknown owner"),
        }
    }

    // === Eligibility resolution ===

    /// Install an explicit owner iteration order for eligibility
    /// resolution (scoped resolution, deterministic test ordering).
    pub fn override_iterator(&mut self, owners: Vec<OwnerId>) {
        self.override_iterator = Some(owners);
    }

    /// Fall back to full repository registration order.
    pub fn clear_override_iterator(&mut self) {
        self.override_iterator = None;
    }

    // === Events ===

    /// Subscribe to event enqueues. Subscribers are notified
    /// synchronously, in subscription order, after the event is cached.
    pub fn on_event_enqueued(&mut self, subscriber: impl FnMut(&dyn EventContext) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Cache an event for the next trigger pass and notify subscribers.
    pub fn enqueue_event(&mut self, event: impl EventContext) {
        self.enqueue_event_rc(Rc::new(event));
    }

    fn enqueue_event_rc(&mut self, event: Rc<dyn EventContext>) {
        self.event_queue.enqueue(Rc::clone(&event));
        for subscriber in &mut self.subscribers {
            subscriber(event.as_ref());
        }
    }

    /// The cached-event queue.
    #[must_use]
    pub fn event_queue(&self) -> &AbilityEventQueue {
        &self.event_queue
    }

    /// The activation runner.
    #[must_use]
    pub fn runner(&self) -> &AbilityRunner {
        &self.runner
    }

    /// Convert every cached event into activations at a fresh queue
    /// level.
    ///
    /// For each event, every owner's abilities are checked in owner
    /// registration order (or the override iterator's order) and
    /// ability-list order; eligible instances are paired with the event
    /// at the new level. No-op when no events are cached.
    pub fn trigger_cached_events(&mut self) {
        if self.event_queue.is_empty() {
            return;
        }

        self.runner.push_new_queue();
        while let Some(event) = self.event_queue.dequeue() {
            self.enqueue_eligible_abilities(&event);
        }
        self.runner.pop_empty_queues();
    }

    fn enqueue_eligible_abilities(&mut self, event: &Rc<dyn EventContext>) {
        if let Some(order) = self.override_iterator.clone() {
            for owner_id in order {
                match self.repository.get_owner(owner_id) {
                    Some(owner) => Self::enqueue_from_owner(&mut self.runner, owner, event),
                    None => tracing::warn!(owner = %owner_id, "override iterator names unknown owner"),
                }
            }
        } else {
            for owner in self.repository.owners() {
                Self::enqueue_from_owner(&mut self.runner, owner, event);
            }
        }
    }

    fn enqueue_from_owner(runner: &mut AbilityRunner, owner: &StatOwner, event: &Rc<dyn EventContext>) {
        for ability in owner.abilities() {
            if ability.can_execute(Some(event.as_ref()), Some(owner)) {
                runner.add(ability.instance_id(), Rc::clone(event));
            }
        }
    }

    /// Queue a specific instance for activation with an event, without
    /// going through eligibility resolution.
    pub fn enqueue_ability(&mut self, instance: InstanceId, event: impl EventContext) {
        self.runner.add(instance, Rc::new(event));
    }

    /// [`enqueue_ability`](Self::enqueue_ability) followed by
    /// [`run`](Self::run).
    pub fn enqueue_ability_and_run(&mut self, instance: InstanceId, event: impl EventContext) {
        self.enqueue_ability(instance, event);
        self.run();
    }

    /// Trigger cached events and drain the runner.
    ///
    /// Each activation is reset, given its event as payload, and
    /// executed. Events raised during an execution are triggered at a
    /// deeper level and fully resolved before this level's next
    /// activation. A pause freezes the drain until
    /// [`resume`](Self::resume); calling `run` while frozen is a logged
    /// no-op.
    pub fn run(&mut self) {
        if self.runner.is_paused() {
            tracing::error!("cannot run while an ability instance is paused awaiting resume");
            return;
        }
        self.trigger_cached_events();
        self.drain();
    }

    fn drain(&mut self) {
        while let Some(QueuedActivation { instance, event }) = self.runner.dequeue() {
            let Some(location) = self.repository.locate_instance(instance) else {
                tracing::warn!(%instance, "queued instance no longer exists, skipping");
                continue;
            };

            let mut ability = self.repository.detach_instance(location);
            ability.reset();
            ability.set_payload(Some(event));
            let owner = self.repository.owner_at_mut(location.owner_index);
            let effects = ability.execute(Some(owner));
            let paused = ability.state() == AbilityState::Pause;
            self.repository.attach_instance(location, ability);
            self.flush_effects(effects);

            if paused {
                self.runner.set_paused(instance);
                return;
            }
            self.trigger_cached_events();
        }
        self.runner.pop_empty_queues();
    }

    /// Resume the paused instance with external data.
    ///
    /// The paused node validates the context; a mismatch leaves the
    /// pause untouched. On completion the drain loop continues,
    /// resolving any cascade the resumed run raised.
    pub fn resume(&mut self, resume: &dyn ResumeContext) {
        let Some(instance) = self.runner.paused_instance() else {
            tracing::error!("no paused ability instance to resume");
            return;
        };
        let Some(location) = self.repository.locate_instance(instance) else {
            tracing::error!(%instance, "paused instance no longer exists");
            self.runner.clear_paused();
            return;
        };

        let mut ability = self.repository.detach_instance(location);
        let owner = self.repository.owner_at_mut(location.owner_index);
        let effects = ability.resume(resume, Some(owner));
        let still_paused = ability.state() == AbilityState::Pause;
        self.repository.attach_instance(location, ability);
        self.flush_effects(effects);

        if still_paused {
            // Rejected context or a fresh pause; the freeze stands.
            return;
        }
        self.runner.clear_paused();
        self.trigger_cached_events();
        self.drain();
    }

    fn flush_effects(&mut self, effects: RunEffects) {
        for event in effects.events {
            self.enqueue_event_rc(event);
        }
    }

    // === Stat refresh pipeline ===

    /// Collect modifiers and recompute stats.
    ///
    /// Every owner's modifiers are cleared, every ability eligible for
    /// the synthetic [`StatRefreshEvent`] is executed (modifier-appending
    /// nodes run here), and all stats are recomputed.
    pub fn refresh_modifiers(&mut self) {
        let payload: Rc<dyn EventContext> = Rc::new(StatRefreshEvent);

        for owner_index in 0..self.repository.owner_count() {
            self.repository.owner_at_mut(owner_index).clear_modifiers();

            let ability_count = self.repository.owners()[owner_index].abilities().len();
            for ability_index in 0..ability_count {
                let owner = &self.repository.owners()[owner_index];
                let Some(ability) = owner.abilities().get(ability_index) else {
                    continue;
                };
                if !ability.can_execute(Some(payload.as_ref()), Some(owner)) {
                    continue;
                }

                let location = InstanceLocation {
                    owner_index,
                    ability_index,
                };
                let mut ability = self.repository.detach_instance(location);
                ability.set_payload(Some(Rc::clone(&payload)));
                let effects = ability.execute(Some(self.repository.owner_at_mut(owner_index)));
                self.repository.attach_instance(location, ability);
                self.flush_effects(effects);
            }
        }

        self.repository.refresh_stats_for_all_owners();
    }

    /// Full recompute: refresh stats, then collect modifiers and refresh
    /// again, so modifier-triggered effects are reflected before callers
    /// read values.
    pub fn refresh_stats_and_modifiers(&mut self) {
        self.repository.refresh_stats_for_all_owners();
        self.refresh_modifiers();
    }

    fn allocate_instance_id(&mut self) -> InstanceId {
        let id = InstanceId::new(self.next_instance_id);
        self.next_instance_id += 1;
        id
    }
}

impl std::fmt::Debug for AbilitySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilitySystem")
            .field("owners", &self.repository.owner_count())
            .field("graphs", &self.graph_table.len())
            .field("runner", &self.runner)
            .field("cached_events", &self.event_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_graph_json() -> &'static str {
        r#"{"nodes": []}"#
    }

    #[test]
    fn test_duplicate_graph_id_first_wins() {
        let mut system = AbilitySystem::new(Vec::new(), NodeRegistry::new());
        assert!(system.load_ability_graph(AbilityId::new(1), empty_graph_json()));
        assert!(!system.load_ability_graph(AbilityId::new(1), empty_graph_json()));
    }

    #[test]
    fn test_bad_graph_source_is_rejected() {
        let mut system = AbilitySystem::new(Vec::new(), NodeRegistry::new());
        assert!(!system.load_ability_graph(AbilityId::new(1), "not json"));
        assert!(system.get_ability_instance(AbilityId::new(1)).is_none());
    }

    #[test]
    fn test_append_ability_requires_owner_and_graph() {
        let mut system = AbilitySystem::new(Vec::new(), NodeRegistry::new());
        let owner = system.create_owner();

        // Unknown graph id.
        assert!(system.append_ability(owner, AbilityId::new(9)).is_none());

        system.load_ability_graph(AbilityId::new(9), empty_graph_json());
        assert!(system.append_ability(OwnerId::new(99), AbilityId::new(9)).is_none());
        assert!(system.append_ability(owner, AbilityId::new(9)).is_some());
        assert_eq!(system.get_owner(owner).unwrap().abilities().len(), 1);
    }

    #[test]
    fn test_instance_without_entry_node_is_never_eligible() {
        let mut system = AbilitySystem::new(Vec::new(), NodeRegistry::new());
        system.load_ability_graph(AbilityId::new(1), empty_graph_json());

        let instance = system.get_ability_instance(AbilityId::new(1)).unwrap();
        assert!(!instance.can_execute(None, None));
    }
}
