//! The stat owner repository.
//!
//! Owns every `StatOwner` in stable registration order. That order is a
//! determinism contract: eligibility resolution and stat refresh both
//! enumerate owners in it, and removals never reorder the survivors.

use super::owner::{OwnerId, StatOwner};
use super::stat::StatDefinition;
use crate::ability::{AbilityInstance, InstanceId};

/// Location of an instance inside the repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InstanceLocation {
    pub owner_index: usize,
    pub ability_index: usize,
}

/// Repository of stat owners, enumerated in registration order.
#[derive(Debug)]
pub struct StatOwnerRepository {
    definitions: Vec<StatDefinition>,
    owners: Vec<StatOwner>,
    next_owner_id: u32,
}

impl StatOwnerRepository {
    /// Create a repository; every owner it creates is seeded with
    /// `definitions`.
    #[must_use]
    pub fn new(definitions: Vec<StatDefinition>) -> Self {
        Self {
            definitions,
            owners: Vec::new(),
            next_owner_id: 1,
        }
    }

    /// The stat definition list.
    #[must_use]
    pub fn definitions(&self) -> &[StatDefinition] {
        &self.definitions
    }

    /// Create a new owner seeded with the stat definitions.
    pub fn create_owner(&mut self) -> OwnerId {
        let id = OwnerId::new(self.next_owner_id);
        self.next_owner_id += 1;
        self.owners.push(StatOwner::new(id, &self.definitions));
        id
    }

    /// Remove an owner and all its instances. Unknown owners are logged
    /// no-ops.
    pub fn remove_owner(&mut self, id: OwnerId) -> bool {
        match self.owners.iter().position(|owner| owner.id() == id) {
            Some(index) => {
                self.owners.remove(index);
                true
            }
            None => {
                tracing::warn!(owner = %id, "remove of unknown owner");
                false
            }
        }
    }

    /// Look up an owner by id.
    #[must_use]
    pub fn get_owner(&self, id: OwnerId) -> Option<&StatOwner> {
        self.owners.iter().find(|owner| owner.id() == id)
    }

    /// Mutable lookup of an owner by id.
    pub fn get_owner_mut(&mut self, id: OwnerId) -> Option<&mut StatOwner> {
        self.owners.iter_mut().find(|owner| owner.id() == id)
    }

    /// All owners, in registration order.
    #[must_use]
    pub fn owners(&self) -> &[StatOwner] {
        &self.owners
    }

    /// Number of registered owners.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Recompute every owner's stats, in registration order.
    pub fn refresh_stats_for_all_owners(&mut self) {
        for owner in &mut self.owners {
            owner.refresh_stats();
        }
    }

    pub(crate) fn locate_instance(&self, instance: InstanceId) -> Option<InstanceLocation> {
        for (owner_index, owner) in self.owners.iter().enumerate() {
            if let Some(ability_index) = owner.position_of(instance) {
                return Some(InstanceLocation {
                    owner_index,
                    ability_index,
                });
            }
        }
        None
    }

    pub(crate) fn owner_at_mut(&mut self, index: usize) -> &mut StatOwner {
        &mut self.owners[index]
    }

    pub(crate) fn detach_instance(&mut self, location: InstanceLocation) -> AbilityInstance {
        self.owners[location.owner_index].detach_ability(location.ability_index)
    }

    pub(crate) fn attach_instance(&mut self, location: InstanceLocation, instance: AbilityInstance) {
        self.owners[location.owner_index].attach_ability(location.ability_index, instance);
    }
}
