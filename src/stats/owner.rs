//! Stat owners.
//!
//! A `StatOwner` is the engine-side identity of an actor: it holds that
//! actor's stats, the modifiers currently applied to them, and the
//! actor's ability instances. An actor owns exactly one `StatOwner`; the
//! owner's lifetime bounds the validity of its instances.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityId, AbilityInstance, InstanceId};

use super::modifier::StatModifier;
use super::stat::{Stat, StatDefinition, StatId};

/// Identifier of a stat owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u32);

impl OwnerId {
    /// Create a new owner ID.
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

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Owner({})", self.0)
    }
}

/// An entity holding stats and ability instances.
#[derive(Debug)]
pub struct StatOwner {
    id: OwnerId,
    stats: FxHashMap<StatId, Stat>,
    /// Applied modifiers, in append order.
    modifiers: Vec<StatModifier>,
    /// Owned instances, in append order.
    abilities: Vec<AbilityInstance>,
}

impl StatOwner {
    pub(crate) fn new(id: OwnerId, definitions: &[StatDefinition]) -> Self {
        let mut stats = FxHashMap::default();
        for definition in definitions {
            stats.insert(definition.id, Stat::new(definition.default_base));
        }
        Self {
            id,
            stats,
            modifiers: Vec::new(),
            abilities: Vec::new(),
        }
    }

    /// Owner id.
    #[must_use]
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// A stat by id.
    #[must_use]
    pub fn stat(&self, id: StatId) -> Option<&Stat> {
        self.stats.get(&id)
    }

    /// The derived (current) value of a stat.
    #[must_use]
    pub fn stat_value(&self, id: StatId) -> Option<i64> {
        self.stats.get(&id).map(|stat| stat.current)
    }

    /// Change a stat's base value. Takes effect on the next refresh;
    /// unknown stats are logged no-ops.
    pub fn set_stat_base(&mut self, id: StatId, base: i64) {
        match self.stats.get_mut(&id) {
            Some(stat) => stat.base = base,
            None => tracing::warn!(owner = %self.id, stat = %id, "unknown stat, base change dropped"),
        }
    }

    /// Append a modifier. Applied on the next refresh, after every
    /// modifier appended before it.
    pub fn append_modifier(&mut self, modifier: StatModifier) {
        self.modifiers.push(modifier);
    }

    /// The applied modifiers, in append order.
    #[must_use]
    pub fn modifiers(&self) -> &[StatModifier] {
        &self.modifiers
    }

    /// Drop all modifiers (the collection pass re-appends reactively).
    pub fn clear_modifiers(&mut self) {
        self.modifiers.clear();
    }

    /// Recompute every stat: current from base, then the owner's
    /// modifiers folded in append order.
    pub fn refresh_stats(&mut self) {
        for (&id, stat) in &mut self.stats {
            let mut current = stat.base;
            for modifier in &self.modifiers {
                if modifier.stat == id {
                    current = modifier.apply(current);
                }
            }
            stat.current = current;
        }
    }

    /// The owned ability instances, in append order.
    #[must_use]
    pub fn abilities(&self) -> &[AbilityInstance] {
        &self.abilities
    }

    pub(crate) fn append_ability(&mut self, instance: AbilityInstance) {
        self.abilities.push(instance);
    }

    /// Remove the first owned instance of the given ability.
    pub fn remove_ability(&mut self, ability_id: AbilityId) -> bool {
        match self.abilities.iter().position(|a| a.ability_id() == ability_id) {
            Some(index) => {
                self.abilities.remove(index);
                true
            }
            None => {
                tracing::warn!(owner = %self.id, ability = %ability_id, "remove of ability the owner does not hold");
                false
            }
        }
    }

    /// Drop every owned instance.
    pub fn clear_all_abilities(&mut self) {
        self.abilities.clear();
    }

    pub(crate) fn position_of(&self, instance: InstanceId) -> Option<usize> {
        self.abilities
            .iter()
            .position(|ability| ability.instance_id() == instance)
    }

    pub(crate) fn detach_ability(&mut self, index: usize) -> AbilityInstance {
        self.abilities.remove(index)
    }

    pub(crate) fn attach_ability(&mut self, index: usize, instance: AbilityInstance) {
        let index = index.min(self.abilities.len());
        self.abilities.insert(index, instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definitions() -> Vec<StatDefinition> {
        vec![
            StatDefinition::new(StatId::new(1), "attack", 10),
            StatDefinition::new(StatId::new(2), "health", 30),
        ]
    }

    #[test]
    fn test_owner_seeded_from_definitions() {
        let owner = StatOwner::new(OwnerId::new(1), &definitions());
        assert_eq!(owner.stat_value(StatId::new(1)), Some(10));
        assert_eq!(owner.stat_value(StatId::new(2)), Some(30));
        assert_eq!(owner.stat_value(StatId::new(9)), None);
    }

    #[test]
    fn test_refresh_applies_modifiers_in_append_order() {
        let attack = StatId::new(1);
        let mut owner = StatOwner::new(OwnerId::new(1), &definitions());

        owner.append_modifier(StatModifier::add(attack, 5));
        owner.append_modifier(StatModifier::mul(attack, 100));
        owner.refresh_stats();
        assert_eq!(owner.stat_value(attack), Some(30)); // (10 + 5) * 2

        owner.clear_modifiers();
        owner.append_modifier(StatModifier::mul(attack, 100));
        owner.append_modifier(StatModifier::add(attack, 5));
        owner.refresh_stats();
        assert_eq!(owner.stat_value(attack), Some(25)); // 10 * 2 + 5
    }

    #[test]
    fn test_modifiers_only_touch_their_stat() {
        let mut owner = StatOwner::new(OwnerId::new(1), &definitions());
        owner.append_modifier(StatModifier::add(StatId::new(1), 5));
        owner.refresh_stats();

        assert_eq!(owner.stat_value(StatId::new(1)), Some(15));
        assert_eq!(owner.stat_value(StatId::new(2)), Some(30));
    }

    #[test]
    fn test_base_change_visible_after_refresh() {
        let attack = StatId::new(1);
        let mut owner = StatOwner::new(OwnerId::new(1), &definitions());

        owner.set_stat_base(attack, 12);
        assert_eq!(owner.stat_value(attack), Some(10)); // not yet refreshed
        owner.refresh_stats();
        assert_eq!(owner.stat_value(attack), Some(12));
    }
}
