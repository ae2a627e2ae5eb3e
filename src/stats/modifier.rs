//! Stat modifiers.
//!
//! Modifiers are appended to an owner by ability logic (typically during
//! the modifier-collection pass) and applied in append order when stats
//! refresh. Append order is the determinism contract: modifiers are
//! never sorted by magnitude or type.

use serde::{Deserialize, Serialize};

use super::stat::StatId;

/// How a modifier combines with the running value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOp {
    /// Add `value` to the running value.
    Add,
    /// Scale the running value by `value` percent
    /// (`current * (100 + value) / 100`).
    Mul,
}

/// One modifier applied to one stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    /// The stat this modifier targets.
    pub stat: StatId,

    /// Additive amount or percentage delta, depending on `op`.
    pub value: i64,

    /// How the modifier combines.
    pub op: ModifierOp,
}

impl StatModifier {
    /// Create a new modifier.
    #[must_use]
    pub const fn new(stat: StatId, value: i64, op: ModifierOp) -> Self {
        Self { stat, value, op }
    }

    /// Additive modifier.
    #[must_use]
    pub const fn add(stat: StatId, value: i64) -> Self {
        Self::new(stat, value, ModifierOp::Add)
    }

    /// Percentage modifier (`value` of 50 means +50%).
    #[must_use]
    pub const fn mul(stat: StatId, value: i64) -> Self {
        Self::new(stat, value, ModifierOp::Mul)
    }

    /// Fold this modifier into a running value.
    #[must_use]
    pub fn apply(&self, current: i64) -> i64 {
        match self.op {
            ModifierOp::Add => current + self.value,
            ModifierOp::Mul => current * (100 + self.value) / 100,
        }
    }
}
