//! Stat definitions and values.

use serde::{Deserialize, Serialize};

/// Identifier of a stat kind (attack, health, mana recovery, ...).
///
/// The engine doesn't interpret these; games define their stat list at
/// system creation and every owner is seeded with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatId(pub u32);

impl StatId {
    /// Create a new stat ID.
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

impl std::fmt::Display for StatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stat({})", self.0)
    }
}

/// A stat declared for every owner the repository creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDefinition {
    /// Unique identifier.
    pub id: StatId,

    /// Human-readable name (for debugging/display).
    pub name: String,

    /// Base value new owners start with.
    pub default_base: i64,
}

impl StatDefinition {
    /// Create a new stat definition.
    pub fn new(id: StatId, name: impl Into<String>, default_base: i64) -> Self {
        Self {
            id,
            name: name.into(),
            default_base,
        }
    }
}

/// A stat value on one owner.
///
/// `current` is derived: base plus the owner's modifiers, recomputed by
/// the refresh pipeline. Between refreshes it holds the last computed
/// value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// The unmodified base value.
    pub base: i64,

    /// The derived value after modifiers.
    pub current: i64,
}

impl Stat {
    /// Create a stat whose current value starts at its base.
    #[must_use]
    pub const fn new(base: i64) -> Self {
        Self {
            base,
            current: base,
        }
    }
}
