//! Per-instance scratch storage.
//!
//! A blackboard maps string keys to integer values, seeded from the
//! graph's declared variable defaults. The key set is fixed by the
//! graph: unknown keys never auto-create entries, reads of unknown keys
//! return 0 with a diagnostic, and writes to unknown keys are dropped.

use rustc_hash::FxHashMap;

use crate::graph::BlackboardVariable;

/// String-keyed integer scratch storage for one ability instance.
#[derive(Clone, Debug, Default)]
pub struct Blackboard {
    values: FxHashMap<String, i64>,
}

impl Blackboard {
    pub(crate) fn from_defaults(variables: &[BlackboardVariable]) -> Self {
        let mut values = FxHashMap::default();
        for variable in variables {
            values.insert(variable.key.clone(), variable.value);
        }
        Self { values }
    }

    /// Read a variable. Unknown keys log a diagnostic and read as 0.
    #[must_use]
    pub fn get(&self, key: &str) -> i64 {
        match self.values.get(key) {
            Some(&value) => value,
            None => {
                tracing::warn!(key, "blackboard does not have key, returning 0");
                0
            }
        }
    }

    /// Overwrite a declared variable. Unknown keys log a diagnostic and
    /// the write is dropped.
    pub fn set(&mut self, key: &str, value: i64) {
        match self.values.get_mut(key) {
            Some(entry) => *entry = value,
            None => {
                tracing::warn!(key, "blackboard does not have key, cancelling the override");
            }
        }
    }

    /// Check whether a key was declared by the graph.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Restore every declared key to its graph default.
    pub(crate) fn reset(&mut self, variables: &[BlackboardVariable]) {
        self.values.clear();
        for variable in variables {
            self.values.insert(variable.key.clone(), variable.value);
        }
    }

    /// Number of declared variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the graph declared no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<BlackboardVariable> {
        vec![
            BlackboardVariable::new("cost", 2),
            BlackboardVariable::new("charges", 3),
        ]
    }

    #[test]
    fn test_seeded_from_defaults() {
        let board = Blackboard::from_defaults(&defaults());
        assert_eq!(board.len(), 2);
        assert_eq!(board.get("cost"), 2);
        assert_eq!(board.get("charges"), 3);
    }

    #[test]
    fn test_unknown_key_reads_zero() {
        let board = Blackboard::from_defaults(&defaults());
        assert_eq!(board.get("missing"), 0);
        assert!(!board.contains_key("missing"));
    }

    #[test]
    fn test_unknown_key_write_dropped() {
        let mut board = Blackboard::from_defaults(&defaults());
        board.set("missing", 7);
        assert!(!board.contains_key("missing"));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let vars = defaults();
        let mut board = Blackboard::from_defaults(&vars);
        board.set("cost", 99);
        assert_eq!(board.get("cost"), 99);

        board.reset(&vars);
        assert_eq!(board.get("cost"), 2);
        assert_eq!(board.get("charges"), 3);
    }
}
