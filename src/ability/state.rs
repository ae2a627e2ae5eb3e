//! Ability instance lifecycle states.

use serde::{Deserialize, Serialize};

/// The state machine of an ability instance.
///
/// ```text
/// Clean --execute--> Running --> {Pause, Abort, Done}
/// Pause --resume---> Running --> {Pause, Abort, Done}
/// ```
///
/// Execute is only legal from `Clean`, `Abort` or `Done`; resume only
/// from `Pause`. Illegal transitions are logged no-ops that leave the
/// state untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityState {
    /// Freshly created or reset; ready to execute.
    #[default]
    Clean,
    /// Mid-run; only observable from inside node evaluation.
    Running,
    /// Suspended at a node boundary awaiting an external resume.
    Pause,
    /// A node aborted the run.
    Abort,
    /// Traversal exhausted; the run completed.
    Done,
}

impl AbilityState {
    /// Whether a fresh execution may start from this state.
    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(self, AbilityState::Clean | AbilityState::Abort | AbilityState::Done)
    }
}
