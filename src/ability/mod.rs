//! Ability instances and their execution state.
//!
//! ## Key Components
//!
//! - [`AbilityInstance`]: one stateful execution of a graph for a
//!   specific owner, with its own blackboard, cursor, and node state
//! - [`AbilityState`]: the Clean/Running/Pause/Abort/Done lifecycle
//! - [`Blackboard`]: per-instance key-to-integer scratch storage seeded
//!   from graph defaults
//! - [`EventContext`] / [`ResumeContext`]: the opaque payload contracts
//!   between game logic and node logic
//! - [`ExecutionContext`]: everything a node touches while it runs,
//!   threaded through evaluation instead of back-pointers

mod blackboard;
mod context;
mod instance;
mod state;

pub use blackboard::Blackboard;
pub use context::{EligibilityContext, EventContext, ExecutionContext, ResumeContext, RunEffects};
pub use instance::{AbilityId, AbilityInstance, InstanceId};
pub use state::AbilityState;
