//! Core state types.
//!
//! - State definitions via the `State` trait
//! - Closed status enumerations via `status_enum!`
//! - Per-instance transition history
//!
//! Nothing in this module performs I/O.

mod history;
mod macros;
mod state;

pub use history::{TransitionHistory, TransitionRecord};
pub use state::State;
