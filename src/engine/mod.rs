//! The generic machine engine.
//!
//! A [`Machine`] holds one state value, applies actions through a
//! [`Transition`], notifies subscribers synchronously and can be disposed.
//! Domain failures are part of the state; the engine only ever fails with
//! [`MachineError::Disposed`](crate::error::MachineError::Disposed).

mod machine;
mod transition;

pub use machine::{Machine, Subscription};
pub use transition::{Action, StepResult, Transition};
