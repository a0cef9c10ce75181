//! The flow machine.
//!
//! Drives one run from exchange selection through OAuth, wallet loading
//! and quoting to a finished withdrawal. The withdrawal itself is
//! delegated to a [`WithdrawalMachine`](crate::withdrawal::WithdrawalMachine)
//! owned by the flow's transition table.

mod machine;
mod transition;
mod types;

pub use machine::FlowMachine;
pub use transition::FlowTransition;
pub use types::{FlowAction, FlowContext, FlowState, FlowStatus};
