//! The withdrawal sub-machine.
//!
//! Tracks one withdrawal attempt: execution, step-up verification
//! (2FA/SMS/KYC), the bounded retry loop with idempotency-key rotation,
//! and the terminal outcomes. Owned by the flow machine; never shared.

mod machine;
mod types;

pub use machine::{rotate_idempotency_key, transition, WithdrawalMachine};
pub use types::{
    RequiredAction, WithdrawalAction, WithdrawalContext, WithdrawalState, WithdrawalStatus,
};
