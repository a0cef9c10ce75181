//! Exchange Connect: the state core of a connect-and-withdraw flow
//!
//! A user picks an exchange, authorizes it through OAuth, loads wallet
//! balances, requests a time-bounded quote and withdraws against it. The
//! core is pure and synchronous: API responses and push messages come in
//! as actions, state snapshots go out to subscribers. All I/O belongs to
//! the host.
//!
//! # Core Concepts
//!
//! - **Engine**: a generic [`Machine`](engine::Machine) with subscribe, send and dispose
//! - **Flow**: the orchestrating [`FlowMachine`](flow::FlowMachine)
//! - **Withdrawal**: a sub-machine owned by the flow while withdrawing
//! - **Classification**: API errors mapped to flow actions, fail-closed
//! - **Preview**: concurrent per-wallet balance checks
//!
//! # Example
//!
//! ```rust
//! use exchange_connect::flow::{FlowAction, FlowMachine, FlowStatus};
//! use exchange_connect::model::WalletBalance;
//!
//! let mut flow = FlowMachine::new("org-1", "proj-1");
//! flow.send(FlowAction::StartOauth {
//!     exchange: "coinbase".into(),
//!     wallet_id: "w1".into(),
//!     idem: "idem-1".into(),
//! })
//! .unwrap();
//! flow.send(FlowAction::OauthWindowOpened).unwrap();
//! flow.send(FlowAction::OauthCompleted { wallet_id: "w1".into() }).unwrap();
//! flow.send(FlowAction::LoadWallet).unwrap();
//! flow.send(FlowAction::WalletLoaded {
//!     balances: vec![WalletBalance::new("BTC", "1.0")],
//! })
//! .unwrap();
//!
//! let state = flow.state().unwrap();
//! assert_eq!(state.status, FlowStatus::WalletReady);
//! assert_eq!(state.context.wallet_balances.len(), 1);
//! ```

// Path used by `status_enum!` expansions.
extern crate self as exchange_connect;

#[doc(hidden)]
pub use serde as __serde;

pub mod balance;
pub mod classify;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod flow;
pub mod model;
pub mod preview;
pub mod withdrawal;

// Re-export commonly used types
pub use classify::{classify, is_recoverable_error};
pub use config::FlowConfig;
pub use core::State;
pub use error::{DomainError, MachineError};
pub use flow::{FlowAction, FlowMachine, FlowState, FlowStatus};
pub use withdrawal::{WithdrawalAction, WithdrawalMachine, WithdrawalState, WithdrawalStatus};
