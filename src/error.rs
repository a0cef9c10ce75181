//! Error types.
//!
//! The engine raises exactly one error, [`MachineError::Disposed`].
//! Failures reported by the exchange API are [`DomainError`] values that
//! travel inside actions and end up on `state.error`; they are never
//! returned as `Err` by the machines.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the machine engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine '{machine}' has been disposed")]
    Disposed { machine: String },
}

/// An error payload reported by the exchange/withdrawal API.
///
/// The `code` is optional; classification falls back to `details.code`
/// and finally treats a missing code as fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct DomainError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            details: None,
        }
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
