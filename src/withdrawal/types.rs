//! States, context and actions of the withdrawal sub-machine.

use crate::core::State;
use crate::engine::Action;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};

crate::status_enum! {
    /// Status of a single withdrawal attempt.
    pub enum WithdrawalStatus {
        Idle => "idle",
        Processing => "processing",
        WaitingFor2fa => "waitingFor2FA",
        WaitingForSms => "waitingForSMS",
        WaitingForKyc => "waitingForKYC",
        Retrying => "retrying",
        Completed => "completed",
        Blocked => "blocked",
        Failed => "failed",
    }
    final: [Completed, Blocked, Failed]
    error: [Blocked, Failed]
}

/// Step-up verification the exchange asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredAction {
    #[serde(rename = "2FA")]
    TwoFactor,
    #[serde(rename = "SMS")]
    Sms,
    #[serde(rename = "KYC")]
    Kyc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalContext {
    pub quote_id: Option<String>,
    pub wallet_id: Option<String>,
    /// Regenerated on every `EXECUTE` and `RETRY`
    pub idempotency_key: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<DomainError>,
    pub transaction_id: Option<String>,
    pub required_actions: Vec<RequiredAction>,
    pub two_factor_code: Option<String>,
    pub sms_code: Option<String>,
}

impl WithdrawalContext {
    pub fn new(max_retries: u32) -> Self {
        Self {
            quote_id: None,
            wallet_id: None,
            idempotency_key: None,
            retry_count: 0,
            max_retries,
            last_error: None,
            transaction_id: None,
            required_actions: Vec::new(),
            two_factor_code: None,
            sms_code: None,
        }
    }
}

/// Snapshot of the withdrawal sub-machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalState {
    #[serde(rename = "type")]
    pub status: WithdrawalStatus,
    pub context: WithdrawalContext,
    pub error: Option<DomainError>,
}

impl WithdrawalState {
    pub fn initial(max_retries: u32) -> Self {
        Self {
            status: WithdrawalStatus::Idle,
            context: WithdrawalContext::new(max_retries),
            error: None,
        }
    }
}

impl State for WithdrawalState {
    fn name(&self) -> &str {
        self.status.as_str()
    }

    fn is_final(&self) -> bool {
        self.status.is_final()
    }

    fn is_error(&self) -> bool {
        self.status.is_error()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WithdrawalAction {
    #[serde(rename = "EXECUTE", rename_all = "camelCase")]
    Execute { quote_id: String, wallet_id: String },
    #[serde(rename = "REQUIRES_2FA")]
    Requires2fa,
    #[serde(rename = "REQUIRES_SMS")]
    RequiresSms,
    #[serde(rename = "REQUIRES_KYC")]
    RequiresKyc,
    #[serde(rename = "SUBMIT_2FA")]
    Submit2fa { code: String },
    #[serde(rename = "SUBMIT_SMS")]
    SubmitSms { code: String },
    #[serde(rename = "SUCCESS", rename_all = "camelCase")]
    Success { transaction_id: String },
    #[serde(rename = "FAIL")]
    Fail { error: DomainError },
    #[serde(rename = "RETRY")]
    Retry,
    #[serde(rename = "BLOCKED")]
    Blocked { reason: String },
}

impl Action for WithdrawalAction {
    fn name(&self) -> &str {
        match self {
            Self::Execute { .. } => "EXECUTE",
            Self::Requires2fa => "REQUIRES_2FA",
            Self::RequiresSms => "REQUIRES_SMS",
            Self::RequiresKyc => "REQUIRES_KYC",
            Self::Submit2fa { .. } => "SUBMIT_2FA",
            Self::SubmitSms { .. } => "SUBMIT_SMS",
            Self::Success { .. } => "SUCCESS",
            Self::Fail { .. } => "FAIL",
            Self::Retry => "RETRY",
            Self::Blocked { .. } => "BLOCKED",
        }
    }
}
