//! States, context and actions of the flow machine.

use crate::core::State;
use crate::engine::Action;
use crate::error::DomainError;
use crate::model::{
    Exchange, Quote, QuoteRequest, TwoFactorMethodResult, WalletBalance, WithdrawalRecord,
};
use serde::{Deserialize, Serialize};

crate::status_enum! {
    /// Every state type the flow can be in.
    pub enum FlowStatus {
        Idle => "idle",
        ExchangesLoading => "exchanges:loading",
        ExchangesReady => "exchanges:ready",
        ExchangesError => "exchanges:error",
        OauthWaiting => "oauth:waiting",
        OauthProcessing => "oauth:processing",
        OauthCompleted => "oauth:completed",
        OauthError => "oauth:error",
        OauthFatal => "oauth:fatal",
        OauthWindowClosedByUser => "oauth:window_closed_by_user",
        WalletLoading => "wallet:loading",
        WalletReady => "wallet:ready",
        WalletError => "wallet:error",
        QuoteRequesting => "quote:requesting",
        QuoteReady => "quote:ready",
        QuoteExpired => "quote:expired",
        QuoteError => "quote:error",
        WithdrawProcessing => "withdraw:processing",
        WithdrawError2fa => "withdraw:error2FA",
        WithdrawErrorSms => "withdraw:errorSMS",
        WithdrawErrorKyc => "withdraw:errorKYC",
        WithdrawErrorBalance => "withdraw:errorBalance",
        WithdrawRetrying => "withdraw:retrying",
        WithdrawCompleted => "withdraw:completed",
        WithdrawBlocked => "withdraw:blocked",
        WithdrawFatal => "withdraw:fatal",
        FlowCancelled => "flow:cancelled",
    }
    final: [WithdrawCompleted, WithdrawBlocked, WithdrawFatal, FlowCancelled]
    error: [
        ExchangesError,
        OauthError,
        OauthFatal,
        OauthWindowClosedByUser,
        WalletError,
        QuoteError,
        WithdrawError2fa,
        WithdrawErrorSms,
        WithdrawErrorKyc,
        WithdrawErrorBalance,
        WithdrawBlocked,
        WithdrawFatal,
    ]
}

impl FlowStatus {
    /// Non-terminal `withdraw:*` states, where the sub-machine is live.
    pub fn is_withdrawing(&self) -> bool {
        matches!(
            self,
            Self::WithdrawProcessing
                | Self::WithdrawError2fa
                | Self::WithdrawErrorSms
                | Self::WithdrawErrorKyc
                | Self::WithdrawErrorBalance
                | Self::WithdrawRetrying
        )
    }

    /// Any `withdraw:*` state, terminal or not.
    pub fn is_withdraw_region(&self) -> bool {
        self.is_withdrawing()
            || matches!(
                self,
                Self::WithdrawCompleted | Self::WithdrawBlocked | Self::WithdrawFatal
            )
    }
}

/// Data accumulated while the flow progresses.
///
/// `org_id` and `project_id` are fixed at construction and only readable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowContext {
    org_id: String,
    project_id: String,
    pub exchange: Option<String>,
    pub wallet_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub topic_name: Option<String>,
    pub exchanges: Vec<Exchange>,
    pub wallet_balances: Vec<WalletBalance>,
    pub last_quote_request: Option<QuoteRequest>,
    pub quote: Option<Quote>,
    pub withdrawal: Option<WithdrawalRecord>,
    pub retry_attempts: u32,
    pub max_retry_attempts: u32,
    #[serde(rename = "invalid2FAAttempts")]
    pub invalid_2fa_attempts: u32,
    pub error_details: Option<serde_json::Value>,
}

impl FlowContext {
    pub fn new(
        org_id: impl Into<String>,
        project_id: impl Into<String>,
        max_retry_attempts: u32,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            project_id: project_id.into(),
            exchange: None,
            wallet_id: None,
            idempotency_key: None,
            topic_name: None,
            exchanges: Vec::new(),
            wallet_balances: Vec::new(),
            last_quote_request: None,
            quote: None,
            withdrawal: None,
            retry_attempts: 0,
            max_retry_attempts,
            invalid_2fa_attempts: 0,
            error_details: None,
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Snapshot of the flow machine, the only state the UI layer sees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    #[serde(rename = "type")]
    pub status: FlowStatus,
    pub context: FlowContext,
    pub error: Option<DomainError>,
}

impl FlowState {
    pub fn initial(context: FlowContext) -> Self {
        Self {
            status: FlowStatus::Idle,
            context,
            error: None,
        }
    }
}

impl State for FlowState {
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

/// Every event the flow machine accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowAction {
    #[serde(rename = "LOAD_EXCHANGES")]
    LoadExchanges,
    #[serde(rename = "EXCHANGES_LOADED")]
    ExchangesLoaded { exchanges: Vec<Exchange> },
    #[serde(rename = "EXCHANGES_FAILED")]
    ExchangesFailed { error: DomainError },
    #[serde(rename = "START_OAUTH", rename_all = "camelCase")]
    StartOauth {
        exchange: String,
        wallet_id: String,
        idem: String,
    },
    #[serde(rename = "OAUTH_WINDOW_OPENED")]
    OauthWindowOpened,
    #[serde(rename = "OAUTH_COMPLETED", rename_all = "camelCase")]
    OauthCompleted { wallet_id: String },
    #[serde(rename = "OAUTH_FAILED")]
    OauthFailed { error: DomainError },
    #[serde(rename = "OAUTH_FATAL")]
    OauthFatal { error: DomainError },
    #[serde(rename = "OAUTH_WINDOW_CLOSED_BY_USER")]
    OauthWindowClosedByUser { error: DomainError },
    #[serde(rename = "LOAD_WALLET")]
    LoadWallet,
    #[serde(rename = "WALLET_LOADED")]
    WalletLoaded { balances: Vec<WalletBalance> },
    #[serde(rename = "WALLET_FAILED")]
    WalletFailed { error: DomainError },
    #[serde(rename = "REQUEST_QUOTE")]
    RequestQuote(QuoteRequest),
    #[serde(rename = "QUOTE_RECEIVED")]
    QuoteReceived { quote: Quote },
    #[serde(rename = "QUOTE_FAILED")]
    QuoteFailed { error: DomainError },
    #[serde(rename = "QUOTE_EXPIRED")]
    QuoteExpired,
    #[serde(rename = "START_WITHDRAWAL", rename_all = "camelCase")]
    StartWithdrawal { quote_id: String },
    #[serde(rename = "SUBMIT_2FA")]
    Submit2fa { code: String },
    #[serde(rename = "SUBMIT_SMS")]
    SubmitSms { code: String },
    #[serde(rename = "RETRY_WITHDRAWAL")]
    RetryWithdrawal,
    #[serde(rename = "WITHDRAWAL_2FA_INVALID")]
    Withdrawal2faInvalid,
    #[serde(rename = "WITHDRAWAL_INSUFFICIENT_BALANCE")]
    WithdrawalInsufficientBalance,
    #[serde(rename = "WITHDRAWAL_REQUIRES_2FA")]
    WithdrawalRequires2fa,
    #[serde(rename = "WITHDRAWAL_REQUIRES_SMS")]
    WithdrawalRequiresSms,
    #[serde(rename = "WITHDRAWAL_REQUIRES_KYC")]
    WithdrawalRequiresKyc,
    #[serde(rename = "WITHDRAWAL_2FA_METHOD_NOT_SUPPORTED")]
    Withdrawal2faMethodNotSupported { result: TwoFactorMethodResult },
    #[serde(rename = "WITHDRAWAL_SUCCESS", rename_all = "camelCase")]
    WithdrawalSuccess { transaction_id: String },
    #[serde(rename = "WITHDRAWAL_FAILED")]
    WithdrawalFailed { error: DomainError },
    #[serde(rename = "WITHDRAWAL_BLOCKED")]
    WithdrawalBlocked { reason: String },
    #[serde(rename = "WITHDRAWAL_COMPLETED", rename_all = "camelCase")]
    WithdrawalCompleted { transaction_id: String },
    #[serde(rename = "WITHDRAWAL_FATAL")]
    WithdrawalFatal { error: DomainError },
    #[serde(rename = "CANCEL_FLOW")]
    CancelFlow,
}

impl Action for FlowAction {
    fn name(&self) -> &str {
        match self {
            Self::LoadExchanges => "LOAD_EXCHANGES",
            Self::ExchangesLoaded { .. } => "EXCHANGES_LOADED",
            Self::ExchangesFailed { .. } => "EXCHANGES_FAILED",
            Self::StartOauth { .. } => "START_OAUTH",
            Self::OauthWindowOpened => "OAUTH_WINDOW_OPENED",
            Self::OauthCompleted { .. } => "OAUTH_COMPLETED",
            Self::OauthFailed { .. } => "OAUTH_FAILED",
            Self::OauthFatal { .. } => "OAUTH_FATAL",
            Self::OauthWindowClosedByUser { .. } => "OAUTH_WINDOW_CLOSED_BY_USER",
            Self::LoadWallet => "LOAD_WALLET",
            Self::WalletLoaded { .. } => "WALLET_LOADED",
            Self::WalletFailed { .. } => "WALLET_FAILED",
            Self::RequestQuote(_) => "REQUEST_QUOTE",
            Self::QuoteReceived { .. } => "QUOTE_RECEIVED",
            Self::QuoteFailed { .. } => "QUOTE_FAILED",
            Self::QuoteExpired => "QUOTE_EXPIRED",
            Self::StartWithdrawal { .. } => "START_WITHDRAWAL",
            Self::Submit2fa { .. } => "SUBMIT_2FA",
            Self::SubmitSms { .. } => "SUBMIT_SMS",
            Self::RetryWithdrawal => "RETRY_WITHDRAWAL",
            Self::Withdrawal2faInvalid => "WITHDRAWAL_2FA_INVALID",
            Self::WithdrawalInsufficientBalance => "WITHDRAWAL_INSUFFICIENT_BALANCE",
            Self::WithdrawalRequires2fa => "WITHDRAWAL_REQUIRES_2FA",
            Self::WithdrawalRequiresSms => "WITHDRAWAL_REQUIRES_SMS",
            Self::WithdrawalRequiresKyc => "WITHDRAWAL_REQUIRES_KYC",
            Self::Withdrawal2faMethodNotSupported { .. } => "WITHDRAWAL_2FA_METHOD_NOT_SUPPORTED",
            Self::WithdrawalSuccess { .. } => "WITHDRAWAL_SUCCESS",
            Self::WithdrawalFailed { .. } => "WITHDRAWAL_FAILED",
            Self::WithdrawalBlocked { .. } => "WITHDRAWAL_BLOCKED",
            Self::WithdrawalCompleted { .. } => "WITHDRAWAL_COMPLETED",
            Self::WithdrawalFatal { .. } => "WITHDRAWAL_FATAL",
            Self::CancelFlow => "CANCEL_FLOW",
        }
    }
}
