//! The flow transition table.
//!
//! Every (state, action) pair that is not listed here is ignored, which is
//! what makes duplicated or out-of-order push messages safe to replay.
//! While a withdrawal is in progress the flow first synchronizes with its
//! sub-machine, then evaluates the action itself.

use crate::classify::unsupported_two_factor_message;
use crate::core::State;
use crate::engine::{StepResult, Transition};
use crate::error::DomainError;
use crate::flow::types::{FlowAction, FlowState, FlowStatus};
use crate::model::{WithdrawalOutcome, WithdrawalRecord};
use crate::withdrawal::{WithdrawalAction, WithdrawalMachine, WithdrawalStatus};
use tracing::{info, warn};

/// Transition table of the flow machine.
///
/// Owns the withdrawal sub-machine, which exists from `START_WITHDRAWAL`
/// until `CANCEL_FLOW` or disposal of the flow machine.
#[derive(Default)]
pub struct FlowTransition {
    withdrawal: Option<WithdrawalMachine>,
}

impl FlowTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn withdrawal(&self) -> Option<&WithdrawalMachine> {
        self.withdrawal.as_ref()
    }

    fn step(&mut self, state: &FlowState, action: &FlowAction) -> StepResult<FlowState> {
        use FlowAction as A;
        use FlowStatus as S;

        let mut next = state.clone();
        match (state.status, action) {
            (S::Idle, A::LoadExchanges) => next.status = S::ExchangesLoading,
            (S::ExchangesLoading, A::ExchangesLoaded { exchanges }) => {
                next.status = S::ExchangesReady;
                next.context.exchanges = exchanges.clone();
            }
            (S::ExchangesLoading, A::ExchangesFailed { error }) => {
                fail(&mut next, S::ExchangesError, error.clone())
            }
            (
                S::Idle | S::ExchangesReady,
                A::StartOauth {
                    exchange,
                    wallet_id,
                    idem,
                },
            ) => {
                next.status = S::OauthWaiting;
                next.context.exchange = Some(exchange.clone());
                next.context.wallet_id = Some(wallet_id.clone());
                next.context.idempotency_key = Some(idem.clone());
                next.context.topic_name = Some(idem.clone());
            }
            (S::OauthWaiting, A::OauthWindowOpened) => next.status = S::OauthProcessing,
            (S::OauthProcessing, A::OauthCompleted { wallet_id }) => {
                next.status = S::OauthCompleted;
                next.context.wallet_id = Some(wallet_id.clone());
            }
            (S::OauthProcessing, A::OauthFailed { error }) => {
                fail(&mut next, S::OauthError, error.clone())
            }
            (S::OauthProcessing, A::OauthFatal { error }) => {
                fail(&mut next, S::OauthFatal, error.clone())
            }
            (S::OauthProcessing, A::OauthWindowClosedByUser { error }) => {
                fail(&mut next, S::OauthWindowClosedByUser, error.clone())
            }
            (S::OauthCompleted, A::LoadWallet) => next.status = S::WalletLoading,
            (S::WalletLoading, A::WalletLoaded { balances }) => {
                next.status = S::WalletReady;
                next.context.wallet_balances = balances.clone();
            }
            (S::WalletLoading, A::WalletFailed { error }) => {
                fail(&mut next, S::WalletError, error.clone())
            }
            (
                S::WalletReady | S::QuoteReady | S::QuoteExpired | S::QuoteError,
                A::RequestQuote(request),
            ) => {
                next.status = S::QuoteRequesting;
                next.context.quote = None;
                next.context.last_quote_request = Some(request.clone());
            }
            // Only a pending request takes a quote; a late response is dropped.
            (S::QuoteRequesting, A::QuoteReceived { quote }) => {
                next.status = S::QuoteReady;
                next.context.quote = Some(quote.clone());
            }
            (S::QuoteRequesting, A::QuoteFailed { error }) => {
                fail(&mut next, S::QuoteError, error.clone())
            }
            (S::QuoteReady, A::QuoteExpired) => next.status = S::QuoteExpired,
            (S::QuoteReady, A::StartWithdrawal { quote_id }) => {
                return self.start_withdrawal(state, quote_id)
            }
            _ => return StepResult::Ignored,
        }
        StepResult::Transitioned(next)
    }

    fn start_withdrawal(&mut self, state: &FlowState, quote_id: &str) -> StepResult<FlowState> {
        let Some(wallet_id) = state.context.wallet_id.clone() else {
            warn!(quote_id, "withdrawal requested without a connected wallet");
            return StepResult::Ignored;
        };

        if self.withdrawal.is_none() {
            self.withdrawal = Some(WithdrawalMachine::new(state.context.max_retry_attempts));
        }
        self.forward(WithdrawalAction::Execute {
            quote_id: quote_id.to_string(),
            wallet_id,
        });

        let mut next = state.clone();
        next.status = FlowStatus::WithdrawProcessing;
        StepResult::Transitioned(next)
    }

    fn withdraw(&mut self, state: &FlowState, action: &FlowAction) -> StepResult<FlowState> {
        use FlowAction as A;
        use FlowStatus as S;

        // An in-flight withdrawal is never aborted by a client-side expiry.
        if matches!(action, A::QuoteExpired) {
            return StepResult::Ignored;
        }
        if let Some(synced) = self.sync(state, action) {
            return StepResult::Transitioned(synced);
        }

        let mut next = state.clone();
        match (state.status, action) {
            (S::WithdrawError2fa, A::Submit2fa { code }) => {
                self.forward(WithdrawalAction::Submit2fa { code: code.clone() });
                next.status = S::WithdrawProcessing;
                next.context.invalid_2fa_attempts = 0;
            }
            (S::WithdrawErrorSms, A::SubmitSms { code }) => {
                self.forward(WithdrawalAction::SubmitSms { code: code.clone() });
                next.status = S::WithdrawProcessing;
            }
            (S::WithdrawRetrying, A::RetryWithdrawal) => {
                self.forward(WithdrawalAction::Retry);
                next.status = S::WithdrawProcessing;
            }
            (S::WithdrawProcessing | S::WithdrawError2fa, A::Withdrawal2faInvalid) => {
                let moved = self.forward(WithdrawalAction::Requires2fa);
                if !moved && self.child_status() != Some(WithdrawalStatus::WaitingFor2fa) {
                    return StepResult::Ignored;
                }
                let attempts = state.context.invalid_2fa_attempts + 1;
                next.context.invalid_2fa_attempts = attempts;
                fail(
                    &mut next,
                    S::WithdrawError2fa,
                    DomainError::with_code(
                        "TWO_FACTOR_INVALID",
                        format!("The 2FA code was rejected (attempt {attempts}). Enter a new code."),
                    ),
                );
            }
            (S::WithdrawProcessing, A::WithdrawalInsufficientBalance)
                if self.child_status() == Some(WithdrawalStatus::Processing) =>
            {
                fail(
                    &mut next,
                    S::WithdrawErrorBalance,
                    DomainError::with_code(
                        "INSUFFICIENT_BALANCE",
                        "The wallet balance does not cover the withdrawal amount and fees.",
                    ),
                )
            }
            (_, A::WithdrawalRequires2fa) => {
                return self.forward_and_sync(state, action, WithdrawalAction::Requires2fa)
            }
            (_, A::WithdrawalRequiresSms) => {
                return self.forward_and_sync(state, action, WithdrawalAction::RequiresSms)
            }
            (_, A::WithdrawalRequiresKyc) => {
                return self.forward_and_sync(state, action, WithdrawalAction::RequiresKyc)
            }
            (_, A::Withdrawal2faMethodNotSupported { result }) => {
                next.context.error_details = serde_json::to_value(result).ok();
                fail(
                    &mut next,
                    S::WithdrawFatal,
                    DomainError::with_code(
                        "TWO_FACTOR_METHOD_NOT_SUPPORTED",
                        unsupported_two_factor_message(&result.valid_2fa_methods),
                    ),
                );
            }
            (_, A::WithdrawalSuccess { transaction_id }) => {
                // The flow stays in processing until WITHDRAWAL_COMPLETED.
                self.forward(WithdrawalAction::Success {
                    transaction_id: transaction_id.clone(),
                });
                return StepResult::Ignored;
            }
            (_, A::WithdrawalFailed { error }) => {
                let failed = WithdrawalAction::Fail {
                    error: error.clone(),
                };
                return self.forward_and_sync(state, action, failed);
            }
            (_, A::WithdrawalBlocked { reason }) => {
                let blocked = WithdrawalAction::Blocked {
                    reason: reason.clone(),
                };
                return self.forward_and_sync(state, action, blocked);
            }
            (_, A::WithdrawalFatal { error }) => {
                next.context.error_details = error.details.clone();
                fail(&mut next, S::WithdrawFatal, error.clone());
            }
            _ => return StepResult::Ignored,
        }
        StepResult::Transitioned(next)
    }

    /// Derive the flow state from the sub-machine's current state.
    ///
    /// Returns `None` when the flow already agrees with the sub-machine.
    fn sync(&self, state: &FlowState, action: &FlowAction) -> Option<FlowState> {
        use FlowStatus as S;
        use WithdrawalStatus as W;

        let child = self.withdrawal.as_ref()?.state().ok()?;
        let mut next = state.clone();
        match (child.status, action) {
            (W::WaitingFor2fa, _) if state.status != S::WithdrawError2fa => fail(
                &mut next,
                S::WithdrawError2fa,
                DomainError::with_code(
                    "TWO_FACTOR_REQUIRED",
                    "Enter the 2FA code from your authenticator to continue.",
                ),
            ),
            (W::WaitingForSms, _) if state.status != S::WithdrawErrorSms => fail(
                &mut next,
                S::WithdrawErrorSms,
                DomainError::with_code(
                    "SMS_REQUIRED",
                    "Enter the code sent to your phone to continue.",
                ),
            ),
            (W::WaitingForKyc, _) if state.status != S::WithdrawErrorKyc => fail(
                &mut next,
                S::WithdrawErrorKyc,
                DomainError::with_code(
                    "KYC_REQUIRED",
                    "Complete identity verification on the exchange to continue.",
                ),
            ),
            (W::Retrying, _) if state.status != S::WithdrawRetrying => {
                next.status = S::WithdrawRetrying;
                next.context.retry_attempts += 1;
                if let Some(error) = &child.context.last_error {
                    next.error = Some(error.clone());
                }
            }
            (W::Blocked, FlowAction::WithdrawalBlocked { .. }) => {
                next.status = S::WithdrawBlocked;
                next.error = child.error.clone().or(next.error);
            }
            (W::Completed, FlowAction::WithdrawalCompleted { transaction_id }) => {
                next.status = S::WithdrawCompleted;
                next.context.withdrawal = Some(WithdrawalRecord {
                    id: child.context.quote_id.clone().unwrap_or_default(),
                    status: WithdrawalOutcome::Completed,
                    transaction_id: transaction_id.clone(),
                });
            }
            (W::Failed, _) => {
                next.status = S::WithdrawFatal;
                next.error = child.context.last_error.clone().or(next.error);
            }
            _ => return None,
        }
        Some(next)
    }

    fn forward_and_sync(
        &mut self,
        state: &FlowState,
        action: &FlowAction,
        child_action: WithdrawalAction,
    ) -> StepResult<FlowState> {
        if !self.forward(child_action) {
            return StepResult::Ignored;
        }
        match self.sync(state, action) {
            Some(next) => StepResult::Transitioned(next),
            None => StepResult::Ignored,
        }
    }

    /// Current status of the sub-machine, if one is live.
    fn child_status(&self) -> Option<WithdrawalStatus> {
        self.withdrawal
            .as_ref()
            .and_then(|child| child.state().ok())
            .map(|child| child.status)
    }

    /// Send an action to the sub-machine. Returns `true` if it moved.
    fn forward(&mut self, action: WithdrawalAction) -> bool {
        let Some(child) = self.withdrawal.as_mut() else {
            warn!(action = ?action, "no withdrawal in progress, dropping action");
            return false;
        };
        match child.send(action) {
            Ok(moved) => moved,
            Err(err) => {
                warn!(error = %err, "withdrawal machine unavailable");
                false
            }
        }
    }

    fn cancel(&mut self, state: &FlowState) -> StepResult<FlowState> {
        if state.status.is_final() {
            return StepResult::Ignored;
        }
        if let Some(mut child) = self.withdrawal.take() {
            child.dispose();
        }
        info!(from = state.status.as_str(), "flow cancelled");

        let mut next = state.clone();
        next.status = FlowStatus::FlowCancelled;
        StepResult::Transitioned(next)
    }
}

fn fail(next: &mut FlowState, status: FlowStatus, error: DomainError) {
    next.status = status;
    next.error = Some(error);
}

impl Transition<FlowState, FlowAction> for FlowTransition {
    fn apply(&mut self, state: &FlowState, action: &FlowAction) -> StepResult<FlowState> {
        let step = if state.status.is_withdrawing() {
            self.withdraw(state, action)
        } else {
            self.step(state, action)
        };

        match (step, action) {
            (StepResult::Ignored, FlowAction::CancelFlow) => self.cancel(state),
            (step, _) => step,
        }
    }

    fn dispose(&mut self) {
        if let Some(mut child) = self.withdrawal.take() {
            child.dispose();
        }
    }
}
