//! Transition table and machine wrapper for a single withdrawal attempt.

use crate::core::TransitionHistory;
use crate::engine::{Machine, StepResult, Subscription};
use crate::error::{DomainError, MachineError};
use crate::withdrawal::types::{
    RequiredAction, WithdrawalAction, WithdrawalState, WithdrawalStatus,
};
use uuid::Uuid;

type TransitionFn = fn(&WithdrawalState, &WithdrawalAction) -> StepResult<WithdrawalState>;

/// Generate an idempotency key that differs from `previous`.
pub fn rotate_idempotency_key(previous: Option<&str>) -> String {
    loop {
        let key = Uuid::new_v4().to_string();
        if previous != Some(key.as_str()) {
            return key;
        }
    }
}

/// The withdrawal transition table.
///
/// `FAIL` while processing is the only automatic retry path: it moves to
/// `retrying` while `retry_count < max_retries`, and to `failed` after.
pub fn transition(
    state: &WithdrawalState,
    action: &WithdrawalAction,
) -> StepResult<WithdrawalState> {
    use WithdrawalAction as A;
    use WithdrawalStatus as S;

    let mut next = state.clone();
    match (state.status, action) {
        (S::Idle, A::Execute { quote_id, wallet_id }) => {
            next.status = S::Processing;
            next.context.quote_id = Some(quote_id.clone());
            next.context.wallet_id = Some(wallet_id.clone());
            next.context.idempotency_key = Some(rotate_idempotency_key(
                state.context.idempotency_key.as_deref(),
            ));
            next.context.retry_count = 0;
        }
        (S::Processing, A::Requires2fa) => {
            await_step_up(&mut next, S::WaitingFor2fa, RequiredAction::TwoFactor)
        }
        (S::Processing, A::RequiresSms) => {
            await_step_up(&mut next, S::WaitingForSms, RequiredAction::Sms)
        }
        (S::Processing, A::RequiresKyc) => {
            await_step_up(&mut next, S::WaitingForKyc, RequiredAction::Kyc)
        }
        (S::WaitingFor2fa, A::Submit2fa { code }) => {
            next.status = S::Processing;
            next.context.two_factor_code = Some(code.clone());
            next.context.required_actions.clear();
        }
        (S::WaitingForSms, A::SubmitSms { code }) => {
            next.status = S::Processing;
            next.context.sms_code = Some(code.clone());
            next.context.required_actions.clear();
        }
        (S::Processing, A::Success { transaction_id }) => {
            next.status = S::Completed;
            next.context.transaction_id = Some(transaction_id.clone());
        }
        (S::Processing, A::Fail { error }) => {
            if state.context.retry_count < state.context.max_retries {
                next.status = S::Retrying;
                next.context.retry_count += 1;
            } else {
                next.status = S::Failed;
            }
            next.context.last_error = Some(error.clone());
            next.error = Some(error.clone());
        }
        (S::Retrying, A::Retry) => {
            next.status = S::Processing;
            next.context.idempotency_key = Some(rotate_idempotency_key(
                state.context.idempotency_key.as_deref(),
            ));
        }
        (S::Processing, A::Blocked { reason }) => {
            next.status = S::Blocked;
            next.error = Some(DomainError::with_code("WITHDRAWAL_BLOCKED", reason.clone()));
        }
        _ => return StepResult::Ignored,
    }
    StepResult::Transitioned(next)
}

fn await_step_up(next: &mut WithdrawalState, status: WithdrawalStatus, required: RequiredAction) {
    next.status = status;
    next.context.required_actions = vec![required];
}

/// One withdrawal attempt, owned by the flow machine.
pub struct WithdrawalMachine {
    machine: Machine<WithdrawalState, WithdrawalAction, TransitionFn>,
}

impl WithdrawalMachine {
    pub fn new(max_retries: u32) -> Self {
        Self {
            machine: Machine::new(
                "withdrawal",
                WithdrawalState::initial(max_retries),
                transition as TransitionFn,
            ),
        }
    }

    pub fn state(&self) -> Result<&WithdrawalState, MachineError> {
        self.machine.state()
    }

    pub fn send(&mut self, action: WithdrawalAction) -> Result<bool, MachineError> {
        self.machine.send(action)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Result<Subscription, MachineError>
    where
        F: FnMut(&WithdrawalState) + Send + 'static,
    {
        self.machine.subscribe(listener)
    }

    pub fn history(&self) -> Result<&TransitionHistory, MachineError> {
        self.machine.history()
    }

    pub fn is_disposed(&self) -> bool {
        self.machine.is_disposed()
    }

    pub fn dispose(&mut self) {
        self.machine.dispose();
    }
}
