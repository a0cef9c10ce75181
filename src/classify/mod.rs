//! Routing of API errors into flow actions.
//!
//! Classification is fail-closed: only a fixed allow-list of conditions
//! (2FA/SMS/KYC required, insufficient balance, expired quote) is
//! recoverable. A missing or unrecognized code is fatal.

mod codes;
mod messages;

pub use codes::{extract_code, raw_code, ErrorCode};
pub use messages::{
    unsupported_two_factor_message, AMOUNT_ABOVE_MAXIMUM_MESSAGE, AMOUNT_BELOW_MINIMUM_MESSAGE,
    INVALID_ADDRESS_MESSAGE,
};

use crate::error::DomainError;
use crate::flow::FlowAction;
use crate::model::TwoFactorMethodResult;
use tracing::warn;

/// Map a domain error to the action the flow should receive.
pub fn classify(error: &DomainError) -> FlowAction {
    match extract_code(error) {
        Some(ErrorCode::TwoFactorRequired) => FlowAction::WithdrawalRequires2fa,
        Some(ErrorCode::SmsRequired) => FlowAction::WithdrawalRequiresSms,
        Some(ErrorCode::KycRequired) => FlowAction::WithdrawalRequiresKyc,
        Some(ErrorCode::InsufficientBalance) => FlowAction::WithdrawalInsufficientBalance,
        Some(ErrorCode::QuoteExpired | ErrorCode::ResourceExhausted) => FlowAction::QuoteExpired,
        Some(ErrorCode::TwoFactorMethodNotSupported) => {
            FlowAction::Withdrawal2faMethodNotSupported {
                result: two_factor_result(error),
            }
        }
        Some(ErrorCode::InvalidAddress) => fatal_with(error, INVALID_ADDRESS_MESSAGE),
        Some(ErrorCode::AmountBelowMinimum) => fatal_with(error, AMOUNT_BELOW_MINIMUM_MESSAGE),
        Some(ErrorCode::AmountAboveMaximum) => fatal_with(error, AMOUNT_ABOVE_MAXIMUM_MESSAGE),
        Some(ErrorCode::Unknown(code)) => {
            warn!(code = %code, "unrecognized error code, treating as fatal");
            FlowAction::WithdrawalFatal {
                error: error.clone(),
            }
        }
        None => {
            warn!(message = %error.message, "error without a code, treating as fatal");
            FlowAction::WithdrawalFatal {
                error: error.clone(),
            }
        }
    }
}

/// [`classify`] for call sites where there may be no error at all.
pub fn classify_optional(error: Option<&DomainError>) -> Option<FlowAction> {
    error.map(classify)
}

/// Whether the error waits for user input rather than ending the run.
pub fn is_recoverable_error(error: &DomainError) -> bool {
    extract_code(error).is_some_and(|code| code.is_recoverable())
}

fn fatal_with(error: &DomainError, message: &str) -> FlowAction {
    FlowAction::WithdrawalFatal {
        error: DomainError {
            code: error.code.clone(),
            message: message.to_string(),
            details: error.details.clone(),
        },
    }
}

/// Decode the accepted 2FA methods from `details.result` or `details`.
fn two_factor_result(error: &DomainError) -> TwoFactorMethodResult {
    let Some(details) = error.details.as_ref() else {
        return TwoFactorMethodResult::default();
    };
    details
        .get("result")
        .into_iter()
        .chain(std::iter::once(details))
        .find_map(|candidate| {
            serde_json::from_value::<TwoFactorMethodResult>(candidate.clone())
                .ok()
                .filter(|result| !result.valid_2fa_methods.is_empty())
        })
        .unwrap_or_default()
}
