//! Known API error codes.

use crate::error::DomainError;

/// Error codes the flow knows how to route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    TwoFactorRequired,
    SmsRequired,
    KycRequired,
    InsufficientBalance,
    QuoteExpired,
    ResourceExhausted,
    TwoFactorMethodNotSupported,
    InvalidAddress,
    AmountBelowMinimum,
    AmountAboveMaximum,
    Unknown(String),
}

impl ErrorCode {
    /// Parse a raw code. Matching is case-insensitive and accepts aliases.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "TWO_FACTOR_REQUIRED" | "2FA_REQUIRED" | "MFA_REQUIRED" => Self::TwoFactorRequired,
            "SMS_REQUIRED" | "SMS_VERIFICATION_REQUIRED" => Self::SmsRequired,
            "KYC_REQUIRED" | "IDENTITY_VERIFICATION_REQUIRED" => Self::KycRequired,
            "INSUFFICIENT_BALANCE" | "INSUFFICIENT_FUNDS" => Self::InsufficientBalance,
            "QUOTE_EXPIRED" => Self::QuoteExpired,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "TWO_FACTOR_METHOD_NOT_SUPPORTED" | "2FA_METHOD_NOT_SUPPORTED" => {
                Self::TwoFactorMethodNotSupported
            }
            "INVALID_ADDRESS" => Self::InvalidAddress,
            "AMOUNT_BELOW_MINIMUM" => Self::AmountBelowMinimum,
            "AMOUNT_ABOVE_MAXIMUM" => Self::AmountAboveMaximum,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Conditions that wait for a user follow-up instead of ending the run.
    ///
    /// Everything not listed here is fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TwoFactorRequired
                | Self::SmsRequired
                | Self::KycRequired
                | Self::InsufficientBalance
                | Self::QuoteExpired
                | Self::ResourceExhausted
        )
    }
}

/// The raw code string, read from `code` with a fallback to `details.code`.
///
/// Blank codes count as missing.
pub fn raw_code(error: &DomainError) -> Option<&str> {
    let raw = error
        .code
        .as_deref()
        .or_else(|| {
            error
                .details
                .as_ref()
                .and_then(|details| details.get("code"))
                .and_then(|code| code.as_str())
        })?
        .trim();

    (!raw.is_empty()).then_some(raw)
}

/// Parse the error code of `error`, see [`raw_code`].
pub fn extract_code(error: &DomainError) -> Option<ErrorCode> {
    raw_code(error).map(ErrorCode::parse)
}
