//! Values exchanged with the exchange API and carried in flow context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An exchange the user can connect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// A withdrawal network available for an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_withdrawal: Option<String>,
}

/// Balance of one asset in a connected wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub asset: String,
    pub balance: String,
    #[serde(default)]
    pub networks: Vec<Network>,
}

impl WalletBalance {
    pub fn new(asset: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            balance: balance.into(),
            networks: Vec::new(),
        }
    }
}

/// Parameters of the most recent quote request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub asset: String,
    pub amount: String,
    pub destination_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// A single-use, time-bounded withdrawal quote.
///
/// `expires_at` is an absolute instant, serialized as epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub asset: String,
    pub amount: String,
    pub network_fee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_fee_fiat: Option<String>,
    pub total: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fiat: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl Quote {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, or `None` once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .signed_duration_since(now)
            .to_std()
            .ok()
            .filter(|left| !left.is_zero())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalOutcome {
    Completed,
}

/// Record of a completed withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRecord {
    pub id: String,
    pub status: WithdrawalOutcome,
    pub transaction_id: String,
}

/// Payload of a "2FA method not supported" error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoFactorMethodResult {
    #[serde(rename = "valid2FAMethods", default)]
    pub valid_2fa_methods: Vec<String>,
}
