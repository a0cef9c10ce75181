//! Conversion of raw API balance records into [`WalletBalance`] values.
//!
//! Shared by `WALLET_LOADED` producers and the preview manager.

use crate::model::{Network, WalletBalance};
use serde::{Deserialize, Serialize};

/// Balance record as returned by the exchange API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalance {
    pub asset: String,
    pub balance: String,
    #[serde(default)]
    pub networks: Vec<RawNetwork>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNetwork {
    pub name: String,
    #[serde(default)]
    pub minimum_withdrawal: Option<String>,
}

/// Normalize raw balances.
///
/// Asset symbols are trimmed and upper-cased, records without an asset
/// are dropped, duplicates keep the first balance and collect the union
/// of their networks. The result is sorted by asset.
pub fn to_wallet_balances(raw: Vec<RawBalance>) -> Vec<WalletBalance> {
    let mut balances: Vec<WalletBalance> = Vec::with_capacity(raw.len());

    for record in raw {
        let asset = record.asset.trim().to_uppercase();
        if asset.is_empty() {
            continue;
        }
        let networks = record.networks.into_iter().map(to_network);

        match balances.iter_mut().find(|b| b.asset == asset) {
            Some(existing) => {
                for network in networks {
                    if !existing.networks.iter().any(|n| n.name == network.name) {
                        existing.networks.push(network);
                    }
                }
            }
            None => {
                let mut balance = WalletBalance::new(asset, record.balance.trim());
                for network in networks {
                    if !balance.networks.iter().any(|n| n.name == network.name) {
                        balance.networks.push(network);
                    }
                }
                balances.push(balance);
            }
        }
    }

    balances.sort_by(|a, b| a.asset.cmp(&b.asset));
    balances
}

fn to_network(raw: RawNetwork) -> Network {
    Network {
        name: raw.name.trim().to_lowercase(),
        minimum_withdrawal: raw.minimum_withdrawal,
    }
}
