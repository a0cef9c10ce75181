//! Per-wallet balance previews.
//!
//! Independent of the flow machine. For every wallet the manager runs a
//! two-step check (ping, then balances) and publishes the full
//! wallet → status map to its subscribers after each change. Wallets are
//! checked concurrently, each wallet's own steps run in order.

use crate::balance::{to_wallet_balances, RawBalance};
use crate::classify::raw_code;
use crate::config::PreviewConfig;
use crate::engine::Subscription;
use crate::error::DomainError;
use crate::model::WalletBalance;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Preview status of one wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewStatus {
    Idle,
    Loading,
    Ready { balances: Vec<WalletBalance> },
    ErrorNotFound,
    ErrorInvalidCredentials,
    ErrorUnknown { error: DomainError },
}

/// Snapshot delivered to subscribers, keyed by wallet id.
pub type PreviewMap = BTreeMap<String, PreviewStatus>;

/// Exchange API calls the preview needs. Implemented by the host.
#[async_trait]
pub trait WalletProbe: Send + Sync {
    /// Verify that the wallet exists and its credentials are accepted.
    async fn ping(&self, wallet_id: &str) -> Result<(), DomainError>;

    async fn balances(&self, wallet_id: &str) -> Result<Vec<RawBalance>, DomainError>;
}

type Listener = Box<dyn FnMut(&PreviewMap) + Send>;

struct ListenerEntry {
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    wallets: PreviewMap,
    listeners: Vec<ListenerEntry>,
}

impl Registry {
    fn publish(&mut self) {
        self.listeners
            .retain(|entry| entry.active.load(Ordering::Acquire));
        for entry in &mut self.listeners {
            (entry.listener)(&self.wallets);
        }
    }
}

/// Observes a set of wallets through a [`WalletProbe`].
///
/// Listeners run while the registry lock is held and must not call back
/// into the manager.
pub struct PreviewManager<P> {
    probe: P,
    concurrency: usize,
    registry: Mutex<Registry>,
}

impl<P: WalletProbe> PreviewManager<P> {
    pub fn new(probe: P, config: &PreviewConfig) -> Self {
        Self {
            probe,
            concurrency: config.concurrency.max(1),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Register wallets as `idle` without checking them.
    pub fn track(&self, wallet_ids: &[String]) {
        let mut registry = self.lock();
        let mut added = false;
        for wallet_id in wallet_ids {
            if !registry.wallets.contains_key(wallet_id) {
                registry
                    .wallets
                    .insert(wallet_id.clone(), PreviewStatus::Idle);
                added = true;
            }
        }
        if added {
            registry.publish();
        }
    }

    /// Stop observing a wallet.
    pub fn forget(&self, wallet_id: &str) {
        let mut registry = self.lock();
        if registry.wallets.remove(wallet_id).is_some() {
            registry.publish();
        }
    }

    /// Current status of every known wallet.
    pub fn snapshot(&self) -> PreviewMap {
        self.lock().wallets.clone()
    }

    /// Register a listener; it receives the current map immediately.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&PreviewMap) + Send + 'static,
    {
        let subscription = Subscription::new();
        let mut listener: Listener = Box::new(listener);

        let mut registry = self.lock();
        listener(&registry.wallets);
        registry.listeners.push(ListenerEntry {
            active: subscription.flag(),
            listener,
        });
        subscription
    }

    /// Check the given wallets, at most `concurrency` at a time.
    pub async fn check(&self, wallet_ids: &[String]) {
        stream::iter(wallet_ids)
            .for_each_concurrent(Some(self.concurrency), |wallet_id| {
                self.check_wallet(wallet_id)
            })
            .await;
    }

    async fn check_wallet(&self, wallet_id: &str) {
        self.set(wallet_id, PreviewStatus::Loading);

        let status = match self.probe_wallet(wallet_id).await {
            Ok(raw) => PreviewStatus::Ready {
                balances: to_wallet_balances(raw),
            },
            Err(error) => {
                warn!(wallet_id, error = %error, "wallet preview failed");
                status_for_error(error)
            }
        };
        self.set(wallet_id, status);
    }

    async fn probe_wallet(&self, wallet_id: &str) -> Result<Vec<RawBalance>, DomainError> {
        self.probe.ping(wallet_id).await?;
        self.probe.balances(wallet_id).await
    }

    fn set(&self, wallet_id: &str, status: PreviewStatus) {
        debug!(wallet_id, status = ?status, "wallet preview updated");
        let mut registry = self.lock();
        registry.wallets.insert(wallet_id.to_string(), status);
        registry.publish();
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn status_for_error(error: DomainError) -> PreviewStatus {
    let code = raw_code(&error)
        .map(|raw| raw.to_ascii_uppercase().replace(['-', ' '], "_"))
        .unwrap_or_default();

    match code.as_str() {
        "NOT_FOUND" | "WALLET_NOT_FOUND" => PreviewStatus::ErrorNotFound,
        "INVALID_CREDENTIALS" | "UNAUTHENTICATED" | "UNAUTHORIZED" => {
            PreviewStatus::ErrorInvalidCredentials
        }
        _ => PreviewStatus::ErrorUnknown { error },
    }
}
