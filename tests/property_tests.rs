//! Property-based tests for the flow and withdrawal machines.
//!
//! These tests use proptest to drive the machines with random action
//! sequences and check the replay guarantees hold for all of them.

use chrono::{TimeZone, Utc};
use exchange_connect::config::FlowConfig;
use exchange_connect::error::DomainError;
use exchange_connect::flow::{FlowAction, FlowMachine, FlowState, FlowStatus};
use exchange_connect::model::{Quote, QuoteRequest, TwoFactorMethodResult, WalletBalance};
use exchange_connect::withdrawal::{WithdrawalAction, WithdrawalMachine, WithdrawalStatus};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn quote(id: &str) -> Quote {
    Quote {
        id: id.to_string(),
        asset: "BTC".to_string(),
        amount: "0.5".to_string(),
        network_fee: "0.0001".to_string(),
        network_fee_fiat: Some("6.10".to_string()),
        total: "0.5001".to_string(),
        total_fiat: None,
        expires_at: Utc.timestamp_millis_opt(4_102_444_800_000).unwrap(),
    }
}

fn request_quote() -> FlowAction {
    FlowAction::RequestQuote(QuoteRequest {
        asset: "BTC".to_string(),
        amount: "0.5".to_string(),
        destination_address: "addr".to_string(),
        network: Some("bitcoin".to_string()),
    })
}

/// Every action kind except `WITHDRAWAL_2FA_INVALID`, which counts
/// attempts and is therefore not idempotent.
fn replayable_actions() -> Vec<FlowAction> {
    let error = DomainError::with_code("UPSTREAM", "exchange timeout");
    vec![
        FlowAction::LoadExchanges,
        FlowAction::ExchangesLoaded { exchanges: vec![] },
        FlowAction::ExchangesFailed {
            error: error.clone(),
        },
        FlowAction::StartOauth {
            exchange: "coinbase".to_string(),
            wallet_id: "w1".to_string(),
            idem: "idem-1".to_string(),
        },
        FlowAction::OauthWindowOpened,
        FlowAction::OauthCompleted {
            wallet_id: "w1".to_string(),
        },
        FlowAction::OauthFailed {
            error: error.clone(),
        },
        FlowAction::LoadWallet,
        FlowAction::WalletLoaded {
            balances: vec![WalletBalance::new("BTC", "1.0")],
        },
        FlowAction::WalletFailed {
            error: error.clone(),
        },
        request_quote(),
        FlowAction::QuoteReceived { quote: quote("q1") },
        FlowAction::QuoteFailed {
            error: error.clone(),
        },
        FlowAction::QuoteExpired,
        FlowAction::StartWithdrawal {
            quote_id: "q1".to_string(),
        },
        FlowAction::Submit2fa {
            code: "000000".to_string(),
        },
        FlowAction::SubmitSms {
            code: "4242".to_string(),
        },
        FlowAction::RetryWithdrawal,
        FlowAction::WithdrawalInsufficientBalance,
        FlowAction::WithdrawalRequires2fa,
        FlowAction::WithdrawalRequiresSms,
        FlowAction::WithdrawalRequiresKyc,
        FlowAction::Withdrawal2faMethodNotSupported {
            result: TwoFactorMethodResult::default(),
        },
        FlowAction::WithdrawalSuccess {
            transaction_id: "tx1".to_string(),
        },
        FlowAction::WithdrawalFailed {
            error: error.clone(),
        },
        FlowAction::WithdrawalBlocked {
            reason: "frozen".to_string(),
        },
        FlowAction::WithdrawalCompleted {
            transaction_id: "tx1".to_string(),
        },
        FlowAction::WithdrawalFatal { error },
        FlowAction::CancelFlow,
    ]
}

/// The withdraw-region actions, plus expiry.
fn withdraw_actions() -> Vec<FlowAction> {
    vec![
        FlowAction::Submit2fa {
            code: "000000".to_string(),
        },
        FlowAction::SubmitSms {
            code: "4242".to_string(),
        },
        FlowAction::RetryWithdrawal,
        FlowAction::Withdrawal2faInvalid,
        FlowAction::WithdrawalInsufficientBalance,
        FlowAction::WithdrawalRequires2fa,
        FlowAction::WithdrawalRequiresSms,
        FlowAction::WithdrawalRequiresKyc,
        FlowAction::WithdrawalSuccess {
            transaction_id: "tx1".to_string(),
        },
        FlowAction::WithdrawalFailed {
            error: DomainError::with_code("UPSTREAM", "exchange timeout"),
        },
        FlowAction::WithdrawalCompleted {
            transaction_id: "tx1".to_string(),
        },
        FlowAction::QuoteExpired,
    ]
}

fn quote_ready() -> FlowMachine {
    let mut flow = FlowMachine::new("org-1", "proj-1");
    for action in [
        FlowAction::StartOauth {
            exchange: "coinbase".to_string(),
            wallet_id: "w1".to_string(),
            idem: "idem-1".to_string(),
        },
        FlowAction::OauthWindowOpened,
        FlowAction::OauthCompleted {
            wallet_id: "w1".to_string(),
        },
        FlowAction::LoadWallet,
        FlowAction::WalletLoaded {
            balances: vec![WalletBalance::new("BTC", "1.0")],
        },
        request_quote(),
        FlowAction::QuoteReceived { quote: quote("q1") },
    ] {
        flow.send(action).unwrap();
    }
    flow
}

fn walk(flow: &mut FlowMachine, pool: &[FlowAction], steps: &[usize]) {
    for &index in steps {
        flow.send(pool[index % pool.len()].clone()).unwrap();
    }
}

fn snapshot(flow: &FlowMachine) -> FlowState {
    flow.state().unwrap().clone()
}

proptest! {
    #[test]
    fn duplicate_actions_are_idempotent(
        prefix in prop::collection::vec(any::<usize>(), 0..40),
        pick in any::<usize>(),
        from_quote in any::<bool>(),
    ) {
        let pool = replayable_actions();
        let mut flow = if from_quote { quote_ready() } else { FlowMachine::new("org-1", "proj-1") };
        walk(&mut flow, &pool, &prefix);

        let action = pool[pick % pool.len()].clone();
        flow.send(action.clone()).unwrap();
        let once = snapshot(&flow);
        let moved = flow.send(action).unwrap();

        prop_assert!(!moved);
        prop_assert_eq!(snapshot(&flow), once);
    }

    #[test]
    fn ignored_actions_leave_state_and_subscribers_untouched(
        prefix in prop::collection::vec(any::<usize>(), 0..40),
        probe in any::<usize>(),
    ) {
        let pool = replayable_actions();
        let mut flow = quote_ready();
        walk(&mut flow, &pool, &prefix);

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        flow.subscribe(move |_: &FlowState| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let before = snapshot(&flow);
        let recorded = flow.history().unwrap().len();
        let moved = flow.send(pool[probe % pool.len()].clone()).unwrap();

        if moved {
            prop_assert_eq!(notified.load(Ordering::SeqCst), 2);
            prop_assert_eq!(flow.history().unwrap().len(), recorded + 1);
        } else {
            prop_assert_eq!(notified.load(Ordering::SeqCst), 1);
            prop_assert_eq!(flow.history().unwrap().len(), recorded);
            prop_assert_eq!(snapshot(&flow), before);
        }
    }

    #[test]
    fn first_quote_response_wins(requests in 1usize..5, responses in 1usize..5) {
        let mut flow = quote_ready();
        for _ in 0..requests {
            flow.send(request_quote()).unwrap();
        }
        for n in 0..responses {
            flow.send(FlowAction::QuoteReceived { quote: quote(&format!("fresh-{n}")) }).unwrap();
        }

        let state = snapshot(&flow);
        prop_assert_eq!(state.status, FlowStatus::QuoteReady);
        prop_assert_eq!(state.context.quote.map(|q| q.id), Some("fresh-0".to_string()));
    }

    #[test]
    fn quote_expiry_never_changes_a_withdraw_state(
        steps in prop::collection::vec(any::<usize>(), 0..30),
    ) {
        let pool = withdraw_actions();
        let mut flow = quote_ready();
        flow.send(FlowAction::StartWithdrawal { quote_id: "q1".to_string() }).unwrap();

        for index in steps {
            flow.send(pool[index % pool.len()].clone()).unwrap();
            let status = flow.state().unwrap().status;
            prop_assert!(status.is_withdraw_region() || status == FlowStatus::FlowCancelled);

            prop_assert!(!flow.send(FlowAction::QuoteExpired).unwrap());
            prop_assert_eq!(flow.state().unwrap().status, status);
        }
    }

    #[test]
    fn retry_budget_is_exact_and_keys_rotate(max_retries in 0u32..=10) {
        let mut machine = WithdrawalMachine::new(max_retries);
        machine.send(WithdrawalAction::Execute {
            quote_id: "q1".to_string(),
            wallet_id: "w1".to_string(),
        })
        .unwrap();

        let mut keys = HashSet::new();
        keys.insert(machine.state().unwrap().context.idempotency_key.clone());

        for attempt in 1..=max_retries {
            machine.send(WithdrawalAction::Fail {
                error: DomainError::new("timeout"),
            })
            .unwrap();
            prop_assert_eq!(machine.state().unwrap().status, WithdrawalStatus::Retrying);
            prop_assert_eq!(machine.state().unwrap().context.retry_count, attempt);

            machine.send(WithdrawalAction::Retry).unwrap();
            let key = machine.state().unwrap().context.idempotency_key.clone();
            prop_assert!(keys.insert(key), "idempotency key reused");
        }

        machine.send(WithdrawalAction::Fail {
            error: DomainError::new("timeout"),
        })
        .unwrap();
        prop_assert_eq!(machine.state().unwrap().status, WithdrawalStatus::Failed);
    }

    #[test]
    fn invalid_codes_are_counted_and_reset(invalid in 1u32..10) {
        let mut flow = quote_ready();
        flow.send(FlowAction::StartWithdrawal { quote_id: "q1".to_string() }).unwrap();

        for _ in 0..invalid {
            flow.send(FlowAction::Withdrawal2faInvalid).unwrap();
        }
        prop_assert_eq!(flow.state().unwrap().context.invalid_2fa_attempts, invalid);
        prop_assert_eq!(flow.state().unwrap().status, FlowStatus::WithdrawError2fa);

        flow.send(FlowAction::Submit2fa { code: "000000".to_string() }).unwrap();
        prop_assert_eq!(flow.state().unwrap().context.invalid_2fa_attempts, 0);
        prop_assert_eq!(flow.state().unwrap().status, FlowStatus::WithdrawProcessing);
    }

    #[test]
    fn history_matches_what_subscribers_saw(
        steps in prop::collection::vec(any::<usize>(), 0..40),
    ) {
        let pool = replayable_actions();
        let mut flow = FlowMachine::new("org-1", "proj-1");
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        flow.subscribe(move |state: &FlowState| {
            sink.lock().unwrap().push(state.status.as_str().to_string());
        })
        .unwrap();

        walk(&mut flow, &pool, &steps);

        let seen = seen.lock().unwrap().clone();
        let history = flow.history().unwrap();
        if history.is_empty() {
            prop_assert_eq!(seen, vec!["idle".to_string()]);
        } else {
            prop_assert_eq!(history.path(), seen.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn configured_retry_budget_reaches_the_sub_machine(max_retries in 0u32..=10) {
        let mut config = FlowConfig::default();
        config.withdrawal.max_retries = max_retries;
        let mut flow = FlowMachine::with_config("org-1", "proj-1", &config);
        prop_assert_eq!(flow.state().unwrap().context.max_retry_attempts, max_retries);

        for action in [
            FlowAction::StartOauth {
                exchange: "coinbase".to_string(),
                wallet_id: "w1".to_string(),
                idem: "idem-1".to_string(),
            },
            FlowAction::OauthWindowOpened,
            FlowAction::OauthCompleted { wallet_id: "w1".to_string() },
            FlowAction::LoadWallet,
            FlowAction::WalletLoaded { balances: vec![] },
            request_quote(),
            FlowAction::QuoteReceived { quote: quote("q1") },
            FlowAction::StartWithdrawal { quote_id: "q1".to_string() },
        ] {
            flow.send(action).unwrap();
        }
        let child = flow.withdrawal().unwrap().cloned();
        prop_assert_eq!(child.map(|c| c.context.max_retries), Some(max_retries));
    }
}
