//! `status_enum!` used from a downstream crate.

mod shadowed {
    // A local `serde` module must not capture the derive paths.
    #[allow(dead_code)]
    mod serde {}

    exchange_connect::status_enum! {
        pub enum Payout {
            Pending => "payout:pending",
            Sent => "payout:sent",
            Rejected => "payout:rejected",
        }
        final: [Sent, Rejected]
        error: [Rejected]
    }
}

use exchange_connect::core::State;
use shadowed::Payout;

#[test]
fn expands_without_a_serde_import() {
    assert_eq!(Payout::Pending.name(), "payout:pending");
    assert!(Payout::Rejected.is_error());
    assert!(Payout::Sent.is_final());
    assert!(!Payout::Pending.is_final());
}

#[test]
fn wire_names_round_trip_through_json() {
    assert_eq!(
        serde_json::to_string(&Payout::Sent).unwrap(),
        "\"payout:sent\""
    );
    let back: Payout = serde_json::from_str("\"payout:rejected\"").unwrap();
    assert_eq!(back, Payout::Rejected);
}
