//! User-facing messages produced by classification.

pub const INVALID_ADDRESS_MESSAGE: &str =
    "The destination address is not valid for this asset and network.";
pub const AMOUNT_BELOW_MINIMUM_MESSAGE: &str =
    "The withdrawal amount is below the exchange minimum.";
pub const AMOUNT_ABOVE_MAXIMUM_MESSAGE: &str =
    "The withdrawal amount is above the exchange maximum.";

const ENABLE_TWO_FACTOR_MESSAGE: &str =
    "Two-factor authentication must be enabled on your exchange account to withdraw.";

/// Explain which 2FA methods the exchange accepts.
///
/// ```
/// use exchange_connect::classify::unsupported_two_factor_message;
///
/// let methods = vec!["TOTP".to_string(), "SMS".to_string(), "Passkey".to_string()];
/// assert!(unsupported_two_factor_message(&methods)
///     .ends_with("TOTP, SMS, and Passkey are the only supported methods."));
/// ```
pub fn unsupported_two_factor_message(methods: &[String]) -> String {
    let prefix = "Your exchange account's 2FA method is not supported.";
    match methods {
        [] => ENABLE_TWO_FACTOR_MESSAGE.to_string(),
        [only] => format!("{prefix} {only} is the only supported method."),
        [first, second] => {
            format!("{prefix} {first} and {second} are the only supported methods.")
        }
        [init @ .., last] => format!(
            "{prefix} {}, and {last} are the only supported methods.",
            init.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn methods(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn no_methods_asks_to_enable_two_factor() {
        assert_eq!(
            unsupported_two_factor_message(&[]),
            ENABLE_TWO_FACTOR_MESSAGE
        );
    }

    #[test]
    fn single_method() {
        assert!(unsupported_two_factor_message(&methods(&["TOTP"]))
            .ends_with(" TOTP is the only supported method."));
    }

    #[test]
    fn two_methods() {
        assert!(unsupported_two_factor_message(&methods(&["TOTP", "SMS"]))
            .ends_with(" TOTP and SMS are the only supported methods."));
    }

    #[test]
    fn many_methods_use_serial_comma() {
        assert!(
            unsupported_two_factor_message(&methods(&["TOTP", "SMS", "Email", "Passkey"]))
                .ends_with(" TOTP, SMS, Email, and Passkey are the only supported methods.")
        );
    }
}
