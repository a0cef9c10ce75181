//! The `State` trait shared by every machine snapshot and status enum.
//!
//! States are plain values. Inspecting them is pure; the engine uses
//! these methods only for naming, terminal detection and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// Implemented by the closed status enumerations (usually through
/// [`status_enum!`](crate::status_enum)) and by the full snapshots that
/// wrap a status together with its context and error.
///
/// # Example
///
/// ```rust
/// use exchange_connect::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Light {
///     Green,
///     Off,
/// }
///
/// impl State for Light {
///     fn name(&self) -> &str {
///         match self {
///             Self::Green => "light:green",
///             Self::Off => "light:off",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Off)
///     }
/// }
///
/// assert_eq!(Light::Green.name(), "light:green");
/// assert!(Light::Off.is_final());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Wire name of the state, e.g. `"withdraw:error2FA"`.
    fn name(&self) -> &str;

    /// Terminal states accept no further actions that change the type.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Whether the state represents a failure (recoverable or not).
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
