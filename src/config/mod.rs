//! Flow configuration.
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! [withdrawal]
//! max_retries = 3
//!
//! [preview]
//! concurrency = 4
//! ```
//!
//! Validation uses Stillwater's `Validation` so that every broken rule is
//! reported in one pass.

pub mod error;

pub use error::{ConfigError, ConfigViolation};

use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Upper bound for automatic withdrawal retries.
pub const MAX_RETRY_CEILING: u32 = 10;

type Checked = Validation<(), NonEmptyVec<ConfigViolation>>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub withdrawal: WithdrawalConfig,
    pub preview: PreviewConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalConfig {
    /// Automatic retries after `FAIL` before the attempt is failed
    pub max_retries: u32,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Wallets checked at the same time
    pub concurrency: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl FlowConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: FlowConfig = toml::from_str(input)?;
        config.validated()
    }

    /// Check every rule, accumulating all violations.
    pub fn validate(&self) -> Checked {
        let retries: Checked = if self.withdrawal.max_retries > MAX_RETRY_CEILING {
            Validation::fail(ConfigViolation::RetryCeilingExceeded {
                found: self.withdrawal.max_retries,
                ceiling: MAX_RETRY_CEILING,
            })
        } else {
            Validation::success(())
        };

        let concurrency: Checked = if self.preview.concurrency == 0 {
            Validation::fail(ConfigViolation::ZeroConcurrency)
        } else {
            Validation::success(())
        };

        Validation::all_vec(vec![retries, concurrency]).map(|_| ())
    }

    /// Consume the config, returning it only if every rule holds.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(violations) => Err(ConfigError::Invalid(
                violations.iter().cloned().collect(),
            )),
        }
    }
}
