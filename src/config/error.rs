//! Configuration error types.

use thiserror::Error;

/// A single rule a configuration value broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    #[error("withdrawal.max_retries is {found}, the ceiling is {ceiling}")]
    RetryCeilingExceeded { found: u32, ceiling: u32 },

    #[error("preview.concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed values break one or more rules
    #[error("Invalid configuration: {}", format_violations(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
