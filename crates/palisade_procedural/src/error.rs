//! # Settlement Error Types
//!
//! Generation itself never fails: exhausted placement slots, isolated sites
//! and incomplete walls are valid results. The only errors are configuration
//! errors, caught once when the configuration is loaded.

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    /// A `min`/`max` pair is out of order.
    #[error("invalid range for {field}: min {min} > max {max}")]
    InvalidRange {
        /// The offending setting.
        field: &'static str,
        /// The configured minimum.
        min: f64,
        /// The configured maximum.
        max: f64,
    },

    /// A setting that must be strictly positive is not.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// The offending setting.
        field: &'static str,
        /// The configured value.
        value: f64,
    },

    /// A setting that must lie strictly between 0 and 1 does not.
    #[error("{field} must be in (0, 1), got {value}")]
    InvalidFraction {
        /// The offending setting.
        field: &'static str,
        /// The configured value.
        value: f64,
    },

    /// Two settings contradict each other.
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),
}

/// Result type for configuration operations.
pub type SettlementResult<T> = Result<T, SettlementError>;

impl From<toml::de::Error> for SettlementError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<std::io::Error> for SettlementError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
