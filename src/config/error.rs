//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid ledger RPC URL format")]
    InvalidRpcUrl,

    #[error("Invalid object id for {0}")]
    InvalidObjectId(&'static str),

    #[error("Gas budget must be positive")]
    InvalidGasBudget,

    #[error("Thresholds must lie in [0, 1]")]
    InvalidThresholds,

    #[error("Vote codes must be distinct")]
    InvalidVoteCodes,

    #[error("Buffer capacity must be between 1 and 10000")]
    InvalidBufferCapacity,

    #[error("Intake queue capacity must be positive")]
    InvalidIntakeCapacity,

    #[error("Retry policy requires at least one attempt and a positive delay")]
    InvalidRetryPolicy,
}
