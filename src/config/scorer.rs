//! Sentiment scorer and retry configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// External scorer process configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerConfig {
    /// Executable to spawn
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments (whitespace-separated)
    #[serde(default = "default_args")]
    pub args: String,

    /// Hard limit on a single scoring call in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ScorerConfig {
    pub fn args_list(&self) -> Vec<String> {
        self.args.split_whitespace().map(str::to_string).collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate scorer configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.command.trim().is_empty() {
            return Err(ValidationError::MissingRequired("SCORER__COMMAND"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout("scorer.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_command() -> String {
    "python3".to_string()
}

fn default_args() -> String {
    "sentiment_pipeline.py".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Retry policy for transient ledger and scorer failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles each time
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on a single delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Validate retry configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 || self.base_delay_ms == 0 {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}
