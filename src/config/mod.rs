//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DAO_SENTIMENT_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use dao_sentiment::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod agent;
mod error;
mod ledger;
mod redis;
mod scorer;
mod server;

pub use agent::AgentConfig;
pub use error::{ConfigError, ValidationError};
pub use ledger::{LedgerBackend, LedgerConfig, SuiNetwork};
pub use redis::RedisConfig;
pub use scorer::{RetryConfig, ScorerConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the ledger credentials and object ids
/// are required when talking to a real node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger gateway configuration (network, key, object ids)
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Voting agent configuration (buffer, thresholds, vote codes)
    #[serde(default)]
    pub agent: AgentConfig,

    /// Sentiment scorer process
    #[serde(default)]
    pub scorer: ScorerConfig,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Redis pub/sub (optional)
    #[serde(default)]
    pub redis: RedisConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DAO_SENTIMENT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `DAO_SENTIMENT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DAO_SENTIMENT__LEDGER__DAO_ID=0x..` -> `ledger.dao_id = 0x..`
    /// - `DAO_SENTIMENT__AGENT__THRESHOLDS__CONFIDENCE_MIN=0.8`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DAO_SENTIMENT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ledger.validate()?;
        self.agent.validate()?;
        self.scorer.validate()?;
        self.retry.validate()?;
        self.redis.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("DAO_SENTIMENT__LEDGER__PRIVATE_KEY", "AAAA"),
        ("DAO_SENTIMENT__LEDGER__PACKAGE_ID", "0xabc"),
        ("DAO_SENTIMENT__LEDGER__DAO_ID", "0xda0"),
    ];

    fn set_minimal_env() {
        for (key, value) in VARS {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in VARS {
            env::remove_var(key);
        }
        env::remove_var("DAO_SENTIMENT__SERVER__PORT");
        env::remove_var("DAO_SENTIMENT__SERVER__ENVIRONMENT");
        env::remove_var("DAO_SENTIMENT__AGENT__BUFFER_CAPACITY");
        env::remove_var("DAO_SENTIMENT__LEDGER__BACKEND");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ledger.dao_id.as_deref(), Some("0xda0"));
        assert_eq!(config.ledger.package_id.as_deref(), Some("0xabc"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_apply() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.agent.buffer_capacity, 20);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(!config.redis.is_enabled());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DAO_SENTIMENT__SERVER__PORT", "3000");
        env::set_var("DAO_SENTIMENT__AGENT__BUFFER_CAPACITY", "5");
        env::set_var("DAO_SENTIMENT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.agent.buffer_capacity, 5);
        assert!(config.is_production());
    }

    #[test]
    fn test_in_memory_backend_validates_without_credentials() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DAO_SENTIMENT__LEDGER__BACKEND", "in_memory");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ledger.backend, LedgerBackend::InMemory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }
}
