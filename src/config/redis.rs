//! Redis configuration
//!
//! Redis is optional: without a URL, lifecycle events stay in-process.

use serde::Deserialize;

use super::error::ValidationError;

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: Option<String>,

    /// Pub/sub channel carrying lifecycle events
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl RedisConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        if self.channel.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__CHANNEL"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            channel: default_channel(),
        }
    }
}

fn default_channel() -> String {
    "dao.lifecycle".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_disabled_by_default() {
        let config = RedisConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.channel, "dao.lifecycle");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let config = RedisConfig {
            url: Some("http://localhost:6379".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRedisUrl));
    }

    #[test]
    fn test_validation_valid_urls() {
        for url in ["redis://localhost:6379", "rediss://secure.redis.com:6379"] {
            let config = RedisConfig {
                url: Some(url.to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }
}
