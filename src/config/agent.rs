//! Voting agent configuration

use serde::Deserialize;

use crate::domain::decision::{Thresholds, VoteCodeMapping};
use crate::domain::feedback::DEFAULT_BUFFER_CAPACITY;

use super::error::ValidationError;

/// Voting agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Stable agent id; generated at startup when absent
    pub agent_id: Option<String>,

    /// Number of voting agents hosted in the server process
    #[serde(default = "default_agent_count")]
    pub agent_count: usize,

    /// Messages kept per round (oldest evicted first)
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Inbound message queue size before senders wait
    #[serde(default = "default_intake_capacity")]
    pub intake_capacity: usize,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub vote_codes: VoteCodeMapping,
}

impl AgentConfig {
    /// Validate agent configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.buffer_capacity == 0 || self.buffer_capacity > 10_000 {
            return Err(ValidationError::InvalidBufferCapacity);
        }
        if self.intake_capacity == 0 {
            return Err(ValidationError::InvalidIntakeCapacity);
        }
        self.thresholds
            .validate()
            .map_err(|_| ValidationError::InvalidThresholds)?;
        self.vote_codes
            .validate()
            .map_err(|_| ValidationError::InvalidVoteCodes)?;
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            agent_count: default_agent_count(),
            buffer_capacity: default_buffer_capacity(),
            intake_capacity: default_intake_capacity(),
            thresholds: Thresholds::default(),
            vote_codes: VoteCodeMapping::default(),
        }
    }
}

fn default_agent_count() -> usize {
    1
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_intake_capacity() -> usize {
    256
}
