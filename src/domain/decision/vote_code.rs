//! Vote codes and their on-chain numbering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// The three possible ballots an agent can cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteCode {
    Yes,
    No,
    Abstain,
}

impl fmt::Display for VoteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteCode::Yes => "yes",
            VoteCode::No => "no",
            VoteCode::Abstain => "abstain",
        };
        write!(f, "{}", s)
    }
}

/// Numeric encoding of [`VoteCode`] expected by the DAO contract.
///
/// Defaults to `No = 0, Abstain = 1, Yes = 2`; deployments with a different
/// contract can override it through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCodeMapping {
    #[serde(default = "default_yes")]
    pub yes: u8,
    #[serde(default = "default_no")]
    pub no: u8,
    #[serde(default = "default_abstain")]
    pub abstain: u8,
}

impl VoteCodeMapping {
    /// Creates a mapping, rejecting duplicate codes.
    pub fn new(yes: u8, no: u8, abstain: u8) -> Result<Self, ValidationError> {
        let mapping = Self { yes, no, abstain };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Ensures the three codes are distinct.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.yes == self.no || self.yes == self.abstain || self.no == self.abstain {
            return Err(ValidationError::invalid_format(
                "vote_codes",
                "yes, no and abstain must use distinct codes",
            ));
        }
        Ok(())
    }

    /// Encodes a vote for the ledger.
    pub fn encode(&self, code: VoteCode) -> u8 {
        match code {
            VoteCode::Yes => self.yes,
            VoteCode::No => self.no,
            VoteCode::Abstain => self.abstain,
        }
    }

    /// Decodes a ledger code, rejecting values outside the mapping.
    pub fn decode(&self, raw: u8) -> Result<VoteCode, ValidationError> {
        if raw == self.yes {
            Ok(VoteCode::Yes)
        } else if raw == self.no {
            Ok(VoteCode::No)
        } else if raw == self.abstain {
            Ok(VoteCode::Abstain)
        } else {
            Err(ValidationError::invalid_format(
                "vote_code",
                format!("{} is not a known vote code", raw),
            ))
        }
    }
}

impl Default for VoteCodeMapping {
    fn default() -> Self {
        Self {
            yes: default_yes(),
            no: default_no(),
            abstain: default_abstain(),
        }
    }
}

fn default_yes() -> u8 {
    2
}

fn default_no() -> u8 {
    0
}

fn default_abstain() -> u8 {
    1
}
