//! Ledger configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::foundation::ObjectId;

use super::error::ValidationError;

/// Which gateway implementation to build.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    #[default]
    Sui,
    /// Process-local ledger for development without a node.
    InMemory,
}

/// Public Sui networks with well-known full node URLs.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuiNetwork {
    Mainnet,
    Testnet,
    #[default]
    Devnet,
    Localnet,
}

impl SuiNetwork {
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            SuiNetwork::Mainnet => "https://fullnode.mainnet.sui.io:443",
            SuiNetwork::Testnet => "https://fullnode.testnet.sui.io:443",
            SuiNetwork::Devnet => "https://fullnode.devnet.sui.io:443",
            SuiNetwork::Localnet => "http://127.0.0.1:9000",
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    #[serde(default)]
    pub network: SuiNetwork,

    /// Explicit RPC URL, overriding `network`
    pub rpc_url: Option<String>,

    /// Signing key in Sui keystore format (base64 of flag byte + secret)
    pub private_key: Option<Secret<String>>,

    /// Published package id
    pub package_id: Option<String>,

    /// Move module holding the DAO entry functions
    #[serde(default = "default_module")]
    pub module: String,

    /// DAO shared object id
    pub dao_id: Option<String>,

    /// Gas budget per transaction (MIST)
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,

    /// Timeout per RPC call in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LedgerConfig {
    /// RPC endpoint to use.
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.fullnode_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed DAO id. In-memory ledgers fall back to a fixed id.
    pub fn dao_object_id(&self) -> Result<ObjectId, ValidationError> {
        match (&self.dao_id, self.backend) {
            (Some(id), _) => ObjectId::new(id).map_err(|_| ValidationError::InvalidObjectId("dao_id")),
            (None, LedgerBackend::InMemory) => {
                ObjectId::new("0xda0").map_err(|_| ValidationError::InvalidObjectId("dao_id"))
            }
            (None, LedgerBackend::Sui) => Err(ValidationError::MissingRequired("LEDGER__DAO_ID")),
        }
    }

    /// Parsed package id.
    pub fn package_object_id(&self) -> Result<ObjectId, ValidationError> {
        let raw = self
            .package_id
            .as_ref()
            .ok_or(ValidationError::MissingRequired("LEDGER__PACKAGE_ID"))?;
        ObjectId::new(raw).map_err(|_| ValidationError::InvalidObjectId("package_id"))
    }

    /// Validate ledger configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("ledger.timeout_secs"));
        }
        if let Some(url) = &self.rpc_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidRpcUrl);
            }
        }
        self.dao_object_id()?;

        if self.backend == LedgerBackend::Sui {
            if self.private_key.is_none() {
                return Err(ValidationError::MissingRequired("LEDGER__PRIVATE_KEY"));
            }
            self.package_object_id()?;
            if self.module.trim().is_empty() {
                return Err(ValidationError::MissingRequired("LEDGER__MODULE"));
            }
            if self.gas_budget == 0 {
                return Err(ValidationError::InvalidGasBudget);
            }
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            network: SuiNetwork::default(),
            rpc_url: None,
            private_key: None,
            package_id: None,
            module: default_module(),
            dao_id: None,
            gas_budget: default_gas_budget(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_module() -> String {
    "dao".to_string()
}

fn default_gas_budget() -> u64 {
    100_000_000
}

fn default_timeout() -> u64 {
    30
}
