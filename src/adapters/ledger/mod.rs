//! Ledger gateway adapters.
//!
//! - [`SuiLedgerGateway`] talks to a Sui full node over JSON-RPC
//! - [`InMemoryLedger`] applies the same voting rules in process

mod in_memory;
mod object_decoder;
mod signer;
mod sui_rpc;

pub use in_memory::{InMemoryLedger, LedgerCall};
pub use object_decoder::decode_dao_object;
pub use signer::{SignerError, SuiSigner};
pub use sui_rpc::{SuiLedgerGateway, SuiRpcConfig};

use std::sync::Arc;
use thiserror::Error;

use crate::config::{LedgerBackend, LedgerConfig, ValidationError};
use crate::domain::foundation::ObjectId;
use crate::ports::{LedgerError, LedgerGateway};

/// Failures building a gateway from configuration.
#[derive(Debug, Error)]
pub enum LedgerSetupError {
    #[error("ledger configuration invalid: {0}")]
    Config(#[from] ValidationError),

    #[error("signing key invalid: {0}")]
    Signer(#[from] SignerError),

    #[error("ledger client setup failed: {0}")]
    Client(#[from] LedgerError),
}

/// Gateways for the server process: one for the coordinator and one per
/// hosted agent.
pub struct LedgerHandles {
    pub coordinator: Arc<dyn LedgerGateway>,
    pub agents: Vec<Arc<dyn LedgerGateway>>,
}

/// Builds the gateway selected by `config.backend`.
pub fn build_gateway(config: &LedgerConfig) -> Result<Arc<dyn LedgerGateway>, LedgerSetupError> {
    config.validate()?;
    let dao_id = config.dao_object_id()?;

    match config.backend {
        LedgerBackend::InMemory => {
            tracing::warn!(dao_id = %dao_id, "Using in-memory ledger; state is lost on exit");
            Ok(Arc::new(InMemoryLedger::new(dao_id)))
        }
        LedgerBackend::Sui => build_sui(config, dao_id),
    }
}

/// Builds the coordinator gateway plus `agent_count` agent gateways.
///
/// In memory, every agent signs as its own address on the shared ledger.
/// On Sui the process has a single key, so hosted agents share it and the
/// contract accepts only the first of their votes per round.
pub fn build_gateways(
    config: &LedgerConfig,
    agent_count: usize,
) -> Result<LedgerHandles, LedgerSetupError> {
    match config.backend {
        LedgerBackend::InMemory => {
            config.validate()?;
            let ledger = InMemoryLedger::new(config.dao_object_id()?);
            tracing::warn!(dao_id = %ledger.dao_id(), "Using in-memory ledger; state is lost on exit");
            let agents = (0..agent_count)
                .map(|i| {
                    Arc::new(ledger.for_signer(format!("0xa9e{:x}", i + 1))) as Arc<dyn LedgerGateway>
                })
                .collect();
            Ok(LedgerHandles {
                coordinator: Arc::new(ledger),
                agents,
            })
        }
        LedgerBackend::Sui => {
            let gateway = build_gateway(config)?;
            if agent_count > 1 {
                tracing::warn!(
                    agent_count,
                    "Hosted agents share one signing key; run voting-agent processes for independent votes"
                );
            }
            Ok(LedgerHandles {
                agents: vec![gateway.clone(); agent_count],
                coordinator: gateway,
            })
        }
    }
}

fn build_sui(
    config: &LedgerConfig,
    dao_id: ObjectId,
) -> Result<Arc<dyn LedgerGateway>, LedgerSetupError> {
    let key = config
        .private_key
        .as_ref()
        .ok_or(ValidationError::MissingRequired("LEDGER__PRIVATE_KEY"))?;
    let signer = SuiSigner::from_keystore(key)?;
    tracing::info!(
        rpc_url = config.rpc_url(),
        address = signer.address(),
        dao_id = %dao_id,
        "Connecting to Sui ledger"
    );

    let rpc = SuiRpcConfig {
        rpc_url: config.rpc_url().to_string(),
        package_id: config.package_object_id()?,
        module: config.module.clone(),
        dao_id,
        gas_budget: config.gas_budget,
        timeout: config.timeout(),
    };
    Ok(Arc::new(SuiLedgerGateway::new(rpc, signer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn in_memory_backend_builds_without_credentials() {
        let config = LedgerConfig {
            backend: LedgerBackend::InMemory,
            ..Default::default()
        };
        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.dao_id().as_str(), "0xda0");
    }

    #[test]
    fn in_memory_agents_sign_with_distinct_addresses() {
        let config = LedgerConfig {
            backend: LedgerBackend::InMemory,
            ..Default::default()
        };
        let handles = build_gateways(&config, 2).unwrap();

        assert_eq!(handles.agents.len(), 2);
        assert_ne!(
            handles.agents[0].signer_address(),
            handles.agents[1].signer_address()
        );
        assert_ne!(
            handles.coordinator.signer_address(),
            handles.agents[0].signer_address()
        );
    }

    #[test]
    fn sui_backend_rejects_garbage_key() {
        let config = LedgerConfig {
            private_key: Some(Secret::new("not base64!".to_string())),
            package_id: Some("0xabc".to_string()),
            dao_id: Some("0xda0".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_gateway(&config),
            Err(LedgerSetupError::Signer(SignerError::InvalidEncoding))
        ));
    }

    #[test]
    fn missing_dao_id_is_a_config_error() {
        assert!(matches!(
            build_gateway(&LedgerConfig::default()),
            Err(LedgerSetupError::Config(_))
        ));
    }
}
