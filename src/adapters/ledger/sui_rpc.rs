//! Sui JSON-RPC ledger gateway.
//!
//! Each mutating call runs three steps against the full node:
//! 1. `unsafe_moveCall` builds the unsigned transaction bytes
//! 2. [`SuiSigner`] signs them locally
//! 3. `sui_executeTransactionBlock` submits and waits for local execution

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::foundation::{ObjectId, ProposalId, Timestamp};
use crate::domain::proposal::{Ballot, DaoState, ProposalDraft, TransactionReceipt};
use crate::ports::{LedgerError, LedgerGateway};

use super::object_decoder::decode_dao_object;
use super::signer::SuiSigner;

/// JSON-RPC internal error; the node failed, not the transaction.
const RPC_INTERNAL_ERROR: i64 = -32603;

/// Sui's "server overloaded" error code.
const RPC_SERVER_BUSY: i64 = -32050;

/// Connection settings for [`SuiLedgerGateway`].
#[derive(Debug, Clone)]
pub struct SuiRpcConfig {
    pub rpc_url: String,
    pub package_id: ObjectId,
    pub module: String,
    pub dao_id: ObjectId,
    pub gas_budget: u64,
    pub timeout: Duration,
}

/// Ledger gateway speaking Sui JSON-RPC.
pub struct SuiLedgerGateway {
    config: SuiRpcConfig,
    client: Client,
    signer: SuiSigner,
    next_request_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<JsonValue>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl SuiLedgerGateway {
    pub fn new(config: SuiRpcConfig, signer: SuiSigner) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            config,
            client,
            signer,
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Performs one JSON-RPC call and returns its `result`.
    async fn rpc(&self, method: &str, params: JsonValue) -> Result<JsonValue, LedgerError> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::unavailable(format!(
                        "{} timed out after {}s",
                        method,
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    LedgerError::unavailable(format!("connection failed: {}", e))
                } else {
                    LedgerError::unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_status(status, &text));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::unavailable(format!("invalid JSON-RPC response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(classify_rpc_error(error));
        }
        parsed
            .result
            .ok_or_else(|| LedgerError::unavailable(format!("{} returned no result", method)))
    }

    /// Builds, signs and executes one Move call on the DAO module.
    async fn move_call(
        &self,
        function: &str,
        arguments: Vec<JsonValue>,
    ) -> Result<TransactionReceipt, LedgerError> {
        let built = self
            .rpc(
                "unsafe_moveCall",
                json!([
                    self.signer.address(),
                    self.config.package_id.as_str(),
                    self.config.module,
                    function,
                    [],
                    arguments,
                    null,
                    self.config.gas_budget.to_string(),
                ]),
            )
            .await?;

        let tx_bytes = built
            .get("txBytes")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| LedgerError::rejected(format!("{}: node returned no txBytes", function)))?;

        let raw_tx = base64_decode(tx_bytes)?;
        let signature = self.signer.sign_transaction(&raw_tx);

        let executed = self
            .rpc(
                "sui_executeTransactionBlock",
                json!([
                    tx_bytes,
                    [signature],
                    {"showEffects": true},
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        let receipt = parse_execution(&executed)?;
        tracing::info!(
            function,
            digest = %receipt.digest,
            "Ledger transaction executed"
        );
        Ok(receipt)
    }

    fn dao_arg(&self) -> JsonValue {
        json!(self.config.dao_id.as_str())
    }
}

fn base64_decode(encoded: &str) -> Result<Vec<u8>, LedgerError> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    BASE64
        .decode(encoded)
        .map_err(|_| LedgerError::rejected("node returned txBytes that are not base64"))
}

fn classify_http_status(status: StatusCode, body: &str) -> LedgerError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        LedgerError::unavailable(format!("node returned {}: {}", status, body))
    } else {
        LedgerError::rejected_with_code(
            format!("node returned {}: {}", status, body),
            status.as_u16().to_string(),
        )
    }
}

fn classify_rpc_error(error: RpcErrorBody) -> LedgerError {
    match error.code {
        RPC_INTERNAL_ERROR | RPC_SERVER_BUSY => LedgerError::unavailable(error.message),
        code => LedgerError::rejected_with_code(error.message, code.to_string()),
    }
}

/// Reads digest and effects status from an execution result.
fn parse_execution(result: &JsonValue) -> Result<TransactionReceipt, LedgerError> {
    let digest = result
        .get("digest")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| LedgerError::unavailable("execution result has no digest"))?;

    let status = result
        .pointer("/effects/status/status")
        .and_then(JsonValue::as_str);

    match status {
        Some("success") => Ok(TransactionReceipt::new(digest)),
        Some(_) => {
            let message = result
                .pointer("/effects/status/error")
                .and_then(JsonValue::as_str)
                .unwrap_or("transaction failed");
            Err(LedgerError::rejected_with_digest(message, digest))
        }
        None => Err(LedgerError::rejected_with_digest(
            "execution result has no effects status",
            digest,
        )),
    }
}

#[async_trait]
impl LedgerGateway for SuiLedgerGateway {
    async fn get_dao_state(&self, dao_id: &ObjectId) -> Result<DaoState, LedgerError> {
        let result = self
            .rpc(
                "sui_getObject",
                json!([dao_id.as_str(), {"showContent": true}]),
            )
            .await?;
        decode_dao_object(dao_id, &result)
    }

    async fn create_proposal(
        &self,
        draft: &ProposalDraft,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.move_call(
            "create_proposal",
            vec![
                self.dao_arg(),
                json!(draft.title()),
                json!(draft.description()),
                json!(Timestamp::now().as_unix_millis().to_string()),
            ],
        )
        .await
    }

    async fn start_voting(
        &self,
        proposal_id: &ProposalId,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.move_call("start_voting", vec![self.dao_arg(), json!(proposal_id.as_str())])
            .await
    }

    async fn submit_vote(&self, ballot: &Ballot) -> Result<TransactionReceipt, LedgerError> {
        self.move_call(
            "vote",
            vec![
                self.dao_arg(),
                json!(ballot.proposal_id.as_str()),
                json!(ballot.vote_code),
                json!(ballot.cast_at.as_unix_millis().to_string()),
                json!(ballot.scaled_score.value()),
                json!(ballot.scaled_confidence.value()),
            ],
        )
        .await
    }

    async fn close_voting(
        &self,
        proposal_id: &ProposalId,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.move_call("close_voting", vec![self.dao_arg(), json!(proposal_id.as_str())])
            .await
    }

    async fn invite_member(&self, address: &ObjectId) -> Result<TransactionReceipt, LedgerError> {
        self.move_call("invite_member", vec![self.dao_arg(), json!(address.as_str())])
            .await
    }

    fn dao_id(&self) -> &ObjectId {
        &self.config.dao_id
    }

    fn signer_address(&self) -> String {
        self.signer.address().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_effects_yield_receipt() {
        let result = json!({
            "digest": "9xQa",
            "effects": {"status": {"status": "success"}}
        });
        assert_eq!(parse_execution(&result).unwrap().digest, "9xQa");
    }

    #[test]
    fn failed_effects_are_rejected_with_digest() {
        let result = json!({
            "digest": "9xQa",
            "effects": {"status": {"status": "failure", "error": "MoveAbort(3)"}}
        });
        assert_eq!(
            parse_execution(&result).unwrap_err(),
            LedgerError::rejected_with_digest("MoveAbort(3)", "9xQa")
        );
    }

    #[test]
    fn missing_digest_is_unavailable() {
        let err = parse_execution(&json!({"effects": {}})).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(classify_http_status(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(classify_http_status(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(!classify_http_status(StatusCode::BAD_REQUEST, "").is_retryable());
    }

    #[test]
    fn rpc_error_codes_are_classified() {
        let internal = classify_rpc_error(RpcErrorBody {
            code: RPC_INTERNAL_ERROR,
            message: "boom".to_string(),
        });
        assert!(internal.is_retryable());

        let invalid = classify_rpc_error(RpcErrorBody {
            code: -32602,
            message: "bad params".to_string(),
        });
        assert_eq!(
            invalid,
            LedgerError::rejected_with_code("bad params", "-32602")
        );
    }

    #[tokio::test]
    async fn unreachable_node_is_unavailable() {
        let config = SuiRpcConfig {
            rpc_url: "http://127.0.0.1:9".to_string(),
            package_id: ObjectId::new("0xabc").unwrap(),
            module: "dao".to_string(),
            dao_id: ObjectId::new("0xda0").unwrap(),
            gas_budget: 1_000,
            timeout: Duration::from_secs(2),
        };
        let gateway =
            SuiLedgerGateway::new(config, SuiSigner::from_secret_bytes(&[3u8; 32])).unwrap();

        let err = gateway
            .get_dao_state(&ObjectId::new("0xda0").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "expected transient error, got {:?}", err);
    }
}
