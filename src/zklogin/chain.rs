//! JSON-RPC client for the target network.
//!
//! Two concerns only: polling the current epoch (session validity is
//! epoch-bounded) and submitting signed transactions. `ChainClient` is a
//! trait so tests can pin the epoch and capture submissions without a node.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, instrument};

use super::error::ZkLoginError;

pub const DEFAULT_RPC_TIMEOUT_SECONDS: u64 = 15;

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current network epoch, freshly polled.
    async fn current_epoch(&self) -> Result<u64, ZkLoginError>;

    /// Submit a signed transaction, returning its digest.
    async fn execute_transaction(
        &self,
        tx_bytes_b64: &str,
        signature_b64: &str,
    ) -> Result<String, ZkLoginError>;
}

#[derive(Debug, Clone)]
pub struct RpcChainClient {
    client: Client,
    rpc_url: String,
}

impl RpcChainClient {
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(rpc_url: String, timeout: Duration) -> Result<Self, ZkLoginError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ZkLoginError::Internal(format!("rpc client build failed: {err}")))?;
        Ok(Self { client, rpc_url })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ZkLoginError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                error!("RPC request {method} failed: {err}");
                ZkLoginError::SubmissionFailed(err.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!("RPC request {method} returned {status}");
            return Err(ZkLoginError::SubmissionFailed(format!("{status}")));
        }

        response.json().await.map_err(|err| {
            error!("RPC response for {method} was malformed: {err}");
            ZkLoginError::SubmissionFailed(err.to_string())
        })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn current_epoch(&self) -> Result<u64, ZkLoginError> {
        let body = self
            .call("suix_getLatestSuiSystemState", json!([]))
            .await
            .map_err(|err| ZkLoginError::Internal(format!("epoch query failed: {err}")))?;
        parse_epoch_response(&body)
    }

    #[instrument(skip_all)]
    async fn execute_transaction(
        &self,
        tx_bytes_b64: &str,
        signature_b64: &str,
    ) -> Result<String, ZkLoginError> {
        let params = json!([
            tx_bytes_b64,
            [signature_b64],
            { "showEffects": true },
            "WaitForLocalExecution",
        ]);
        let body = self.call("sui_executeTransactionBlock", params).await?;
        parse_execute_response(&body)
    }
}

fn get_path<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = body;
    for key in path {
        current = current.get(*key)?;
    }
    Some(current)
}

/// Pull the epoch out of a system-state response.
///
/// # Errors
/// Returns `Internal` when the field is absent or not a decimal string.
pub(crate) fn parse_epoch_response(body: &Value) -> Result<u64, ZkLoginError> {
    let epoch = get_path(body, &["result", "epoch"])
        .and_then(Value::as_str)
        .ok_or_else(|| ZkLoginError::Internal("no epoch in system state response".to_string()))?;
    epoch
        .parse::<u64>()
        .map_err(|_| ZkLoginError::Internal(format!("malformed epoch: {epoch}")))
}

/// Map an execution response to a digest or a decoded failure.
///
/// An on-chain abort is application-level and passed through verbatim as
/// `ExecutionFailed`; everything else is `SubmissionFailed`.
pub(crate) fn parse_execute_response(body: &Value) -> Result<String, ZkLoginError> {
    if let Some(status) = get_path(body, &["result", "effects", "status"]) {
        let failed = status.get("status").and_then(Value::as_str) == Some("failure");
        if failed {
            let reason = status
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown execution failure");
            return Err(ZkLoginError::ExecutionFailed(reason.to_string()));
        }
    }

    if let Some(rpc_error) = body.get("error") {
        let message = rpc_error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown rpc error");
        return Err(ZkLoginError::ExecutionFailed(message.to_string()));
    }

    get_path(body, &["result", "digest"])
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ZkLoginError::SubmissionFailed("no digest in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epoch_from_system_state() -> Result<(), ZkLoginError> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "result": { "epoch": "412" } });
        assert_eq!(parse_epoch_response(&body)?, 412);
        Ok(())
    }

    #[test]
    fn missing_or_malformed_epoch_is_an_error() {
        assert!(parse_epoch_response(&json!({ "result": {} })).is_err());
        assert!(parse_epoch_response(&json!({ "result": { "epoch": "not-a-number" } })).is_err());
    }

    #[test]
    fn successful_execution_yields_digest() -> Result<(), ZkLoginError> {
        let body = json!({
            "result": {
                "digest": "9fjJ2rE",
                "effects": { "status": { "status": "success" } }
            }
        });
        assert_eq!(parse_execute_response(&body)?, "9fjJ2rE");
        Ok(())
    }

    #[test]
    fn on_chain_abort_is_surfaced_verbatim() {
        let body = json!({
            "result": {
                "digest": "9fjJ2rE",
                "effects": {
                    "status": {
                        "status": "failure",
                        "error": "MoveAbort(circle::join, 7) in command 0"
                    }
                }
            }
        });
        let err = parse_execute_response(&body).err();
        assert!(matches!(
            err,
            Some(ZkLoginError::ExecutionFailed(reason))
                if reason == "MoveAbort(circle::join, 7) in command 0"
        ));
    }

    #[test]
    fn rpc_error_is_execution_failure() {
        let body = json!({ "error": { "code": -32002, "message": "rejected by validators" } });
        let err = parse_execute_response(&body).err();
        assert!(matches!(
            err,
            Some(ZkLoginError::ExecutionFailed(reason)) if reason == "rejected by validators"
        ));
    }

    #[test]
    fn missing_digest_is_submission_failure() {
        let err = parse_execute_response(&json!({ "result": {} })).err();
        assert!(matches!(err, Some(ZkLoginError::SubmissionFailed(_))));
    }
}
