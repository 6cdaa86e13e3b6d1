//! JSON-RPC 2.0 over HTTP client implementation.

use super::{abi, LogFilter, RpcClient, RpcError};
use crate::domain::{Address, RawLog};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Ethereum-compatible JSON-RPC endpoint.
#[derive(Debug)]
pub struct HttpRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a new client for the given endpoint.
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let envelope = retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(RpcError::NetworkError(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(RpcError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(RpcError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(RpcError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(RpcError::ParseError(e.to_string())))
        })
        .await?;

        unwrap_envelope(envelope)
    }
}

/// Extract `result` from a JSON-RPC response, surfacing `error` objects.
fn unwrap_envelope(mut envelope: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(|v| v.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(RpcError::Rpc { code, message });
    }

    match envelope.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(RpcError::ParseError("Missing result field".to_string())),
    }
}

/// Parse an `eth_getLogs` result. A malformed entry fails the whole batch so
/// the scan range is retried instead of silently skipping a log.
fn parse_logs(result: serde_json::Value) -> Result<Vec<RawLog>, RpcError> {
    let serde_json::Value::Array(entries) = result else {
        return Err(RpcError::ParseError("Expected array response".to_string()));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<RawLog>(entry).map_err(|e| {
                warn!(index, error = %e, "Malformed log entry in eth_getLogs response");
                RpcError::ParseError(format!("log entry {} is malformed: {}", index, e))
            })
        })
        .collect()
}

fn expect_str(value: &serde_json::Value, what: &str) -> Result<String, RpcError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RpcError::ParseError(format!("Expected hex string for {}", what)))
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let result = self
            .request("eth_blockNumber", serde_json::json!([]))
            .await?;
        let hex = expect_str(&result, "eth_blockNumber")?;
        abi::parse_quantity(&hex).map_err(|e| RpcError::ParseError(e.to_string()))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        debug!(
            "Fetching logs for address={}, from_block={}, to_block={}",
            filter.address, filter.from_block, filter.to_block
        );

        let result = self
            .request("eth_getLogs", serde_json::json!([filter.to_params()]))
            .await?;

        parse_logs(result)
    }

    async fn call(&self, to: &Address, data: &str) -> Result<String, RpcError> {
        let params = serde_json::json!([{ "to": to.as_str(), "data": data }, "latest"]);
        let result = self.request("eth_call", params).await?;
        expect_str(&result, "eth_call")
    }
}
