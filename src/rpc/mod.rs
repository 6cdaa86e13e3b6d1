//! RPC abstraction for reading chain state: block height, event logs, contract calls.

use crate::domain::{Address, RawLog};
use async_trait::async_trait;
use std::fmt;

pub mod abi;
pub mod http;
pub mod mock;

pub use http::HttpRpcClient;
pub use mock::MockRpcClient;

/// Read-only blockchain RPC client.
///
/// Implementations own transport concerns (retry/backoff, rate limiting).
/// The scanning core never enforces its own timeout.
#[async_trait]
pub trait RpcClient: Send + Sync + fmt::Debug {
    /// Current chain head (`eth_blockNumber`).
    async fn block_number(&self) -> Result<u64, RpcError>;

    /// Logs matching `filter` over its inclusive block range (`eth_getLogs`).
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError>;

    /// Read-only contract call at `latest` (`eth_call`).
    ///
    /// # Arguments
    /// * `to` - Contract address
    /// * `data` - Hex calldata: 4-byte selector plus ABI-encoded arguments
    ///
    /// # Returns
    /// Hex-encoded return data
    async fn call(&self, to: &Address, data: &str) -> Result<String, RpcError>;
}

/// `eth_getLogs` filter: one contract, one indexed wallet topic, an optional
/// set of accepted primary topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Address,
    /// `None` matches any event signature.
    pub primary_topics: Option<Vec<String>>,
    /// Second topic position, usually the wallet address padded to 32 bytes.
    pub indexed_topic: String,
}

impl LogFilter {
    /// JSON-RPC params object for `eth_getLogs`.
    pub fn to_params(&self) -> serde_json::Value {
        let primary = match &self.primary_topics {
            Some(topics) => serde_json::json!(topics),
            None => serde_json::Value::Null,
        };
        serde_json::json!({
            "fromBlock": abi::to_quantity(self.from_block),
            "toBlock": abi::to_quantity(self.to_block),
            "address": self.address.as_str(),
            "topics": [primary, self.indexed_topic],
        })
    }
}

/// Error type for RPC operations.
#[derive(Debug, Clone)]
pub enum RpcError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error)
    HttpError { status: u16, message: String },
    /// Rate limit exceeded
    RateLimited,
    /// JSON-RPC error object returned by the node
    Rpc { code: i64, message: String },
    /// Invalid JSON or unexpected response shape
    ParseError(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RpcError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            RpcError::RateLimited => write!(f, "Rate limited"),
            RpcError::Rpc { code, message } => write!(f, "RPC error {}: {}", code, message),
            RpcError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(primary: Option<Vec<String>>) -> LogFilter {
        let wallet = Address::parse("0x6833df4E1edB361A04491349833c83A4868ABCdA").unwrap();
        LogFilter {
            from_block: 100,
            to_block: 200,
            address: Address::parse("0x8a1eF3066553275829d1c0F64EE8D5871D5ce9d3").unwrap(),
            primary_topics: primary,
            indexed_topic: wallet.to_topic(),
        }
    }

    #[test]
    fn test_log_filter_params_any_event() {
        let params = filter(None).to_params();
        assert_eq!(params["fromBlock"], "0x64");
        assert_eq!(params["toBlock"], "0xc8");
        assert_eq!(params["address"], "0x8a1eF3066553275829d1c0F64EE8D5871D5ce9d3");
        assert!(params["topics"][0].is_null());
        assert_eq!(
            params["topics"][1],
            "0x0000000000000000000000006833df4e1edb361a04491349833c83a4868abcda"
        );
    }

    #[test]
    fn test_log_filter_params_with_primary_topics() {
        let params = filter(Some(vec!["0xdep".to_string(), "0xwd".to_string()])).to_params();
        assert_eq!(params["topics"][0], serde_json::json!(["0xdep", "0xwd"]));
    }

    #[test]
    fn test_rpc_error_display() {
        let err = RpcError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = RpcError::HttpError {
            status: 502,
            message: "Server error".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 502: Server error");

        let err = RpcError::Rpc {
            code: -32005,
            message: "query returned more than 10000 results".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RPC error -32005: query returned more than 10000 results"
        );

        assert_eq!(RpcError::RateLimited.to_string(), "Rate limited");
    }
}
