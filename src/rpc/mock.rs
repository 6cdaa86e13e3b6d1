//! Mock RPC client for testing without network calls.

use super::{abi, LogFilter, RpcClient, RpcError};
use crate::domain::{Address, RawLog};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock RPC client that serves predefined chain state.
///
/// State sits behind mutexes so a test can move the chain head or add logs
/// between scans through a shared `Arc`.
#[derive(Debug, Default)]
pub struct MockRpcClient {
    head: Mutex<Option<u64>>,
    logs: Mutex<Vec<RawLog>>,
    fail_logs: Mutex<bool>,
    call_results: HashMap<(String, String), String>,
    log_requests: Mutex<Vec<LogFilter>>,
}

impl MockRpcClient {
    /// Create a mock with no head (block_number fails) and no logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chain head returned by `block_number`.
    pub fn with_head(self, head: u64) -> Self {
        self.set_head(Some(head));
        self
    }

    /// Add a log to the mock chain.
    pub fn with_log(self, log: RawLog) -> Self {
        self.push_log(log);
        self
    }

    /// Add multiple logs to the mock chain.
    pub fn with_logs(self, logs: Vec<RawLog>) -> Self {
        for log in logs {
            self.push_log(log);
        }
        self
    }

    /// Make `get_logs` fail.
    pub fn with_failing_logs(self) -> Self {
        self.set_fail_logs(true);
        self
    }

    /// Register the hex result for an `eth_call` with exactly this calldata.
    pub fn with_call_result(mut self, to: &Address, data: &str, result: &str) -> Self {
        self.call_results.insert(
            (to.as_str().to_ascii_lowercase(), data.to_ascii_lowercase()),
            result.to_string(),
        );
        self
    }

    /// `None` makes `block_number` fail.
    pub fn set_head(&self, head: Option<u64>) {
        *lock(&self.head) = head;
    }

    pub fn push_log(&self, log: RawLog) {
        lock(&self.logs).push(log);
    }

    pub fn set_fail_logs(&self, fail: bool) {
        *lock(&self.fail_logs) = fail;
    }

    /// Filters passed to `get_logs`, in call order.
    pub fn log_requests(&self) -> Vec<LogFilter> {
        lock(&self.log_requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn in_range(log: &RawLog, filter: &LogFilter) -> bool {
    log.block_number
        .as_deref()
        .and_then(|b| abi::parse_quantity(b).ok())
        .map(|b| b >= filter.from_block && b <= filter.to_block)
        .unwrap_or(true)
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let head = *lock(&self.head);
        head.ok_or_else(|| RpcError::NetworkError("mock head unavailable".to_string()))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        lock(&self.log_requests).push(filter.clone());
        if *lock(&self.fail_logs) {
            return Err(RpcError::HttpError {
                status: 503,
                message: "mock logs unavailable".to_string(),
            });
        }

        Ok(lock(&self.logs)
            .iter()
            .filter(|log| in_range(log, filter))
            .cloned()
            .collect())
    }

    async fn call(&self, to: &Address, data: &str) -> Result<String, RpcError> {
        self.call_results
            .get(&(to.as_str().to_ascii_lowercase(), data.to_ascii_lowercase()))
            .cloned()
            .ok_or_else(|| RpcError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            })
    }
}
