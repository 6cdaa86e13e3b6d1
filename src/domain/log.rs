//! Raw event log as returned by `eth_getLogs`.

use serde::{Deserialize, Serialize};

/// Event log envelope. Only the fields the decoder reads are kept; the node
/// sends more (`logIndex`, `blockHash`, `removed`, ...) and those are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    /// Hex quantity; `null` for pending logs.
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl RawLog {
    pub fn new(
        topics: Vec<String>,
        data: impl Into<String>,
        block_number: u64,
        transaction_hash: impl Into<String>,
    ) -> Self {
        Self {
            topics,
            data: data.into(),
            block_number: Some(format!("0x{:x}", block_number)),
            transaction_hash: Some(transaction_hash.into()),
        }
    }

    /// The primary topic (event signature hash), if any.
    pub fn primary_topic(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }
}
