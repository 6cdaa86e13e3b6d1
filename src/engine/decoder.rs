//! Vault event decoding: raw log → typed transaction record.
//!
//! Decoding is a pure function of the log and the vault's static layout; it
//! performs no I/O and never consults the ledger.

use crate::domain::{Decimal, RawLog, TransactionKind, TransactionRecord};
use crate::rpc::abi::{self, AbiError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a vault lays out the data words of its Deposit/Withdraw events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLayout {
    /// Word 0 is assets, word 1 is shares.
    AssetsAndShares,
    /// Word 0 is the transferred amount.
    SingleAmount,
}

impl EventLayout {
    fn words_required(&self) -> usize {
        match self {
            EventLayout::AssetsAndShares => 2,
            EventLayout::SingleAmount => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("log has no topics")]
    MissingTopic,
    #[error("unknown event signature {0}")]
    UnknownEvent(String),
    #[error("malformed data payload: {0}")]
    MalformedData(#[from] AbiError),
    #[error("data payload has {actual} words, expected at least {expected}")]
    PayloadTooShort { expected: usize, actual: usize },
    #[error("{field} does not fit a decimal at {decimals} decimals")]
    AmountOverflow { field: &'static str, decimals: u32 },
    #[error("invalid block number {0:?}")]
    InvalidBlockNumber(Option<String>),
    #[error("log has no transaction hash")]
    MissingTransactionHash,
}

/// Decoder for one vault's Deposit/Withdraw events.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    deposit_topic: String,
    withdraw_topic: String,
    layout: EventLayout,
    decimals: u32,
}

impl EventDecoder {
    pub fn new(
        deposit_topic: impl Into<String>,
        withdraw_topic: impl Into<String>,
        layout: EventLayout,
        decimals: u32,
    ) -> Self {
        Self {
            deposit_topic: deposit_topic.into(),
            withdraw_topic: withdraw_topic.into(),
            layout,
            decimals,
        }
    }

    /// Classify a primary topic, case-insensitively.
    pub fn classify(&self, topic: &str) -> Option<TransactionKind> {
        if topic.eq_ignore_ascii_case(&self.deposit_topic) {
            Some(TransactionKind::Deposit)
        } else if topic.eq_ignore_ascii_case(&self.withdraw_topic) {
            Some(TransactionKind::Withdraw)
        } else {
            None
        }
    }

    pub fn decode(&self, log: &RawLog) -> Result<TransactionRecord, DecodeError> {
        let topic = log.primary_topic().ok_or(DecodeError::MissingTopic)?;
        let kind = self
            .classify(topic)
            .ok_or_else(|| DecodeError::UnknownEvent(topic.to_string()))?;

        let words = abi::decode_words(&log.data)?;
        let expected = self.layout.words_required();
        if words.len() < expected {
            return Err(DecodeError::PayloadTooShort {
                expected,
                actual: words.len(),
            });
        }

        let block_number = log
            .block_number
            .as_deref()
            .and_then(|b| abi::parse_quantity(b).ok())
            .ok_or_else(|| DecodeError::InvalidBlockNumber(log.block_number.clone()))?;

        let transaction_hash = log
            .transaction_hash
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or(DecodeError::MissingTransactionHash)?;

        let amount = self.scale(&words[0], "amount")?;
        let record = TransactionRecord::new(kind, amount, block_number, transaction_hash);

        Ok(match self.layout {
            EventLayout::SingleAmount => record,
            EventLayout::AssetsAndShares => {
                let shares = self.scale(&words[1], "shares")?;
                // Zero shares leaves price-per-share undefined.
                let pps = amount.checked_div(shares);
                record.with_shares(shares, pps)
            }
        })
    }

    fn scale(&self, word: &abi::Word, field: &'static str) -> Result<Decimal, DecodeError> {
        abi::word_to_u128(word)
            .and_then(|raw| Decimal::from_scaled_integer(raw, self.decimals))
            .ok_or(DecodeError::AmountOverflow {
                field,
                decimals: self.decimals,
            })
    }
}
