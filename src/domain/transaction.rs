//! Vault deposit/withdraw record.

use crate::domain::{Decimal, TxHash};
use serde::{Deserialize, Serialize};

/// Direction of a vault cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// A decoded vault event.
///
/// The serialized field names are the persisted ledger format: `type`,
/// `amount`, `shares`, `pps`, `blockNumber`, `transactionHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Asset amount in natural units.
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<Decimal>,
    #[serde(rename = "pps", default, skip_serializing_if = "Option::is_none")]
    pub price_per_share: Option<Decimal>,
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: TxHash,
}

impl TransactionRecord {
    /// Record for vaults that only report a transferred amount.
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        block_number: u64,
        transaction_hash: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            amount,
            shares: None,
            price_per_share: None,
            block_number,
            transaction_hash: TxHash::new(transaction_hash),
        }
    }

    /// Attach share quantity and the implied price-per-share.
    pub fn with_shares(mut self, shares: Decimal, price_per_share: Option<Decimal>) -> Self {
        self.shares = Some(shares);
        self.price_per_share = price_per_share;
        self
    }
}
