//! Domain types for vault position tracking.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: Address, TxHash
//! - Raw event logs and the decoded TransactionRecord
//! - The deduplicated Ledger

pub mod decimal;
pub mod ledger;
pub mod log;
pub mod primitives;
pub mod transaction;

pub use decimal::Decimal;
pub use ledger::Ledger;
pub use log::RawLog;
pub use primitives::{Address, AddressParseError, TxHash};
pub use transaction::{TransactionKind, TransactionRecord};
