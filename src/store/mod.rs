//! Durable state: scan cursor, transaction ledger, refresh stamp.
//!
//! Stores are traits so the scan orchestrator can run against files in
//! production and in-memory state in tests.

use crate::domain::{Ledger, TransactionRecord};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod file;
pub mod memory;
pub mod stamp;

pub use file::{FileCursorStore, FileLedgerStore};
pub use memory::{MemoryCursorStore, MemoryLedgerStore};
pub use stamp::{describe_age, RefreshStampStore};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence medium failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Persisted content exists but cannot be trusted.
    #[error("unreadable state in {}: {reason}", .path.display())]
    StaleData { path: PathBuf, reason: String },
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_stale_data(&self) -> bool {
        matches!(self, StoreError::StaleData { .. })
    }
}

/// Last fully scanned block.
///
/// The store does not enforce monotonicity; the scan orchestrator only ever
/// moves the cursor forward.
#[async_trait]
pub trait CursorStore: Send + Sync + fmt::Debug {
    /// The stored cursor, or the genesis block if none is stored.
    async fn get(&self) -> Result<u64, StoreError>;

    /// Overwrite the stored cursor.
    async fn set(&self, block_number: u64) -> Result<(), StoreError>;
}

/// Append-only, deduplicated transaction ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync + fmt::Debug {
    /// The persisted ledger; empty if nothing was ever stored.
    async fn load(&self) -> Result<Ledger, StoreError>;

    /// Append records not already present and persist the result atomically.
    ///
    /// # Returns
    /// Number of records added. Calling twice with the same records adds
    /// them once.
    async fn append(&self, new_records: &[TransactionRecord]) -> Result<usize, StoreError>;
}
