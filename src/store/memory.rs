//! In-memory stores for tests and ephemeral runs.

use super::{CursorStore, LedgerStore, StoreError};
use crate::domain::{Ledger, TransactionRecord};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct MemoryCursorStore {
    genesis_block: u64,
    value: Mutex<Option<u64>>,
}

impl MemoryCursorStore {
    pub fn new(genesis_block: u64) -> Self {
        Self {
            genesis_block,
            value: Mutex::new(None),
        }
    }

    /// Start with a stored cursor instead of the genesis default.
    pub fn with_value(self, block_number: u64) -> Self {
        *lock(&self.value) = Some(block_number);
        self
    }

    /// The stored value, without the genesis fallback.
    pub fn stored(&self) -> Option<u64> {
        *lock(&self.value)
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn get(&self) -> Result<u64, StoreError> {
        let value = *lock(&self.value);
        Ok(value.unwrap_or(self.genesis_block))
    }

    async fn set(&self, block_number: u64) -> Result<(), StoreError> {
        *lock(&self.value) = Some(block_number);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledger: Mutex<Ledger>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TransactionRecord>) -> Self {
        Self {
            ledger: Mutex::new(Ledger::from_records(records)),
        }
    }

    pub fn snapshot(&self) -> Ledger {
        lock(&self.ledger).clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<Ledger, StoreError> {
        Ok(self.snapshot())
    }

    async fn append(&self, new_records: &[TransactionRecord]) -> Result<usize, StoreError> {
        Ok(lock(&self.ledger).append(new_records))
    }
}
