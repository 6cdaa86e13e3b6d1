//! Incremental log scan: moves the block cursor forward and appends newly
//! seen vault transactions to the ledger.

use crate::config::VaultConfig;
use crate::domain::{Address, RawLog, TransactionRecord};
use crate::engine::{DecodeError, EventDecoder};
use crate::rpc::{RpcClient, RpcError};
use crate::store::{CursorStore, LedgerStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where a scan cycle is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    ReadingCursor,
    FetchingHead,
    FetchingLogs,
    Decoding,
    Appending,
    AdvancingCursor,
}

/// Runs one scan cycle: read cursor, fetch head, fetch logs, decode, append,
/// advance cursor.
///
/// The ledger is persisted before the cursor moves, so a crash between the
/// two re-fetches an already recorded range (deduplicated on append) instead
/// of skipping one.
#[derive(Debug)]
pub struct ScanOrchestrator {
    rpc: Arc<dyn RpcClient>,
    cursor: Arc<dyn CursorStore>,
    ledger: Arc<dyn LedgerStore>,
    vault: VaultConfig,
    wallet: Address,
    decoder: EventDecoder,
    scan_lock: Mutex<()>,
}

impl ScanOrchestrator {
    pub fn new(
        rpc: Arc<dyn RpcClient>,
        cursor: Arc<dyn CursorStore>,
        ledger: Arc<dyn LedgerStore>,
        vault: VaultConfig,
        wallet: Address,
    ) -> Self {
        let decoder = vault.decoder();
        Self {
            rpc,
            cursor,
            ledger,
            vault,
            wallet,
            decoder,
            scan_lock: Mutex::new(()),
        }
    }

    /// Scan `[cursor, head]` and record new vault transactions.
    ///
    /// On any failure the cursor is left where it was. Logs that fail to
    /// decode are reported in the outcome and skipped.
    pub async fn scan(&self) -> Result<ScanOutcome, ScanFailure> {
        let _guard = self.scan_lock.lock().await;

        let from_block = self.cursor.get().await.map_err(ScanFailure::Cursor)?;

        debug!(vault = %self.vault.name, phase = ?ScanPhase::FetchingHead, from_block);
        let head = self
            .rpc
            .block_number()
            .await
            .map_err(ScanFailure::HeadUnavailable)?;

        if head < from_block {
            warn!(
                vault = %self.vault.name,
                head,
                from_block,
                "Chain head is behind the scan cursor, skipping scan"
            );
            return Ok(ScanOutcome {
                from_block,
                new_cursor: from_block,
                logs_fetched: 0,
                new_transaction_count: 0,
                decode_failures: Vec::new(),
            });
        }

        debug!(vault = %self.vault.name, phase = ?ScanPhase::FetchingLogs, from_block, to_block = head);
        let filter = self.vault.log_filter(&self.wallet, from_block, head);
        let logs = self
            .rpc
            .get_logs(&filter)
            .await
            .map_err(|source| ScanFailure::LogsUnavailable {
                from_block,
                to_block: head,
                source,
            })?;

        debug!(vault = %self.vault.name, phase = ?ScanPhase::Decoding, logs = logs.len());
        let (records, decode_failures) = self.decode_all(&logs);

        debug!(vault = %self.vault.name, phase = ?ScanPhase::Appending, records = records.len());
        let new_transaction_count = if records.is_empty() {
            0
        } else {
            self.ledger
                .append(&records)
                .await
                .map_err(ScanFailure::LedgerPersistence)?
        };

        debug!(vault = %self.vault.name, phase = ?ScanPhase::AdvancingCursor, to_block = head);
        self.cursor
            .set(head)
            .await
            .map_err(|source| ScanFailure::CursorPersistence {
                block: head,
                source,
            })?;

        info!(
            vault = %self.vault.name,
            from_block,
            to_block = head,
            logs = logs.len(),
            new_transactions = new_transaction_count,
            decode_failures = decode_failures.len(),
            "Scan complete"
        );

        Ok(ScanOutcome {
            from_block,
            new_cursor: head,
            logs_fetched: logs.len(),
            new_transaction_count,
            decode_failures,
        })
    }

    /// Decode logs into records in ascending block order.
    fn decode_all(&self, logs: &[RawLog]) -> (Vec<TransactionRecord>, Vec<DecodeDiagnostic>) {
        let mut records = Vec::with_capacity(logs.len());
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        for log in logs {
            match self.decoder.decode(log) {
                Ok(record) => {
                    if !seen.insert(record.transaction_hash.dedup_key()) {
                        warn!(
                            tx_hash = %record.transaction_hash,
                            "Multiple vault events in one transaction, only the first is recorded"
                        );
                    }
                    records.push(record);
                }
                Err(error) => {
                    warn!(
                        tx_hash = ?log.transaction_hash,
                        block = ?log.block_number,
                        error = %error,
                        "Skipping undecodable log"
                    );
                    failures.push(DecodeDiagnostic {
                        transaction_hash: log.transaction_hash.clone(),
                        block_number: log.block_number.clone(),
                        error,
                    });
                }
            }
        }

        records.sort_by_key(|r| r.block_number);
        (records, failures)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Cursor value the scan started from.
    pub from_block: u64,
    /// Cursor value after the scan.
    pub new_cursor: u64,
    pub logs_fetched: usize,
    pub new_transaction_count: usize,
    pub decode_failures: Vec<DecodeDiagnostic>,
}

/// A log dropped during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeDiagnostic {
    pub transaction_hash: Option<String>,
    pub block_number: Option<String>,
    pub error: DecodeError,
}

#[derive(Debug, Error)]
pub enum ScanFailure {
    #[error("failed to read scan cursor: {0}")]
    Cursor(#[source] StoreError),
    #[error("chain head unavailable: {0}")]
    HeadUnavailable(#[source] RpcError),
    #[error("logs unavailable for blocks {from_block}..={to_block}: {source}")]
    LogsUnavailable {
        from_block: u64,
        to_block: u64,
        #[source]
        source: RpcError,
    },
    #[error("failed to persist ledger: {0}")]
    LedgerPersistence(#[source] StoreError),
    #[error("ledger persisted but cursor not advanced to {block}: {source}")]
    CursorPersistence {
        block: u64,
        #[source]
        source: StoreError,
    },
}

impl ScanFailure {
    /// The phase the scan was in when it failed.
    pub fn phase(&self) -> ScanPhase {
        match self {
            ScanFailure::Cursor(_) => ScanPhase::ReadingCursor,
            ScanFailure::HeadUnavailable(_) => ScanPhase::FetchingHead,
            ScanFailure::LogsUnavailable { .. } => ScanPhase::FetchingLogs,
            ScanFailure::LedgerPersistence(_) => ScanPhase::Appending,
            ScanFailure::CursorPersistence { .. } => ScanPhase::AdvancingCursor,
        }
    }

    /// Network failures: the next scan retries the same range.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScanFailure::HeadUnavailable(_) | ScanFailure::LogsUnavailable { .. }
        )
    }
}
