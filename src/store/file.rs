//! File-backed stores: plain-text cursor, JSON ledger.

use super::{CursorStore, LedgerStore, StoreError};
use crate::domain::{Ledger, TransactionRecord};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Read a file, mapping "not found" to `None`.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Replace `path` with `contents` via a synced temp file and rename, so a
/// crash leaves either the old or the new content, never a torn write.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| io_error(&tmp_path, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| io_error(&tmp_path, e))?;
    file.sync_all().await.map_err(|e| io_error(&tmp_path, e))?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Cursor persisted as a decimal integer in a text file.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
    genesis_block: u64,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>, genesis_block: u64) -> Self {
        Self {
            path: path.into(),
            genesis_block,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn get(&self) -> Result<u64, StoreError> {
        match read_optional(&self.path).await? {
            None => Ok(self.genesis_block),
            Some(content) => {
                content
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| StoreError::StaleData {
                        path: self.path.clone(),
                        reason: format!("cursor {:?} is not a block number: {}", content.trim(), e),
                    })
            }
        }
    }

    async fn set(&self, block_number: u64) -> Result<(), StoreError> {
        write_atomic(&self.path, block_number.to_string().as_bytes()).await?;
        debug!(path = %self.path.display(), block_number, "Cursor persisted");
        Ok(())
    }
}

/// Ledger persisted as a JSON array of transaction records.
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
    // Serializes load-modify-write within the process.
    write_lock: Mutex<()>,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_ledger(&self) -> Result<Ledger, StoreError> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Ledger::new());
        };

        let records: Vec<TransactionRecord> =
            serde_json::from_str(&content).map_err(|e| StoreError::StaleData {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Ledger::from_records(records))
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn load(&self) -> Result<Ledger, StoreError> {
        self.read_ledger().await
    }

    async fn append(&self, new_records: &[TransactionRecord]) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        // A corrupt file aborts here rather than being overwritten.
        let mut ledger = self.read_ledger().await?;
        let added = ledger.append(new_records);
        if added == 0 {
            return Ok(0);
        }

        let json = serde_json::to_vec(ledger.records())?;
        write_atomic(&self.path, &json).await?;
        debug!(path = %self.path.display(), added, total = ledger.len(), "Ledger persisted");
        Ok(added)
    }
}
