//! Append-only, deduplicated transaction ledger.

use crate::domain::TransactionRecord;
use std::collections::HashSet;
use tracing::warn;

/// Ordered sequence of vault transactions in discovery order.
///
/// No two records share a transaction hash (compared case-insensitively).
/// Records are never mutated or removed once appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<TransactionRecord>,
    seen: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from persisted records.
    ///
    /// Files written before deduplication existed may repeat a hash; later
    /// copies are dropped and reported.
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let mut ledger = Ledger::new();
        for record in records {
            let hash = record.transaction_hash.clone();
            if !ledger.push_unique(record) {
                warn!(tx_hash = %hash, "Duplicate transaction in persisted ledger, keeping first");
            }
        }
        ledger
    }

    /// Append records whose hash is not yet present, keeping their relative order.
    ///
    /// Returns the number of records added. Duplicates within `new_records`
    /// are collapsed to the first occurrence.
    pub fn append(&mut self, new_records: &[TransactionRecord]) -> usize {
        new_records
            .iter()
            .filter(|record| self.push_unique((*record).clone()))
            .count()
    }

    pub fn contains(&self, tx_hash: &str) -> bool {
        self.seen.contains(&tx_hash.trim().to_ascii_lowercase())
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push_unique(&mut self, record: TransactionRecord) -> bool {
        if self.seen.insert(record.transaction_hash.dedup_key()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a TransactionRecord;
    type IntoIter = std::slice::Iter<'a, TransactionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TransactionKind};
    use std::str::FromStr;

    fn deposit(amount: &str, block: u64, hash: &str) -> TransactionRecord {
        TransactionRecord::new(
            TransactionKind::Deposit,
            Decimal::from_str(amount).unwrap(),
            block,
            hash,
        )
    }

    #[test]
    fn test_append_skips_known_hashes() {
        let mut ledger = Ledger::from_records(vec![deposit("1", 10, "0xaa")]);
        let added = ledger.append(&[deposit("1", 10, "0xAA"), deposit("2", 11, "0xbb")]);
        assert_eq!(added, 1);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.records()[1].transaction_hash.as_str(), "0xbb");
    }

    #[test]
    fn test_append_is_idempotent() {
        let batch = vec![deposit("1", 10, "0x01"), deposit("2", 12, "0x02")];
        let mut once = Ledger::new();
        once.append(&batch);

        let mut twice = Ledger::new();
        assert_eq!(twice.append(&batch), 2);
        assert_eq!(twice.append(&batch), 0);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_append_collapses_duplicates_within_batch() {
        let mut ledger = Ledger::new();
        let added = ledger.append(&[
            deposit("1", 10, "0x01"),
            deposit("5", 10, "0x01"),
            deposit("2", 11, "0x02"),
        ]);
        assert_eq!(added, 2);
        assert_eq!(ledger.records()[0].amount, Decimal::from_str("1").unwrap());
    }

    #[test]
    fn test_append_preserves_relative_order() {
        let mut ledger = Ledger::from_records(vec![deposit("1", 5, "0x05")]);
        ledger.append(&[
            deposit("1", 7, "0x07"),
            deposit("1", 5, "0x05"),
            deposit("1", 9, "0x09"),
        ]);
        let blocks: Vec<u64> = ledger.iter().map(|r| r.block_number).collect();
        assert_eq!(blocks, vec![5, 7, 9]);
    }

    #[test]
    fn test_overlapping_ranges_count_distinct_hashes() {
        let first = vec![deposit("1", 1, "0x1"), deposit("1", 2, "0x2"), deposit("1", 3, "0x3")];
        let second = vec![deposit("1", 2, "0x2"), deposit("1", 3, "0x3"), deposit("1", 4, "0x4")];
        let mut ledger = Ledger::new();
        ledger.append(&first);
        ledger.append(&second);
        assert_eq!(ledger.len(), 4);
    }

    #[test]
    fn test_from_records_drops_repeated_hashes() {
        let ledger = Ledger::from_records(vec![
            deposit("1", 1, "0x1"),
            deposit("1", 1, "0x1"),
            deposit("3", 2, "0x2"),
        ]);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("0X1"));
    }
}
