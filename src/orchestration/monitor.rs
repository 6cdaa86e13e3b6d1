//! One vault's refresh cycle: scan, reload the ledger, read the balance,
//! compute profit, stamp the refresh time.

use super::balance::{BalanceError, BalanceReader};
use super::scan::{ScanFailure, ScanOrchestrator, ScanOutcome};
use crate::config::{Config, VaultConfig};
use crate::domain::{Address, Ledger};
use crate::engine::{CostBasisPolicy, ProfitCalculator, ProfitResult};
use crate::rpc::RpcClient;
use crate::store::{
    describe_age, CursorStore, FileCursorStore, FileLedgerStore, LedgerStore, RefreshStampStore,
    StoreError,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Scan(#[from] ScanFailure),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

#[derive(Debug)]
pub struct RefreshReport {
    /// A transient scan failure does not fail the refresh; it is carried here.
    pub scan: Result<ScanOutcome, ScanFailure>,
    pub ledger: Ledger,
    pub profit: ProfitResult,
    pub previous_refresh: Option<DateTime<Utc>>,
    pub refreshed_at: DateTime<Utc>,
}

impl RefreshReport {
    /// Age of the previous refresh relative to this one.
    pub fn previous_age(&self) -> String {
        describe_age(self.previous_refresh, self.refreshed_at)
    }
}

#[derive(Debug)]
pub struct VaultMonitor {
    vault_name: String,
    scanner: ScanOrchestrator,
    ledger: Arc<dyn LedgerStore>,
    balance: BalanceReader,
    calculator: ProfitCalculator,
    stamp: Option<RefreshStampStore>,
}

impl VaultMonitor {
    pub fn new(
        rpc: Arc<dyn RpcClient>,
        cursor: Arc<dyn CursorStore>,
        ledger: Arc<dyn LedgerStore>,
        vault: VaultConfig,
        wallet: Address,
        cost_basis: CostBasisPolicy,
    ) -> Self {
        let balance = BalanceReader::new(rpc.clone(), vault.clone(), wallet.clone());
        let vault_name = vault.name.clone();
        let scanner = ScanOrchestrator::new(rpc, cursor, ledger.clone(), vault, wallet);
        Self {
            vault_name,
            scanner,
            ledger,
            balance,
            calculator: ProfitCalculator::new(cost_basis),
            stamp: None,
        }
    }

    pub fn with_refresh_stamp(mut self, stamp: RefreshStampStore) -> Self {
        self.stamp = Some(stamp);
        self
    }

    /// File-backed monitor for the configured vault.
    pub fn from_config(config: &Config, rpc: Arc<dyn RpcClient>) -> Self {
        let files = config.files();
        let cursor = Arc::new(FileCursorStore::new(
            files.cursor,
            config.vault.genesis_block,
        ));
        let ledger = Arc::new(FileLedgerStore::new(files.ledger));
        Self::new(
            rpc,
            cursor,
            ledger,
            config.vault.clone(),
            config.wallet.clone(),
            config.cost_basis,
        )
        .with_refresh_stamp(RefreshStampStore::new(files.refresh_stamp))
    }

    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<RefreshReport, MonitorError> {
        let scan = match self.scanner.scan().await {
            Ok(outcome) => Ok(outcome),
            Err(failure) if failure.is_transient() => {
                warn!(
                    vault = %self.vault_name,
                    phase = ?failure.phase(),
                    error = %failure,
                    "Scan failed, reporting from stored ledger"
                );
                Err(failure)
            }
            Err(failure) => return Err(failure.into()),
        };

        let ledger = self.ledger.load().await?;
        let current_balance = self.balance.current_balance().await?;
        let profit = self.calculator.compute(&ledger, current_balance);

        let previous_refresh = match &self.stamp {
            Some(stamp) => {
                let previous = stamp.last().await?;
                stamp.record(now).await?;
                previous
            }
            None => None,
        };

        info!(
            vault = %self.vault_name,
            transactions = ledger.len(),
            balance = %profit.current_balance,
            profit = %profit.profit,
            "Refresh complete"
        );

        Ok(RefreshReport {
            scan,
            ledger,
            profit,
            previous_refresh,
            refreshed_at: now,
        })
    }
}
