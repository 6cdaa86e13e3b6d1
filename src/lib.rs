pub mod config;
pub mod domain;
pub mod engine;
pub mod orchestration;
pub mod rpc;
pub mod store;

pub use config::{Config, VaultConfig, VaultPreset};
pub use domain::{
    Address, Decimal, Ledger, RawLog, TransactionKind, TransactionRecord, TxHash,
};
pub use engine::{CostBasisPolicy, EventDecoder, ProfitCalculator, ProfitResult};
pub use orchestration::{ScanFailure, ScanOrchestrator, ScanOutcome, VaultMonitor};
pub use rpc::{HttpRpcClient, MockRpcClient, RpcClient, RpcError};
pub use store::{CursorStore, FileCursorStore, FileLedgerStore, LedgerStore, StoreError};
