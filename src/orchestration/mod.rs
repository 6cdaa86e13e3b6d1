pub mod balance;
pub mod monitor;
pub mod scan;

pub use balance::{BalanceError, BalanceReader};
pub use monitor::{MonitorError, RefreshReport, VaultMonitor};
pub use scan::{DecodeDiagnostic, ScanFailure, ScanOrchestrator, ScanOutcome, ScanPhase};
