use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vaultwatch::{Config, HttpRpcClient, RpcClient, VaultMonitor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let rpc: Arc<dyn RpcClient> = Arc::new(HttpRpcClient::new(config.rpc_url.clone()));
    let monitor = VaultMonitor::from_config(&config, rpc);

    let report = monitor
        .refresh(chrono::Utc::now())
        .await
        .with_context(|| format!("Failed to refresh vault {}", config.vault.name))?;

    if let Err(failure) = &report.scan {
        warn!(error = %failure, "Showing last known ledger, scan will retry on next refresh");
    }

    for record in &report.ledger {
        debug!(
            kind = %record.kind,
            amount = %record.amount,
            block = record.block_number,
            tx_hash = %record.transaction_hash,
            "Transaction"
        );
    }

    let profit = &report.profit;
    info!(
        vault = %config.vault.name,
        wallet = %config.wallet,
        balance = %profit.current_balance.round_dp(6),
        deposited = %profit.total_deposited.round_dp(6),
        withdrawn = %profit.total_withdrawn.round_dp(6),
        "Position"
    );
    if profit.has_baseline {
        info!(profit = %profit.profit.round_dp(6), cost_basis = %profit.cost_basis.round_dp(6), "Profit");
    } else {
        info!("No deposits recorded yet, profit not available");
    }
    info!(last_refresh = %report.previous_age(), "Refreshed");

    Ok(())
}
