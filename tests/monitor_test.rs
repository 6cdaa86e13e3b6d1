use chrono::{Duration, TimeZone, Utc};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use vaultwatch::config::{Config, DEPOSIT_EVENT_TOPIC, WITHDRAW_EVENT_TOPIC};
use vaultwatch::rpc::abi;
use vaultwatch::{Address, CostBasisPolicy, Decimal, MockRpcClient, RawLog, VaultMonitor};

const WALLET: &str = "0x6833df4E1edB361A04491349833c83A4868ABCdA";

fn config(state_dir: &std::path::Path, cost_basis: &str) -> Config {
    let env = [
        ("WALLET_ADDRESS", WALLET),
        ("VAULT", "goat-usdce"),
        ("COST_BASIS", cost_basis),
        ("STATE_DIR", state_dir.to_str().unwrap()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Config::from_env_map(env).unwrap()
}

fn amount_log(topic: &str, block: u64, hash: &str, amount: u128) -> RawLog {
    RawLog::new(
        vec![
            topic.to_string(),
            Address::parse(WALLET).unwrap().to_topic(),
        ],
        format!("0x{:064x}", amount),
        block,
        hash,
    )
}

fn rpc_with_position(config: &Config, shares: u128, pps: u128) -> MockRpcClient {
    let wallet = Address::parse(WALLET).unwrap();
    MockRpcClient::new()
        .with_call_result(
            &config.vault.contract,
            &abi::encode_call(abi::BALANCE_OF_SELECTOR, &[&wallet]),
            &format!("0x{:064x}", shares),
        )
        .with_call_result(
            &config.vault.contract,
            &abi::encode_call(abi::PRICE_PER_SHARE_SELECTOR, &[]),
            &format!("0x{:064x}", pps),
        )
}

#[tokio::test]
async fn test_refresh_persists_state_and_reports_profit() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path(), "net");
    let genesis = config.vault.genesis_block;
    let rpc = rpc_with_position(&config, 60_000_000, 1_100_000_000_000_000_000)
        .with_head(genesis + 100)
        .with_log(amount_log(DEPOSIT_EVENT_TOPIC, genesis + 10, "0x01", 100_000_000))
        .with_log(amount_log(WITHDRAW_EVENT_TOPIC, genesis + 20, "0x02", 40_000_000));
    let monitor = VaultMonitor::from_config(&config, Arc::new(rpc));

    let first = Utc.with_ymd_and_hms(2024, 11, 3, 12, 0, 0).unwrap();
    let report = monitor.refresh(first).await.unwrap();
    assert_eq!(report.ledger.len(), 2);
    assert_eq!(report.profit.net_deposits, Decimal::from_str("60").unwrap());
    assert_eq!(report.profit.current_balance, Decimal::from_str("66").unwrap());
    assert_eq!(report.profit.profit, Decimal::from_str("6").unwrap());
    assert_eq!(report.previous_age(), "N/A");

    let files = config.files();
    assert_eq!(
        std::fs::read_to_string(&files.cursor).unwrap(),
        (genesis + 100).to_string()
    );
    assert!(files.ledger.exists());

    let second = first + Duration::minutes(5);
    let report = monitor.refresh(second).await.unwrap();
    assert_eq!(report.scan.as_ref().unwrap().new_transaction_count, 0);
    assert_eq!(report.ledger.len(), 2);
    assert_eq!(report.previous_age(), "5m ago");
}

#[tokio::test]
async fn test_refresh_with_empty_ledger_has_no_baseline() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path(), "average");
    assert_eq!(config.cost_basis, CostBasisPolicy::AverageCost);
    let rpc = rpc_with_position(&config, 0, 1_000_000_000_000_000_000)
        .with_head(config.vault.genesis_block + 1);

    let monitor = VaultMonitor::from_config(&config, Arc::new(rpc));
    let report = monitor.refresh(Utc::now()).await.unwrap();
    assert!(!report.profit.has_baseline);
    assert!(report.profit.profit.is_zero());
}
