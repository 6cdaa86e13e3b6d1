use crate::domain::{Address, AddressParseError};
use crate::engine::{CostBasisPolicy, EventDecoder, EventLayout};
use crate::rpc::LogFilter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Deposit event topic shared by the GOAT vaults.
pub const DEPOSIT_EVENT_TOPIC: &str =
    "0xdcbc1c05240f31ff3ad067ef1ee35ce4997762752e3a095284754544f4c709d7";
/// Withdraw event topic shared by the GOAT vaults.
pub const WITHDRAW_EVENT_TOPIC: &str =
    "0xfbde797d201c681b91056529119e0b02407c7bb96a4a2c75c01fc9667232c8db";

pub const DEFAULT_RPC_URL: &str = "https://arb1.arbitrum.io/rpc";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub wallet: Address,
    pub state_dir: PathBuf,
    pub vault: VaultConfig,
    pub cost_basis: CostBasisPolicy,
}

/// Which primary topics `eth_getLogs` is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicFilter {
    /// Any event with the wallet in the second topic slot.
    AnyEvent,
    /// Only Deposit and Withdraw.
    DepositOrWithdraw,
}

/// How the wallet's current position value is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceSource {
    /// `balanceOf(wallet)` on the vault, plus on a staking contract if set.
    BalanceOf { staking: Option<Address> },
    /// `balanceOf(wallet)` shares times the vault's `pricePerShare()`.
    SharesTimesPricePerShare { pps_decimals: u32 },
}

/// One tracked vault instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Short name, also the prefix of the state files.
    pub name: String,
    pub contract: Address,
    pub decimals: u32,
    pub layout: EventLayout,
    pub topic_filter: TopicFilter,
    pub balance_source: BalanceSource,
    /// First block scanned when no cursor is stored.
    pub genesis_block: u64,
    pub deposit_topic: String,
    pub withdraw_topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultPreset {
    GoatEth,
    GoatUsdce,
}

/// Paths of one vault's state files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFiles {
    pub cursor: PathBuf,
    pub ledger: PathBuf,
    pub refresh_stamp: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl VaultPreset {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "goat-eth" => Some(VaultPreset::GoatEth),
            "goat-usdce" => Some(VaultPreset::GoatUsdce),
            _ => None,
        }
    }

    pub fn vault_config(&self) -> Result<VaultConfig, AddressParseError> {
        match self {
            VaultPreset::GoatEth => Ok(VaultConfig {
                name: "goat-eth".to_string(),
                contract: Address::parse("0x878b7897C60fA51c2A7bfBdd4E3cB5708D9eEE43")?,
                decimals: 18,
                layout: EventLayout::AssetsAndShares,
                topic_filter: TopicFilter::AnyEvent,
                balance_source: BalanceSource::BalanceOf {
                    staking: Some(Address::parse("0xDE1aFF6cc38f3dBed0A93b3C268Cf391B68209aF")?),
                },
                genesis_block: 165_000_000,
                deposit_topic: DEPOSIT_EVENT_TOPIC.to_string(),
                withdraw_topic: WITHDRAW_EVENT_TOPIC.to_string(),
            }),
            VaultPreset::GoatUsdce => Ok(VaultConfig {
                name: "goat-usdce".to_string(),
                contract: Address::parse("0x8a1eF3066553275829d1c0F64EE8D5871D5ce9d3")?,
                decimals: 6,
                layout: EventLayout::SingleAmount,
                topic_filter: TopicFilter::DepositOrWithdraw,
                balance_source: BalanceSource::SharesTimesPricePerShare { pps_decimals: 18 },
                genesis_block: 267_480_446,
                deposit_topic: DEPOSIT_EVENT_TOPIC.to_string(),
                withdraw_topic: WITHDRAW_EVENT_TOPIC.to_string(),
            }),
        }
    }
}

impl VaultConfig {
    pub fn decoder(&self) -> EventDecoder {
        EventDecoder::new(
            self.deposit_topic.clone(),
            self.withdraw_topic.clone(),
            self.layout,
            self.decimals,
        )
    }

    /// `eth_getLogs` filter for `wallet`'s events over `[from_block, to_block]`.
    pub fn log_filter(&self, wallet: &Address, from_block: u64, to_block: u64) -> LogFilter {
        let primary_topics = match self.topic_filter {
            TopicFilter::AnyEvent => None,
            TopicFilter::DepositOrWithdraw => {
                Some(vec![self.deposit_topic.clone(), self.withdraw_topic.clone()])
            }
        };
        LogFilter {
            from_block,
            to_block,
            address: self.contract.clone(),
            primary_topics,
            indexed_topic: wallet.to_topic(),
        }
    }

    pub fn files(&self, state_dir: &Path) -> VaultFiles {
        VaultFiles {
            cursor: state_dir.join(format!("{}_last_block.txt", self.name)),
            ledger: state_dir.join(format!("{}_transactions.json", self.name)),
            refresh_stamp: state_dir.join(format!("{}_last_refresh.txt", self.name)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let wallet = env_map
            .get("WALLET_ADDRESS")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("WALLET_ADDRESS".to_string()))
            .and_then(|s| parse_address("WALLET_ADDRESS", s))?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let state_dir = PathBuf::from(
            env_map
                .get("STATE_DIR")
                .map(|s| s.as_str())
                .unwrap_or("state"),
        );

        let preset_name = env_map
            .get("VAULT")
            .map(|s| s.as_str())
            .unwrap_or("goat-eth");
        let preset = VaultPreset::parse(preset_name).ok_or_else(|| {
            ConfigError::InvalidValue(
                "VAULT".to_string(),
                format!("must be goat-eth or goat-usdce, got {}", preset_name),
            )
        })?;
        let mut vault = preset
            .vault_config()
            .map_err(|e| ConfigError::InvalidValue("VAULT".to_string(), e.to_string()))?;

        if let Some(contract) = env_map.get("VAULT_CONTRACT") {
            vault.contract = parse_address("VAULT_CONTRACT", contract)?;
        }

        if let Some(staking) = env_map.get("STAKING_CONTRACT") {
            match &mut vault.balance_source {
                BalanceSource::BalanceOf { staking: slot } => {
                    *slot = if staking.trim().is_empty() {
                        None
                    } else {
                        Some(parse_address("STAKING_CONTRACT", staking)?)
                    };
                }
                BalanceSource::SharesTimesPricePerShare { .. } => {
                    return Err(ConfigError::InvalidValue(
                        "STAKING_CONTRACT".to_string(),
                        format!("not supported by vault {}", vault.name),
                    ))
                }
            }
        }

        if let Some(genesis) = env_map.get("GENESIS_BLOCK") {
            vault.genesis_block = genesis.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "GENESIS_BLOCK".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;
        }

        let cost_basis = match env_map
            .get("COST_BASIS")
            .map(|s| s.as_str())
            .unwrap_or("net")
        {
            "net" => CostBasisPolicy::NetCashFlow,
            "average" => CostBasisPolicy::AverageCost,
            other => {
                return Err(ConfigError::InvalidValue(
                    "COST_BASIS".to_string(),
                    format!("must be net or average, got {}", other),
                ))
            }
        };

        Ok(Config {
            rpc_url,
            wallet,
            state_dir,
            vault,
            cost_basis,
        })
    }

    pub fn files(&self) -> VaultFiles {
        self.vault.files(&self.state_dir)
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    Address::parse(value).map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x6833df4E1edB361A04491349833c83A4868ABCdA";

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("WALLET_ADDRESS".to_string(), WALLET.to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.state_dir, PathBuf::from("state"));
        assert_eq!(config.vault.name, "goat-eth");
        assert_eq!(config.vault.genesis_block, 165_000_000);
        assert_eq!(config.cost_basis, CostBasisPolicy::NetCashFlow);
    }

    #[test]
    fn test_missing_wallet() {
        let mut env_map = setup_required_env();
        env_map.remove("WALLET_ADDRESS");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "WALLET_ADDRESS"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_wallet() {
        let mut env_map = setup_required_env();
        env_map.insert("WALLET_ADDRESS".to_string(), "0x1234".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "WALLET_ADDRESS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_vault_preset() {
        let mut env_map = setup_required_env();
        env_map.insert("VAULT".to_string(), "goat-btc".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "VAULT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_usdce_preset() {
        let mut env_map = setup_required_env();
        env_map.insert("VAULT".to_string(), "goat-usdce".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.vault.decimals, 6);
        assert_eq!(config.vault.layout, EventLayout::SingleAmount);
        assert_eq!(config.vault.genesis_block, 267_480_446);
        assert_eq!(
            config.vault.balance_source,
            BalanceSource::SharesTimesPricePerShare { pps_decimals: 18 }
        );
    }

    #[test]
    fn test_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert("GENESIS_BLOCK".to_string(), "100".to_string());
        env_map.insert("STAKING_CONTRACT".to_string(), "".to_string());
        env_map.insert("COST_BASIS".to_string(), "average".to_string());
        env_map.insert("STATE_DIR".to_string(), "/tmp/vaultwatch".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.vault.genesis_block, 100);
        assert_eq!(
            config.vault.balance_source,
            BalanceSource::BalanceOf { staking: None }
        );
        assert_eq!(config.cost_basis, CostBasisPolicy::AverageCost);
        assert_eq!(
            config.files().ledger,
            PathBuf::from("/tmp/vaultwatch/goat-eth_transactions.json")
        );
    }

    #[test]
    fn test_invalid_genesis_block() {
        let mut env_map = setup_required_env();
        env_map.insert("GENESIS_BLOCK".to_string(), "-1".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "GENESIS_BLOCK"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_staking_rejected_for_pps_vault() {
        let mut env_map = setup_required_env();
        env_map.insert("VAULT".to_string(), "goat-usdce".to_string());
        env_map.insert("STAKING_CONTRACT".to_string(), WALLET.to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "STAKING_CONTRACT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_log_filter_topics_follow_vault() {
        let wallet = Address::parse(WALLET).unwrap();
        let eth = VaultPreset::GoatEth.vault_config().unwrap();
        assert!(eth.log_filter(&wallet, 1, 2).primary_topics.is_none());

        let usdce = VaultPreset::GoatUsdce.vault_config().unwrap();
        let filter = usdce.log_filter(&wallet, 1, 2);
        assert_eq!(
            filter.primary_topics,
            Some(vec![
                DEPOSIT_EVENT_TOPIC.to_string(),
                WITHDRAW_EVENT_TOPIC.to_string()
            ])
        );
        assert_eq!(filter.indexed_topic, wallet.to_topic());
    }
}
