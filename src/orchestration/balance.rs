//! Current position value, read from the vault contracts.

use crate::config::{BalanceSource, VaultConfig};
use crate::domain::{Address, Decimal};
use crate::rpc::abi::{self, AbiError};
use crate::rpc::{RpcClient, RpcError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("balance call failed: {0}")]
    Rpc(#[from] RpcError),
    #[error("malformed {call} result: {source}")]
    Malformed {
        call: &'static str,
        #[source]
        source: AbiError,
    },
    #[error("{call} result is empty")]
    Empty { call: &'static str },
    #[error("{0} value does not fit the decimal range")]
    Overflow(&'static str),
}

#[derive(Debug, Clone)]
pub struct BalanceReader {
    rpc: Arc<dyn RpcClient>,
    vault: VaultConfig,
    wallet: Address,
}

impl BalanceReader {
    pub fn new(rpc: Arc<dyn RpcClient>, vault: VaultConfig, wallet: Address) -> Self {
        Self { rpc, vault, wallet }
    }

    /// The wallet's position in the vault's asset units.
    ///
    /// RPC failures propagate; a failed read is never reported as zero.
    pub async fn current_balance(&self) -> Result<Decimal, BalanceError> {
        let balance = match &self.vault.balance_source {
            BalanceSource::BalanceOf { staking } => {
                let mut raw = self.balance_of(&self.vault.contract).await?;
                if let Some(staking) = staking {
                    let staked = self.balance_of(staking).await?;
                    raw = raw
                        .checked_add(staked)
                        .ok_or(BalanceError::Overflow("balanceOf"))?;
                }
                Decimal::from_scaled_integer(raw, self.vault.decimals)
                    .ok_or(BalanceError::Overflow("balanceOf"))?
            }
            BalanceSource::SharesTimesPricePerShare { pps_decimals } => {
                let shares_raw = self.balance_of(&self.vault.contract).await?;
                let shares = Decimal::from_scaled_integer(shares_raw, self.vault.decimals)
                    .ok_or(BalanceError::Overflow("balanceOf"))?;
                let pps_raw = self
                    .call_uint(
                        &self.vault.contract,
                        abi::encode_call(abi::PRICE_PER_SHARE_SELECTOR, &[]),
                        "pricePerShare",
                    )
                    .await?;
                let pps = Decimal::from_scaled_integer(pps_raw, *pps_decimals)
                    .ok_or(BalanceError::Overflow("pricePerShare"))?;
                shares
                    .checked_mul(pps)
                    .ok_or(BalanceError::Overflow("position"))?
            }
        };

        debug!(vault = %self.vault.name, balance = %balance, "Read current balance");
        Ok(balance)
    }

    async fn balance_of(&self, contract: &Address) -> Result<u128, BalanceError> {
        let data = abi::encode_call(abi::BALANCE_OF_SELECTOR, &[&self.wallet]);
        self.call_uint(contract, data, "balanceOf").await
    }

    async fn call_uint(
        &self,
        contract: &Address,
        data: String,
        call: &'static str,
    ) -> Result<u128, BalanceError> {
        let result = self.rpc.call(contract, &data).await?;
        let words =
            abi::decode_words(&result).map_err(|source| BalanceError::Malformed { call, source })?;
        let word = words.first().ok_or(BalanceError::Empty { call })?;
        abi::word_to_u128(word).ok_or(BalanceError::Overflow(call))
    }
}
