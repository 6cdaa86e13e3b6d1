//! Profit computation against the ledger's cost basis.

use crate::domain::{Decimal, Ledger, TransactionKind};
use serde::{Deserialize, Serialize};

/// How the ledger is turned into a cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasisPolicy {
    /// Deposited amount minus withdrawn amount, ignoring share prices.
    #[default]
    NetCashFlow,
    /// Average cost per held share; redemptions remove cost pro rata to the
    /// shares redeemed. Withdrawals without a share count fall back to cash flow.
    AverageCost,
}

/// Derived position summary. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitResult {
    pub total_deposited: Decimal,
    pub total_withdrawn: Decimal,
    /// `total_deposited - total_withdrawn`
    pub net_deposits: Decimal,
    /// Baseline the balance is compared against under the chosen policy.
    pub cost_basis: Decimal,
    pub current_balance: Decimal,
    /// `current_balance - cost_basis`
    pub profit: Decimal,
    /// False when the ledger is empty: profit then equals the balance and is
    /// not a meaningful gain.
    pub has_baseline: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitCalculator {
    policy: CostBasisPolicy,
}

impl ProfitCalculator {
    pub fn new(policy: CostBasisPolicy) -> Self {
        Self { policy }
    }

    /// `current_balance - cost_basis`.
    pub fn compute_profit(&self, ledger: &Ledger, current_balance: Decimal) -> Decimal {
        self.compute(ledger, current_balance).profit
    }

    pub fn compute(&self, ledger: &Ledger, current_balance: Decimal) -> ProfitResult {
        let (total_deposited, total_withdrawn) =
            ledger
                .iter()
                .fold((Decimal::zero(), Decimal::zero()), |(dep, wd), r| match r.kind {
                    TransactionKind::Deposit => (dep + r.amount, wd),
                    TransactionKind::Withdraw => (dep, wd + r.amount),
                });
        let net_deposits = total_deposited - total_withdrawn;

        let cost_basis = match self.policy {
            CostBasisPolicy::NetCashFlow => net_deposits,
            CostBasisPolicy::AverageCost => average_cost_basis(ledger),
        };

        ProfitResult {
            total_deposited,
            total_withdrawn,
            net_deposits,
            cost_basis,
            current_balance,
            profit: current_balance - cost_basis,
            has_baseline: !ledger.is_empty(),
        }
    }
}

fn average_cost_basis(ledger: &Ledger) -> Decimal {
    let mut cost = Decimal::zero();
    let mut held = Decimal::zero();

    for record in ledger {
        match (record.kind, record.shares) {
            (TransactionKind::Deposit, shares) => {
                cost = cost + record.amount;
                if let Some(shares) = shares {
                    held = held + shares;
                }
            }
            (TransactionKind::Withdraw, Some(shares)) if held.is_positive() => {
                let redeemed = if shares > held { held } else { shares };
                let released = redeemed
                    .checked_div(held)
                    .and_then(|fraction| cost.checked_mul(fraction))
                    .unwrap_or(cost);
                cost = cost - released;
                held = held - redeemed;
            }
            (TransactionKind::Withdraw, _) => {
                cost = cost - record.amount;
            }
        }
        if cost.is_negative() {
            cost = Decimal::zero();
        }
    }

    cost
}
