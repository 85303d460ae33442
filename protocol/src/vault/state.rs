//! Share accounting for the deposit pool.
//!
//! Depositors hold shares against the pool rather than fixed balances. The
//! share price rises as repaid interest is folded into `total_deposits`, so
//! yield accrues to every holder pro rata with no per-account bookkeeping.
//! Conversions floor in the pool's favor: a depositor can never mint shares
//! worth more than they paid in, nor redeem more than their shares back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// VaultState
// ---------------------------------------------------------------------------

/// The pool ledger: aggregate totals plus per-address share holdings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VaultState {
    /// Settlement-asset value the pool lays claim to, in micro-units. Grows
    /// with deposits and the vault's interest share; shrinks with withdrawals.
    pub total_deposits: u64,

    /// Shares outstanding across all depositors.
    pub total_shares: u64,

    /// Lifetime interest collected across all repaid installments, before
    /// the treasury split. Reporting only.
    pub total_interest_collected: u64,

    /// Shares held per depositor address.
    shares: HashMap<String, u64>,
}

impl VaultState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares minted for a deposit of `amount` at the current share price.
    /// The first deposit bootstraps the pool at one share per micro-unit.
    pub fn shares_for_deposit(&self, amount: u64) -> u64 {
        if self.total_shares == 0 {
            amount
        } else {
            // u128 intermediates: amount * total_shares can exceed u64.
            (amount as u128 * self.total_shares as u128 / self.total_deposits as u128) as u64
        }
    }

    /// Settlement-asset value of `shares` at the current share price.
    pub fn payout_for_shares(&self, shares: u64) -> u64 {
        if self.total_shares == 0 {
            0
        } else {
            (shares as u128 * self.total_deposits as u128 / self.total_shares as u128) as u64
        }
    }

    /// Shares held by `account`. Unknown accounts hold zero.
    pub fn shares_of(&self, account: &str) -> u64 {
        self.shares.get(account).copied().unwrap_or(0)
    }

    /// Records a settled deposit: mints `shares` to `account` and grows the
    /// pool by `amount`.
    pub fn credit_deposit(&mut self, account: &str, amount: u64, shares: u64) {
        *self.shares.entry(account.to_string()).or_insert(0) += shares;
        self.total_shares += shares;
        self.total_deposits += amount;
    }

    /// Records a settled withdrawal: burns `shares` from `account` and
    /// shrinks the pool by `payout`. Caller has already validated holdings.
    pub fn debit_withdrawal(&mut self, account: &str, payout: u64, shares: u64) {
        if let Some(held) = self.shares.get_mut(account) {
            *held -= shares;
        }
        self.total_shares -= shares;
        self.total_deposits -= payout;
    }

    /// Folds the vault's cut of repaid interest into the pool, raising the
    /// share price for every holder.
    pub fn add_interest(&mut self, vault_cut: u64, total_interest: u64) {
        self.total_deposits += vault_cut;
        self.total_interest_collected += total_interest;
    }
}

// ---------------------------------------------------------------------------
// VaultStats
// ---------------------------------------------------------------------------

/// Aggregate pool figures served by the stats read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStats {
    /// Pool value in micro-units.
    pub total_deposits: u64,
    /// Shares outstanding.
    pub total_shares: u64,
    /// Lifetime interest collected, before the treasury split.
    pub total_interest_collected: u64,
    /// Active principal as an integer percentage of `total_deposits`.
    /// Zero when the pool is empty.
    pub utilization: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_deposit_mints_one_share_per_unit() {
        let state = VaultState::new();
        assert_eq!(state.shares_for_deposit(3_000_000_000), 3_000_000_000);
        assert_eq!(state.payout_for_shares(1), 0, "empty pool pays nothing");
    }

    #[test]
    fn deposits_and_withdrawals_balance_the_ledger() {
        let mut state = VaultState::new();
        state.credit_deposit("lp-1", 1_000, 1_000);
        state.credit_deposit("lp-2", 500, 500);

        assert_eq!(state.total_deposits, 1_500);
        assert_eq!(state.total_shares, 1_500);
        assert_eq!(state.shares_of("lp-2"), 500);

        state.debit_withdrawal("lp-2", 500, 500);
        assert_eq!(state.total_deposits, 1_000);
        assert_eq!(state.shares_of("lp-2"), 0);
    }

    #[test]
    fn interest_raises_the_share_price() {
        let mut state = VaultState::new();
        state.credit_deposit("lp-1", 3_000_000_000, 3_000_000_000);

        // Vault keeps 64 of an 80 interest haul (in millions of micro-units).
        state.add_interest(64_000_000, 80_000_000);

        assert_eq!(state.total_deposits, 3_064_000_000);
        assert_eq!(state.total_shares, 3_000_000_000);
        assert_eq!(state.total_interest_collected, 80_000_000);
        assert_eq!(state.payout_for_shares(3_000_000_000), 3_064_000_000);
    }

    #[test]
    fn later_depositor_mints_fewer_shares_at_higher_price() {
        let mut state = VaultState::new();
        state.credit_deposit("lp-1", 1_000, 1_000);
        state.add_interest(100, 125);

        // Pool is now 1100 against 1000 shares, so 1100 buys 1000 shares.
        assert_eq!(state.shares_for_deposit(1_100), 1_000);
        // Flooring favors the pool.
        assert_eq!(state.shares_for_deposit(1_099), 999);
    }

    #[test]
    fn conversions_survive_u64_scale_amounts() {
        let mut state = VaultState::new();
        let big = u64::MAX / 4;
        state.credit_deposit("lp-1", big, big);

        assert_eq!(state.shares_for_deposit(big), big);
        assert_eq!(state.payout_for_shares(big), big);
    }
}
