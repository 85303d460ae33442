//! # Settlement Asset Port
//!
//! The vault never touches token internals. Everything it does with money —
//! pulling deposits, disbursing loans, collecting installments, routing the
//! treasury's interest cut — goes through [`FungibleAssetPort`]. On a live
//! deployment the port is backed by the real stable-value token contract;
//! here we ship [`InMemoryToken`], a plain balance map with a devnet faucet,
//! which is what the test suites and `strata-node` run against.
//!
//! Port semantics the vault relies on:
//!
//! - `transfer_from` is atomic: it either moves the full amount or moves
//!   nothing and returns [`TransferError`].
//! - Balances are `u64` micro-units. No negative balances can exist.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a settlement-asset transfer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The payer does not hold enough of the asset.
    #[error("insufficient balance: {account} holds {held}, needs {needed}")]
    InsufficientBalance {
        /// The paying account.
        account: String,
        /// What the account currently holds.
        held: u64,
        /// What the transfer required.
        needed: u64,
    },

    /// Zero-amount transfers are rejected — a zero move is always a caller bug.
    #[error("zero-amount transfers are not permitted")]
    ZeroAmount,
}

// ---------------------------------------------------------------------------
// Port Trait
// ---------------------------------------------------------------------------

/// The vault's only interface to the settlement asset.
///
/// Implementations must guarantee all-or-nothing transfers: a returned error
/// means no balance changed.
pub trait FungibleAssetPort {
    /// Moves `amount` micro-units from `from` to `to`.
    fn transfer_from(&mut self, from: &str, to: &str, amount: u64) -> Result<(), TransferError>;

    /// Returns the balance of `account`. Unknown accounts hold zero.
    fn balance_of(&self, account: &str) -> u64;
}

// ---------------------------------------------------------------------------
// InMemoryToken
// ---------------------------------------------------------------------------

/// A HashMap-backed settlement asset for tests and devnet.
///
/// Mirrors the behavior the protocol expects from the real token: atomic
/// transfers, zero-amount rejection, and a faucet that mints a fixed grant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryToken {
    balances: HashMap<String, u64>,
}

impl InMemoryToken {
    /// Creates an empty token ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `amount` micro-units to `account`. Devnet/test only — the real
    /// asset's supply is managed by its issuer.
    pub fn mint(&mut self, account: &str, amount: u64) {
        *self.balances.entry(account.to_string()).or_insert(0) += amount;
    }

    /// Mints the fixed faucet grant to `account` and returns the new balance.
    pub fn faucet(&mut self, account: &str) -> u64 {
        self.mint(account, crate::config::FAUCET_AMOUNT);
        self.balance_of(account)
    }

    /// Sum of all balances. Tests use this to assert no value is created or
    /// destroyed by protocol operations.
    pub fn total_supply(&self) -> u64 {
        self.balances.values().sum()
    }
}

impl FungibleAssetPort for InMemoryToken {
    fn transfer_from(&mut self, from: &str, to: &str, amount: u64) -> Result<(), TransferError> {
        if amount == 0 {
            return Err(TransferError::ZeroAmount);
        }

        let held = self.balance_of(from);
        if held < amount {
            return Err(TransferError::InsufficientBalance {
                account: from.to_string(),
                held,
                needed: amount,
            });
        }

        // Both sides mutated under one &mut self — no partial state possible.
        *self.balances.entry(from.to_string()).or_insert(0) -= amount;
        *self.balances.entry(to.to_string()).or_insert(0) += amount;
        Ok(())
    }

    fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
