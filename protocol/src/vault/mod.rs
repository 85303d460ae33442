//! # Lending Vault
//!
//! The money half of the protocol: a shared deposit pool that funds
//! score-gated loans. Depositors earn yield through a rising share price;
//! borrowers draw their tier's maximum at its flat rate and repay in four
//! installments. Collected interest splits 80/20 between the pool and the
//! protocol treasury.
//!
//! ## Atomicity
//!
//! Every entry point validates fully — including a registry authorization
//! preflight where a registry write will follow — before touching the port
//! or the ledger. Port transfers run before ledger writes, so a failed
//! transfer leaves no partial state behind.

mod loan;
mod state;

pub use loan::{Loan, LoanStatus};
pub use state::{VaultState, VaultStats};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config;
use crate::error::{ProtocolError, Result};
use crate::oracle::Tier;
use crate::registry::{CreditIdentityRegistry, LoanOutcome};
use crate::token::FungibleAssetPort;

// ---------------------------------------------------------------------------
// Configuration & Views
// ---------------------------------------------------------------------------

/// Fixed identity of a vault instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Administrator allowed to mark defaults.
    pub admin: String,

    /// The account the vault holds pool funds under, and the identity it
    /// presents to the registry. Must match the registry's configured vault.
    pub contract_address: String,

    /// Destination of the treasury's interest cut.
    pub treasury: String,
}

/// Terms returned to a borrower at origination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Disbursed principal, in micro-units.
    pub loan_amount: u64,
    /// Principal plus flat interest.
    pub total_owed: u64,
    /// Size of each non-final installment.
    pub installment_size: u64,
}

/// Result of a settled installment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    /// Loan status after the payment.
    pub status: LoanStatus,
    /// Installments still owed.
    pub installments_remaining: u32,
}

// ---------------------------------------------------------------------------
// LendingVault
// ---------------------------------------------------------------------------

/// The deposit pool and loan book.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LendingVault {
    config: VaultConfig,
    state: VaultState,

    /// Most recent loan per borrower. A borrower's slot is overwritten on
    /// re-origination, which the one-active-loan rule only permits once the
    /// previous loan is terminal.
    loans: HashMap<String, Loan>,
}

impl LendingVault {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            config,
            state: VaultState::new(),
            loans: HashMap::new(),
        }
    }

    /// The account the vault holds pool funds under.
    pub fn contract_address(&self) -> &str {
        &self.config.contract_address
    }

    // -----------------------------------------------------------------------
    // Deposits & Withdrawals
    // -----------------------------------------------------------------------

    /// Deposits `amount` into the pool, minting shares at the current price.
    /// Returns the shares minted.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::ZeroDeposit`] for a zero amount.
    /// - [`ProtocolError::AssetTransfer`] if the depositor cannot pay; the
    ///   pool ledger is untouched in that case.
    pub fn deposit(
        &mut self,
        port: &mut dyn FungibleAssetPort,
        caller: &str,
        amount: u64,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(ProtocolError::ZeroDeposit);
        }

        // Price the shares before the pool grows.
        let shares = self.state.shares_for_deposit(amount);
        port.transfer_from(caller, &self.config.contract_address, amount)?;
        self.state.credit_deposit(caller, amount, shares);

        tracing::info!(depositor = caller, amount, shares, "deposit settled");
        Ok(shares)
    }

    /// Redeems `shares` at the current price. Returns the payout.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InsufficientShares`] if the caller holds fewer.
    /// - [`ProtocolError::AssetTransfer`] if the pool's liquid balance cannot
    ///   cover the payout (funds lent out); nothing changes in that case.
    pub fn withdraw(
        &mut self,
        port: &mut dyn FungibleAssetPort,
        caller: &str,
        shares: u64,
    ) -> Result<u64> {
        let held = self.state.shares_of(caller);
        if shares == 0 || shares > held {
            return Err(ProtocolError::InsufficientShares {
                held,
                requested: shares,
            });
        }

        let payout = self.state.payout_for_shares(shares);
        port.transfer_from(&self.config.contract_address, caller, payout)?;
        self.state.debit_withdrawal(caller, payout, shares);

        tracing::info!(depositor = caller, shares, payout, "withdrawal settled");
        Ok(payout)
    }

    // -----------------------------------------------------------------------
    // Loan Lifecycle
    // -----------------------------------------------------------------------

    /// Originates a loan for `caller` at their tier's maximum principal and
    /// flat rate, disbursing from the pool.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NoProfile`] without a registry profile.
    /// - [`ProtocolError::NotEligible`] below the lowest tier floor.
    /// - [`ProtocolError::LoanAlreadyOutstanding`] while a loan is active.
    /// - [`ProtocolError::InsufficientLiquidity`] if unlent deposits cannot
    ///   cover the tier maximum.
    /// - [`ProtocolError::Unauthorized`] if the registry does not trust this
    ///   vault — checked before disbursement so the later debt write cannot
    ///   fail with funds already moved.
    pub fn apply_for_loan(
        &mut self,
        port: &mut dyn FungibleAssetPort,
        registry: &mut CreditIdentityRegistry,
        caller: &str,
        current_block: u64,
    ) -> Result<LoanTerms> {
        let profile = registry
            .get_profile(caller)
            .ok_or_else(|| ProtocolError::NoProfile {
                address: caller.to_string(),
            })?;
        let score = profile.credit_score;

        let tier = Tier::for_score(score);
        let rate_pct = tier
            .interest_rate_pct()
            .ok_or(ProtocolError::NotEligible { score })?;
        let principal = tier.max_loan_amount();

        if self.loans.get(caller).is_some_and(Loan::is_active) {
            return Err(ProtocolError::LoanAlreadyOutstanding {
                borrower: caller.to_string(),
            });
        }

        let available = self.state.total_deposits - self.active_principal();
        if principal > available {
            return Err(ProtocolError::InsufficientLiquidity {
                available,
                requested: principal,
            });
        }

        // Authorization preflight: the origination write below must not be
        // the first thing to discover a misconfigured registry.
        if !registry.is_authorized_vault(&self.config.contract_address) {
            return Err(ProtocolError::Unauthorized {
                caller: self.config.contract_address.clone(),
            });
        }

        port.transfer_from(&self.config.contract_address, caller, principal)?;

        let loan = Loan::originate(caller, principal, rate_pct, current_block);
        let terms = LoanTerms {
            loan_amount: loan.principal,
            total_owed: loan.total_owed,
            installment_size: loan.installment_size,
        };
        registry.record_origination(&self.config.contract_address, caller, loan.total_owed)?;
        self.loans.insert(caller.to_string(), loan);

        tracing::info!(
            borrower = caller,
            tier = %tier,
            principal,
            total_owed = terms.total_owed,
            "loan originated"
        );
        Ok(terms)
    }

    /// Settles the caller's next installment.
    ///
    /// The final installment closes the loan: interest splits 80/20 between
    /// the pool (raising the share price) and the treasury, and the registry
    /// records a clean closure.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NoActiveLoan`] without an active loan.
    /// - [`ProtocolError::Unauthorized`] if the registry does not trust this vault.
    /// - [`ProtocolError::AssetTransfer`] if the borrower cannot pay; nothing
    ///   changes in that case.
    pub fn repay_installment(
        &mut self,
        port: &mut dyn FungibleAssetPort,
        registry: &mut CreditIdentityRegistry,
        caller: &str,
    ) -> Result<RepaymentReceipt> {
        let loan = match self.loans.get(caller) {
            Some(loan) if loan.is_active() => loan,
            _ => {
                return Err(ProtocolError::NoActiveLoan {
                    borrower: caller.to_string(),
                })
            }
        };
        let amount = loan.next_installment();
        let closes_loan = loan.installments_remaining() <= 1;
        let interest = loan.interest();

        if !registry.is_authorized_vault(&self.config.contract_address) {
            return Err(ProtocolError::Unauthorized {
                caller: self.config.contract_address.clone(),
            });
        }

        port.transfer_from(caller, &self.config.contract_address, amount)?;

        if closes_loan {
            let vault_cut = interest * config::VAULT_INTEREST_SHARE_PCT / 100;
            let treasury_cut = interest - vault_cut;

            if treasury_cut > 0 {
                if let Err(err) = port.transfer_from(
                    &self.config.contract_address,
                    &self.config.treasury,
                    treasury_cut,
                ) {
                    // Undo the installment pull so the failed operation
                    // leaves no trace.
                    port.transfer_from(&self.config.contract_address, caller, amount)?;
                    return Err(err.into());
                }
            }
            self.state.add_interest(vault_cut, interest);
        }

        let loan = self
            .loans
            .get_mut(caller)
            .ok_or_else(|| ProtocolError::NoActiveLoan {
                borrower: caller.to_string(),
            })?;
        loan.record_payment(amount);
        let receipt = RepaymentReceipt {
            status: loan.status,
            installments_remaining: loan.installments_remaining(),
        };

        if closes_loan {
            registry.record_closure(&self.config.contract_address, caller, LoanOutcome::Repaid)?;
        } else {
            let outstanding = loan.outstanding();
            registry.update_debt(&self.config.contract_address, caller, outstanding)?;
        }

        tracing::info!(
            borrower = caller,
            amount,
            status = %receipt.status,
            "installment settled"
        );
        Ok(receipt)
    }

    /// Writes off `borrower`'s active loan. Admin-only.
    ///
    /// The pool absorbs the loss implicitly: the principal already left at
    /// disbursement and no ledger figure is reduced here, so the shortfall
    /// surfaces as illiquidity rather than an immediate share-price cut.
    pub fn mark_default(
        &mut self,
        registry: &mut CreditIdentityRegistry,
        caller: &str,
        borrower: &str,
    ) -> Result<()> {
        if caller != self.config.admin {
            return Err(ProtocolError::UnauthorizedDefault {
                caller: caller.to_string(),
            });
        }
        if !self.loans.get(borrower).is_some_and(Loan::is_active) {
            return Err(ProtocolError::NoActiveLoan {
                borrower: borrower.to_string(),
            });
        }
        if !registry.is_authorized_vault(&self.config.contract_address) {
            return Err(ProtocolError::Unauthorized {
                caller: self.config.contract_address.clone(),
            });
        }

        registry.record_closure(&self.config.contract_address, borrower, LoanOutcome::Defaulted)?;
        if let Some(loan) = self.loans.get_mut(borrower) {
            loan.mark_defaulted();
        }

        tracing::warn!(borrower, "loan marked defaulted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The borrower's most recent loan, active or terminal.
    pub fn get_loan(&self, borrower: &str) -> Option<&Loan> {
        self.loans.get(borrower)
    }

    /// Shares held by `account`.
    pub fn user_shares(&self, account: &str) -> u64 {
        self.state.shares_of(account)
    }

    /// Principal currently out on active loans.
    pub fn active_principal(&self) -> u64 {
        self.loans
            .values()
            .filter(|l| l.is_active())
            .map(|l| l.principal)
            .sum()
    }

    /// Aggregate pool figures.
    pub fn stats(&self) -> VaultStats {
        let utilization = if self.state.total_deposits == 0 {
            0
        } else {
            self.active_principal() * 100 / self.state.total_deposits
        };
        VaultStats {
            total_deposits: self.state.total_deposits,
            total_shares: self.state.total_shares,
            total_interest_collected: self.state.total_interest_collected,
            utilization,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
