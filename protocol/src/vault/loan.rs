//! Individual loan records and the installment schedule.
//!
//! Terms are fixed at origination: flat interest on principal, four equal
//! installments, one period of blocks between due heights. Integer division
//! leaves any remainder on the final installment, so a loan always settles
//! to exactly `total_owed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a loan. Transitions are one-way: `Active` is the only live
/// state, and both terminal states free the borrower to originate again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Installments are still owed.
    Active,
    /// All installments settled.
    Repaid,
    /// Written off by the administrator.
    Defaulted,
}

impl LoanStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Repaid | LoanStatus::Defaulted)
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoanStatus::Active => "active",
            LoanStatus::Repaid => "repaid",
            LoanStatus::Defaulted => "defaulted",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

/// A single originated loan with its frozen terms and running repayment
/// state. All amounts are micro-units of the settlement asset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Loan {
    /// Stable identifier, assigned at origination.
    pub id: Uuid,

    /// The borrowing address. One active loan per borrower.
    pub borrower: String,

    /// Disbursed principal.
    pub principal: u64,

    /// Principal plus flat interest; what the borrower must pay in total.
    pub total_owed: u64,

    /// Sum of installments paid so far.
    pub amount_repaid: u64,

    /// Number of installments the schedule was split into.
    pub installments_total: u32,

    /// Installments settled so far.
    pub installments_paid: u32,

    /// Size of each non-final installment (`total_owed / installments_total`,
    /// floored). The final installment also absorbs the division remainder.
    pub installment_size: u64,

    /// Block height at which the next installment falls due.
    pub due_block: u64,

    /// Current lifecycle state.
    pub status: LoanStatus,

    /// Wall-clock origination time.
    pub originated_at: DateTime<Utc>,
}

impl Loan {
    /// Freezes terms for a new loan: flat `rate_pct` interest on `principal`,
    /// first installment due one period after `current_block`.
    pub fn originate(borrower: &str, principal: u64, rate_pct: u64, current_block: u64) -> Self {
        let interest = principal * rate_pct / 100;
        let total_owed = principal + interest;
        Self {
            id: Uuid::new_v4(),
            borrower: borrower.to_string(),
            principal,
            total_owed,
            amount_repaid: 0,
            installments_total: config::INSTALLMENTS_TOTAL,
            installments_paid: 0,
            installment_size: total_owed / config::INSTALLMENTS_TOTAL as u64,
            due_block: current_block + config::INSTALLMENT_PERIOD_BLOCKS,
            status: LoanStatus::Active,
            originated_at: Utc::now(),
        }
    }

    /// `true` while installments are still owed.
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Unpaid remainder of `total_owed`.
    pub fn outstanding(&self) -> u64 {
        self.total_owed - self.amount_repaid
    }

    /// Installments not yet settled.
    pub fn installments_remaining(&self) -> u32 {
        self.installments_total - self.installments_paid
    }

    /// The amount due on the next installment. The final one pays the whole
    /// remaining balance, absorbing any flooring remainder.
    pub fn next_installment(&self) -> u64 {
        if self.installments_remaining() <= 1 {
            self.outstanding()
        } else {
            self.installment_size
        }
    }

    /// Interest portion of the loan, fixed at origination.
    pub fn interest(&self) -> u64 {
        self.total_owed - self.principal
    }

    /// Applies one settled installment of `amount`: advances the schedule and
    /// flips to `Repaid` when the balance hits zero.
    pub fn record_payment(&mut self, amount: u64) {
        self.amount_repaid += amount;
        self.installments_paid += 1;
        if self.amount_repaid >= self.total_owed {
            self.status = LoanStatus::Repaid;
        } else {
            self.due_block += config::INSTALLMENT_PERIOD_BLOCKS;
        }
    }

    /// Administrator write-off.
    pub fn mark_defaulted(&mut self) {
        self.status = LoanStatus::Defaulted;
    }
}
