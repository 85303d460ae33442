//! # Error Taxonomy
//!
//! One error type for the whole protocol surface. Integrators key off the
//! stable numeric codes returned by [`ProtocolError::code`], so codes are
//! append-only: a shipped code never changes meaning.
//!
//! Every variant is a recoverable result returned to the caller before or
//! during validation — there is no fatal path in the ledger logic, and
//! nothing is retried internally.

use thiserror::Error;

use crate::token::TransferError;

/// Every failure the protocol can surface to a caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The caller does not match the configured trusted address for this
    /// operation (admin, oracle, or vault — whichever the entry point gates on).
    #[error("caller {caller} is not authorized for this operation")]
    Unauthorized {
        /// The rejected caller identity.
        caller: String,
    },

    /// A profile already exists for this address. Only reachable through a
    /// direct registry mint — the oracle gateway's submit path updates in
    /// place instead.
    #[error("a credit profile already exists for {owner}")]
    ProfileAlreadyExists {
        /// The address that already holds a profile.
        owner: String,
    },

    /// Submitted score exceeds the protocol maximum.
    #[error("credit score {score} is out of range (0..=1000)")]
    ScoreOutOfRange {
        /// The rejected score.
        score: u32,
    },

    /// The address has no credit profile in the registry.
    #[error("no credit profile exists for {address}")]
    NoProfile {
        /// The profile-less address.
        address: String,
    },

    /// The profile's score sits below the lowest eligibility floor.
    #[error("score {score} is below the eligibility floor")]
    NotEligible {
        /// The borrower's current score.
        score: u32,
    },

    /// The borrower already has a loan in `Active` status. One open loan per
    /// borrower, no exceptions.
    #[error("{borrower} already has an outstanding loan")]
    LoanAlreadyOutstanding {
        /// The borrower with the open loan.
        borrower: String,
    },

    /// There is no `Active` loan to repay or default.
    #[error("no active loan exists for {borrower}")]
    NoActiveLoan {
        /// The borrower without an active loan.
        borrower: String,
    },

    /// The vault's unlent deposits cannot cover the requested principal.
    #[error("insufficient vault liquidity: available {available}, requested {requested}")]
    InsufficientLiquidity {
        /// Deposits not currently lent out.
        available: u64,
        /// The principal the loan required.
        requested: u64,
    },

    /// Only the vault administrator may mark a loan as defaulted.
    #[error("caller {caller} may not mark loans as defaulted")]
    UnauthorizedDefault {
        /// The rejected caller identity.
        caller: String,
    },

    /// Zero-amount deposits are rejected.
    #[error("deposit amount must be non-zero")]
    ZeroDeposit,

    /// The withdrawal asks for more shares than the caller holds.
    #[error("withdrawal of {requested} shares exceeds held balance of {held}")]
    InsufficientShares {
        /// Shares the caller holds.
        held: u64,
        /// Shares the caller tried to redeem.
        requested: u64,
    },

    /// Credit profiles are permanently non-transferable. This fails for
    /// every caller, including the profile's own owner.
    #[error("credit profiles are soulbound and cannot be transferred")]
    SoulboundTransfer,

    /// The settlement-asset port refused a transfer. The enclosing operation
    /// commits nothing when this happens.
    #[error("asset transfer failed: {0}")]
    AssetTransfer(#[from] TransferError),
}

impl ProtocolError {
    /// The stable numeric identifier integrators match on.
    pub fn code(&self) -> u32 {
        match self {
            ProtocolError::Unauthorized { .. } => 100,
            ProtocolError::ProfileAlreadyExists { .. } => 102,
            ProtocolError::ScoreOutOfRange { .. } => 200,
            ProtocolError::NoProfile { .. } => 300,
            ProtocolError::NotEligible { .. } => 301,
            ProtocolError::LoanAlreadyOutstanding { .. } => 302,
            ProtocolError::NoActiveLoan { .. } => 303,
            ProtocolError::InsufficientLiquidity { .. } => 305,
            ProtocolError::UnauthorizedDefault { .. } => 306,
            ProtocolError::ZeroDeposit => 307,
            ProtocolError::InsufficientShares { .. } => 308,
            ProtocolError::SoulboundTransfer => 403,
            ProtocolError::AssetTransfer(_) => 500,
        }
    }
}

/// Shorthand used across the protocol crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
