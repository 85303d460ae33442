// Copyright (c) 2026 Strata Labs. MIT License.
// See LICENSE for details.

//! # Strata Protocol — Core Library
//!
//! Strata is a permissioned, score-gated lending protocol: under-collateralized
//! installment loans priced off externally computed credit scores, funded by a
//! pooled, share-based liquidity vault.
//!
//! The protocol is three components in a mutual-authorization triangle:
//!
//! - **registry** — [`registry::CreditIdentityRegistry`], the sole owner of
//!   soulbound credit profiles. Writable only by the configured oracle gateway
//!   and vault.
//! - **oracle** — [`oracle::CreditOracleGateway`], the single trusted bridge
//!   between the off-chain scoring service and the registry. Enforces score
//!   bounds and derives eligibility tiers.
//! - **vault** — [`vault::LendingVault`], the pooled fund. Mints and burns
//!   proportional shares for depositors, originates four-installment loans
//!   against tier limits, and reports loan outcomes back into the registry.
//!
//! The settlement asset itself is not implemented here. The vault moves funds
//! exclusively through the [`token::FungibleAssetPort`] trait; an in-memory
//! implementation ships for tests and devnet.
//!
//! ## Execution Model
//!
//! Every public operation is a single, serialized, all-or-nothing state
//! transition. Authorization is checked before the first write, and the asset
//! transfer is ordered so that a failed transfer leaves no partial ledger
//! state behind. Nothing in this crate panics on a caller mistake — every
//! failure is a typed [`error::ProtocolError`] with a stable numeric code.
//!
//! ## Design Philosophy
//!
//! 1. All amounts are `u64` micro-units of the settlement asset. No floats.
//! 2. No value is created or destroyed: shares, deposits, and debt always
//!    reconcile. If it touches money, it has tests. Plural.
//! 3. Trust is by address equality at call time — explicit configuration,
//!    not inheritance or a plugin host.

pub mod config;
pub mod error;
pub mod oracle;
pub mod registry;
pub mod token;
pub mod vault;
