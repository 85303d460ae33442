//! # Credit Identity Registry
//!
//! The sole source of truth for credit profiles. One profile per address,
//! minted as a soulbound token: the ownership record exposes a `transfer`
//! entry point only so that it can refuse — unconditionally, for every
//! caller, forever.
//!
//! ## Write Authorization
//!
//! The registry trusts exactly two counterparties, both configured by the
//! administrator and validated by address equality on every privileged call:
//!
//! - the **oracle gateway** may mint profiles and overwrite scores;
//! - the **vault** may mutate debt and loan-history fields.
//!
//! An unconfigured counterpart is not a silent no-op: any gated call made
//! before configuration fails `Unauthorized`, because no caller can equal an
//! address that was never set.
//!
//! ## Repayment Rate
//!
//! `repayment_rate` is recomputed whenever the vault reports a loan closing.
//! A repaid closure sets it to the ratio of cleanly closed loans to all
//! loans; a default zeroes it outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::PROFILE_TOKEN_URI_BASE;
use crate::error::{ProtocolError, Result};

// ---------------------------------------------------------------------------
// CreditProfile
// ---------------------------------------------------------------------------

/// A per-address, non-transferable credit identity record.
///
/// `owner` is immutable once minted. Score fields are written by the oracle
/// gateway; debt and loan-history fields by the vault. All amounts are
/// micro-units of the settlement asset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditProfile {
    /// The address this profile belongs to. Never changes.
    pub owner: String,

    /// Sequential token id assigned at mint, independent of address.
    pub token_id: u64,

    /// Externally computed credit score, `0..=1000`.
    pub credit_score: u32,

    /// Loans ever originated for this address.
    pub total_loans: u32,

    /// Loans that ended in default.
    pub total_defaulted: u32,

    /// Repayment history as a percentage, `0..=100`. Recomputed on each
    /// loan closure.
    pub repayment_rate: u32,

    /// Outstanding debt of the single open loan (`total_owed - amount_repaid`),
    /// or zero when no loan is open.
    pub outstanding_debt: u64,

    /// Bitmask of the off-chain signal categories that backed the score.
    pub verified_source_bitmask: u32,

    /// When the profile was minted.
    pub created_at: DateTime<Utc>,

    /// When any field was last written.
    pub updated_at: DateTime<Utc>,
}

impl CreditProfile {
    fn new(owner: &str, token_id: u64) -> Self {
        let now = Utc::now();
        Self {
            owner: owner.to_string(),
            token_id,
            credit_score: 0,
            total_loans: 0,
            total_defaulted: 0,
            repayment_rate: 0,
            outstanding_debt: 0,
            verified_source_bitmask: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// LoanOutcome
// ---------------------------------------------------------------------------

/// How the vault reports a loan leaving `Active` status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanOutcome {
    /// All four installments were paid.
    Repaid,
    /// The administrator wrote the loan off.
    Defaulted,
}

// ---------------------------------------------------------------------------
// CreditIdentityRegistry
// ---------------------------------------------------------------------------

/// Owns every [`CreditProfile`] and gatekeeps all writes to the two
/// configured trusted callers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditIdentityRegistry {
    /// Administrator allowed to configure the trusted counterparties.
    admin: String,

    /// Address of the oracle gateway, once configured.
    oracle_contract: Option<String>,

    /// Address of the lending vault, once configured.
    vault_contract: Option<String>,

    /// All profiles, keyed by owner address. Entries are never deleted.
    profiles: HashMap<String, CreditProfile>,

    /// Token id to owner, for the indexer-facing identity reads.
    owners: HashMap<u64, String>,

    /// Highest token id minted so far. Ids start at 1.
    last_token_id: u64,
}

impl CreditIdentityRegistry {
    /// Creates a registry with no trusted counterparties configured.
    pub fn new(admin: &str) -> Self {
        Self {
            admin: admin.to_string(),
            oracle_contract: None,
            vault_contract: None,
            profiles: HashMap::new(),
            owners: HashMap::new(),
            last_token_id: 0,
        }
    }

    /// The configured administrator address.
    pub fn admin(&self) -> &str {
        &self.admin
    }

    // -----------------------------------------------------------------------
    // Administrator Configuration
    // -----------------------------------------------------------------------

    /// Configures the oracle gateway address. Admin-only. Trust is by
    /// address equality at call time — the target is not validated further.
    pub fn set_oracle_contract(&mut self, caller: &str, addr: &str) -> Result<()> {
        self.ensure_admin(caller)?;
        self.oracle_contract = Some(addr.to_string());
        tracing::info!(oracle = addr, "oracle contract configured");
        Ok(())
    }

    /// Configures the vault address. Admin-only.
    pub fn set_vault_contract(&mut self, caller: &str, addr: &str) -> Result<()> {
        self.ensure_admin(caller)?;
        self.vault_contract = Some(addr.to_string());
        tracing::info!(vault = addr, "vault contract configured");
        Ok(())
    }

    /// Returns `true` if `caller` is the configured vault. The vault uses
    /// this as an authorization preflight before it moves any funds, so a
    /// later debt write inside the same operation cannot fail.
    pub fn is_authorized_vault(&self, caller: &str) -> bool {
        self.vault_contract.as_deref() == Some(caller)
    }

    // -----------------------------------------------------------------------
    // Oracle-Gated Writes
    // -----------------------------------------------------------------------

    /// Mints a fresh profile for `owner`. Oracle-only.
    ///
    /// Returns the assigned token id.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Unauthorized`] if `caller` is not the configured oracle.
    /// - [`ProtocolError::ProfileAlreadyExists`] if `owner` already has one.
    pub fn mint_profile(&mut self, caller: &str, owner: &str) -> Result<u64> {
        self.ensure_oracle(caller)?;

        if self.profiles.contains_key(owner) {
            return Err(ProtocolError::ProfileAlreadyExists {
                owner: owner.to_string(),
            });
        }

        self.last_token_id += 1;
        let token_id = self.last_token_id;
        self.profiles
            .insert(owner.to_string(), CreditProfile::new(owner, token_id));
        self.owners.insert(token_id, owner.to_string());

        tracing::info!(owner, token_id, "credit profile minted");
        Ok(token_id)
    }

    /// Overwrites the score and source bitmask of an existing profile.
    /// Oracle-only. Debt and loan counters are untouched.
    pub fn update_profile(
        &mut self,
        caller: &str,
        owner: &str,
        score: u32,
        source_bitmask: u32,
    ) -> Result<()> {
        self.ensure_oracle(caller)?;
        let profile = self.profile_mut(owner)?;
        profile.credit_score = score;
        profile.verified_source_bitmask = source_bitmask;
        profile.updated_at = Utc::now();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Vault-Gated Writes
    // -----------------------------------------------------------------------

    /// Records a loan origination: bumps the loan counter and sets the
    /// outstanding debt to the loan's full owed amount. Vault-only.
    pub fn record_origination(
        &mut self,
        caller: &str,
        owner: &str,
        total_owed: u64,
    ) -> Result<()> {
        self.ensure_vault(caller)?;
        let profile = self.profile_mut(owner)?;
        profile.total_loans += 1;
        profile.outstanding_debt = total_owed;
        profile.updated_at = Utc::now();
        Ok(())
    }

    /// Overwrites the outstanding debt figure. Vault-only. Called after each
    /// partial installment.
    pub fn update_debt(&mut self, caller: &str, owner: &str, new_outstanding: u64) -> Result<()> {
        self.ensure_vault(caller)?;
        let profile = self.profile_mut(owner)?;
        profile.outstanding_debt = new_outstanding;
        profile.updated_at = Utc::now();
        Ok(())
    }

    /// Records a loan closing. Vault-only.
    ///
    /// Repaid: debt clears and `repayment_rate` becomes the share of cleanly
    /// closed loans across the borrower's full history. Defaulted: the
    /// default counter bumps, debt is written off, and the rate drops to 0.
    pub fn record_closure(&mut self, caller: &str, owner: &str, outcome: LoanOutcome) -> Result<()> {
        self.ensure_vault(caller)?;
        let profile = self.profile_mut(owner)?;

        profile.outstanding_debt = 0;
        match outcome {
            LoanOutcome::Repaid => {
                // At closure time every originated loan is closed, so the
                // clean share is derivable from the two counters alone. A
                // closure without an origination leaves the rate at 0.
                if profile.total_loans > 0 {
                    profile.repayment_rate = (profile.total_loans - profile.total_defaulted)
                        * 100
                        / profile.total_loans;
                }
            }
            LoanOutcome::Defaulted => {
                profile.total_defaulted += 1;
                profile.repayment_rate = 0;
            }
        }
        profile.updated_at = Utc::now();

        tracing::info!(owner, ?outcome, "loan closure recorded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads (no authorization)
    // -----------------------------------------------------------------------

    /// Returns `true` if a profile exists for `owner`.
    pub fn has_profile(&self, owner: &str) -> bool {
        self.profiles.contains_key(owner)
    }

    /// Returns the profile for `owner`, if any.
    pub fn get_profile(&self, owner: &str) -> Option<&CreditProfile> {
        self.profiles.get(owner)
    }

    /// Highest token id minted so far. Ids are monotonic and start at 1.
    pub fn last_token_id(&self) -> u64 {
        self.last_token_id
    }

    /// Owner of a profile token, for external indexers.
    pub fn owner_of(&self, token_id: u64) -> Option<&str> {
        self.owners.get(&token_id).map(String::as_str)
    }

    /// Metadata URI of a profile token, for external indexers.
    pub fn token_uri(&self, token_id: u64) -> Option<String> {
        self.owners
            .get(&token_id)
            .map(|_| format!("{PROFILE_TOKEN_URI_BASE}{token_id}.json"))
    }

    // -----------------------------------------------------------------------
    // Soulbound Transfer
    // -----------------------------------------------------------------------

    /// Always fails. Profiles are permanently bound to the address they were
    /// minted for; not even the owner can move one.
    pub fn transfer(
        &mut self,
        _caller: &str,
        _token_id: u64,
        _sender: &str,
        _recipient: &str,
    ) -> Result<()> {
        Err(ProtocolError::SoulboundTransfer)
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn ensure_admin(&self, caller: &str) -> Result<()> {
        if caller != self.admin {
            return Err(ProtocolError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_oracle(&self, caller: &str) -> Result<()> {
        if self.oracle_contract.as_deref() != Some(caller) {
            return Err(ProtocolError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_vault(&self, caller: &str) -> Result<()> {
        if self.vault_contract.as_deref() != Some(caller) {
            return Err(ProtocolError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn profile_mut(&mut self, owner: &str) -> Result<&mut CreditProfile> {
        self.profiles
            .get_mut(owner)
            .ok_or_else(|| ProtocolError::NoProfile {
                address: owner.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "deployer";
    const ORACLE: &str = "strata.credit-oracle";
    const VAULT: &str = "strata.loan-vault";
    const ALICE: &str = "wallet-1";
    const BOB: &str = "wallet-2";

    fn configured_registry() -> CreditIdentityRegistry {
        let mut reg = CreditIdentityRegistry::new(ADMIN);
        reg.set_oracle_contract(ADMIN, ORACLE).unwrap();
        reg.set_vault_contract(ADMIN, VAULT).unwrap();
        reg
    }

    #[test]
    fn only_admin_configures_counterparties() {
        let mut reg = CreditIdentityRegistry::new(ADMIN);

        let err = reg.set_oracle_contract(ALICE, ORACLE).unwrap_err();
        assert_eq!(err.code(), 100);
        let err = reg.set_vault_contract(ALICE, VAULT).unwrap_err();
        assert_eq!(err.code(), 100);

        reg.set_oracle_contract(ADMIN, ORACLE).unwrap();
        reg.set_vault_contract(ADMIN, VAULT).unwrap();
        assert!(reg.is_authorized_vault(VAULT));
    }

    #[test]
    fn unconfigured_registry_rejects_all_gated_writes() {
        let mut reg = CreditIdentityRegistry::new(ADMIN);

        // No oracle configured: no caller can equal the trusted address.
        let err = reg.mint_profile(ORACLE, ALICE).unwrap_err();
        assert_eq!(err.code(), 100);
        let err = reg.update_debt(VAULT, ALICE, 0).unwrap_err();
        assert_eq!(err.code(), 100);
        assert!(!reg.is_authorized_vault(VAULT));
    }

    #[test]
    fn mint_assigns_monotonic_token_ids() {
        let mut reg = configured_registry();

        assert_eq!(reg.mint_profile(ORACLE, ALICE).unwrap(), 1);
        assert_eq!(reg.mint_profile(ORACLE, BOB).unwrap(), 2);
        assert_eq!(reg.last_token_id(), 2);
        assert_eq!(reg.owner_of(1), Some(ALICE));
        assert_eq!(reg.owner_of(2), Some(BOB));
        assert_eq!(reg.owner_of(3), None);
    }

    #[test]
    fn duplicate_mint_rejected() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        let err = reg.mint_profile(ORACLE, ALICE).unwrap_err();
        assert!(matches!(err, ProtocolError::ProfileAlreadyExists { .. }));
        assert_eq!(reg.last_token_id(), 1, "failed mint must not burn an id");
    }

    #[test]
    fn non_oracle_cannot_mint_or_update() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        assert_eq!(reg.mint_profile(ALICE, BOB).unwrap_err().code(), 100);
        assert_eq!(
            reg.update_profile(VAULT, ALICE, 700, 1).unwrap_err().code(),
            100
        );
    }

    #[test]
    fn update_profile_overwrites_score_only() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();
        reg.record_origination(VAULT, ALICE, 525_000_000).unwrap();

        reg.update_profile(ORACLE, ALICE, 720, 0b101).unwrap();

        let p = reg.get_profile(ALICE).unwrap();
        assert_eq!(p.credit_score, 720);
        assert_eq!(p.verified_source_bitmask, 0b101);
        // Debt and counters untouched by a score refresh.
        assert_eq!(p.outstanding_debt, 525_000_000);
        assert_eq!(p.total_loans, 1);
    }

    #[test]
    fn non_vault_cannot_touch_debt() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        assert_eq!(
            reg.record_origination(ORACLE, ALICE, 1).unwrap_err().code(),
            100
        );
        assert_eq!(reg.update_debt(ALICE, ALICE, 0).unwrap_err().code(), 100);
        assert_eq!(
            reg.record_closure(ADMIN, ALICE, LoanOutcome::Repaid)
                .unwrap_err()
                .code(),
            100
        );
    }

    #[test]
    fn origination_and_installments_track_debt() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        reg.record_origination(VAULT, ALICE, 525_000_000).unwrap();
        let p = reg.get_profile(ALICE).unwrap();
        assert_eq!(p.total_loans, 1);
        assert_eq!(p.outstanding_debt, 525_000_000);

        reg.update_debt(VAULT, ALICE, 393_750_000).unwrap();
        assert_eq!(
            reg.get_profile(ALICE).unwrap().outstanding_debt,
            393_750_000
        );
    }

    #[test]
    fn repaid_closure_clears_debt_and_sets_full_rate() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();
        reg.record_origination(VAULT, ALICE, 525_000_000).unwrap();

        reg.record_closure(VAULT, ALICE, LoanOutcome::Repaid).unwrap();

        let p = reg.get_profile(ALICE).unwrap();
        assert_eq!(p.outstanding_debt, 0);
        assert_eq!(p.repayment_rate, 100);
        assert_eq!(p.total_defaulted, 0);
    }

    #[test]
    fn defaulted_closure_zeroes_rate_and_writes_off_debt() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();
        reg.record_origination(VAULT, ALICE, 105_000_000).unwrap();

        reg.record_closure(VAULT, ALICE, LoanOutcome::Defaulted)
            .unwrap();

        let p = reg.get_profile(ALICE).unwrap();
        assert_eq!(p.outstanding_debt, 0);
        assert_eq!(p.total_defaulted, 1);
        assert_eq!(p.repayment_rate, 0);
    }

    #[test]
    fn successive_clean_repayments_keep_rate_at_100() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        for _ in 0..3 {
            reg.record_origination(VAULT, ALICE, 105_000_000).unwrap();
            reg.record_closure(VAULT, ALICE, LoanOutcome::Repaid).unwrap();
        }

        let p = reg.get_profile(ALICE).unwrap();
        assert_eq!(p.total_loans, 3);
        assert_eq!(p.repayment_rate, 100);
    }

    #[test]
    fn repayment_rate_reflects_mixed_history() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        reg.record_origination(VAULT, ALICE, 105_000_000).unwrap();
        reg.record_closure(VAULT, ALICE, LoanOutcome::Defaulted)
            .unwrap();
        reg.record_origination(VAULT, ALICE, 105_000_000).unwrap();
        reg.record_closure(VAULT, ALICE, LoanOutcome::Repaid).unwrap();

        // One clean loan out of two.
        assert_eq!(reg.get_profile(ALICE).unwrap().repayment_rate, 50);
    }

    #[test]
    fn transfer_always_fails_soulbound() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        // Not for the owner, not for the admin, not for anyone.
        for caller in [ALICE, BOB, ADMIN, ORACLE, VAULT] {
            let err = reg.transfer(caller, 1, ALICE, BOB).unwrap_err();
            assert_eq!(err.code(), 403);
        }
        assert_eq!(reg.get_profile(ALICE).unwrap().owner, ALICE);
    }

    #[test]
    fn token_uri_only_for_minted_ids() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();

        let uri = reg.token_uri(1).unwrap();
        assert!(uri.ends_with("/profiles/1.json"));
        assert_eq!(reg.token_uri(99), None);
    }

    #[test]
    fn registry_serialization_roundtrip() {
        let mut reg = configured_registry();
        reg.mint_profile(ORACLE, ALICE).unwrap();
        reg.update_profile(ORACLE, ALICE, 650, 3).unwrap();

        let json = serde_json::to_string(&reg).expect("serialize");
        let recovered: CreditIdentityRegistry = serde_json::from_str(&json).expect("deserialize");

        assert!(recovered.has_profile(ALICE));
        assert_eq!(recovered.get_profile(ALICE).unwrap().credit_score, 650);
        assert_eq!(recovered.last_token_id(), 1);
    }
}
