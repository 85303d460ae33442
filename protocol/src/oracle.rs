//! # Credit Oracle Gateway
//!
//! The single trusted bridge between the off-chain scoring service and the
//! registry. Scores are computed elsewhere (from attested off-chain signals);
//! the gateway's job is narrow: verify the submitter is the configured oracle
//! signer, bound-check the score, and write it into the registry — minting a
//! profile on first submission, updating in place on every one after.
//!
//! Eligibility is a pure step function of the stored score:
//!
//! | score ≥ | tier     | max loan (micro-units) | flat rate |
//! |---------|----------|------------------------|-----------|
//! | 850     | premium  | 5,000,000,000          | 4%        |
//! | 700     | prime    | 2,000,000,000          | 4%        |
//! | 550     | standard |   500,000,000          | 5%        |
//! | 400     | micro    |   100,000,000          | 5%        |
//! | else    | none     |             0          | —         |

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{ProtocolError, Result};
use crate::registry::CreditIdentityRegistry;

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Eligibility bracket derived from a credit score. Fixes the maximum
/// principal and the flat interest rate of any loan originated under it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// 850+. The best terms the protocol offers.
    Premium,
    /// 700–849.
    Prime,
    /// 550–699.
    Standard,
    /// 400–549. Entry-level borrowing.
    Micro,
    /// Below 400, or no profile at all. Cannot borrow.
    None,
}

impl Tier {
    /// Maps a score to its tier. Thresholds are inclusive lower bounds,
    /// evaluated highest-first.
    pub fn for_score(score: u32) -> Tier {
        match score {
            s if s >= config::TIER_PREMIUM_MIN => Tier::Premium,
            s if s >= config::TIER_PRIME_MIN => Tier::Prime,
            s if s >= config::TIER_STANDARD_MIN => Tier::Standard,
            s if s >= config::TIER_MICRO_MIN => Tier::Micro,
            _ => Tier::None,
        }
    }

    /// Maximum loan principal for this tier, in micro-units.
    pub fn max_loan_amount(&self) -> u64 {
        match self {
            Tier::Premium => config::MAX_LOAN_PREMIUM,
            Tier::Prime => config::MAX_LOAN_PRIME,
            Tier::Standard => config::MAX_LOAN_STANDARD,
            Tier::Micro => config::MAX_LOAN_MICRO,
            Tier::None => 0,
        }
    }

    /// Flat interest rate in whole percent, or `None` for the ineligible tier.
    pub fn interest_rate_pct(&self) -> Option<u64> {
        match self {
            Tier::Premium => Some(config::RATE_PREMIUM_PCT),
            Tier::Prime => Some(config::RATE_PRIME_PCT),
            Tier::Standard => Some(config::RATE_STANDARD_PCT),
            Tier::Micro => Some(config::RATE_MICRO_PCT),
            Tier::None => None,
        }
    }

    /// Returns `true` if this tier may borrow at all.
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Tier::None)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Premium => "premium",
            Tier::Prime => "prime",
            Tier::Standard => "standard",
            Tier::Micro => "micro",
            Tier::None => "none",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// The eligibility view served to borrowers and the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Whether the subject may open a loan.
    pub eligible: bool,
    /// The tier the stored score maps to.
    pub tier: Tier,
    /// Maximum principal for that tier, in micro-units.
    pub max_loan_amount: u64,
}

impl Eligibility {
    fn for_tier(tier: Tier) -> Self {
        Self {
            eligible: tier.is_eligible(),
            tier,
            max_loan_amount: tier.max_loan_amount(),
        }
    }
}

// ---------------------------------------------------------------------------
// CreditOracleGateway
// ---------------------------------------------------------------------------

/// Validates and forwards externally computed scores into the registry.
///
/// The gateway presents its own component address as the caller on registry
/// writes, so the registry must be configured to trust that address before
/// any submission can land.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditOracleGateway {
    /// Administrator allowed to rotate the oracle signer.
    admin: String,

    /// The identity this gateway presents to the registry.
    contract_address: String,

    /// The off-chain service authorized to submit scores, once configured.
    oracle_address: Option<String>,
}

impl CreditOracleGateway {
    /// Creates a gateway with no oracle signer configured.
    pub fn new(admin: &str, contract_address: &str) -> Self {
        Self {
            admin: admin.to_string(),
            contract_address: contract_address.to_string(),
            oracle_address: None,
        }
    }

    /// The identity this gateway presents to the registry.
    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    /// Rotates the authorized oracle signer. Admin-only.
    pub fn set_oracle_address(&mut self, caller: &str, addr: &str) -> Result<()> {
        if caller != self.admin {
            return Err(ProtocolError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        self.oracle_address = Some(addr.to_string());
        tracing::info!(oracle = addr, "oracle signer configured");
        Ok(())
    }

    /// Ingests a score for `subject`.
    ///
    /// Idempotent over profile existence: the first submission mints the
    /// subject's profile, every later one updates it in place.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Unauthorized`] unless `caller` is the configured signer.
    /// - [`ProtocolError::ScoreOutOfRange`] if `score > 1000`.
    /// - [`ProtocolError::Unauthorized`] from the registry if this gateway's
    ///   address has not been configured as its trusted oracle.
    pub fn submit_score(
        &self,
        registry: &mut CreditIdentityRegistry,
        caller: &str,
        subject: &str,
        score: u32,
        source_bitmask: u32,
    ) -> Result<()> {
        if self.oracle_address.as_deref() != Some(caller) {
            return Err(ProtocolError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        if score > config::MAX_CREDIT_SCORE {
            return Err(ProtocolError::ScoreOutOfRange { score });
        }

        if !registry.has_profile(subject) {
            registry.mint_profile(&self.contract_address, subject)?;
        }
        registry.update_profile(&self.contract_address, subject, score, source_bitmask)?;

        tracing::info!(subject, score, source_bitmask, "score submitted");
        Ok(())
    }

    /// The stored score for `subject`, or 0 if no profile exists.
    pub fn get_score(&self, registry: &CreditIdentityRegistry, subject: &str) -> u32 {
        registry
            .get_profile(subject)
            .map(|p| p.credit_score)
            .unwrap_or(0)
    }

    /// Eligibility of `subject` under the tier table. Addresses without a
    /// profile land in the "none" tier rather than erroring — eligibility is
    /// a read, not a gate.
    pub fn check_eligibility(
        &self,
        registry: &CreditIdentityRegistry,
        subject: &str,
    ) -> Eligibility {
        let tier = registry
            .get_profile(subject)
            .map(|p| Tier::for_score(p.credit_score))
            .unwrap_or(Tier::None);
        Eligibility::for_tier(tier)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
