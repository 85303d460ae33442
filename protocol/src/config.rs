//! # Protocol Configuration & Constants
//!
//! Every magic number in Strata lives here. The tier table, installment
//! schedule, and interest split are consensus-critical: integrators hard-code
//! the numeric outputs they produce, so changing any of them is a breaking
//! protocol revision, not a tuning knob.

// ---------------------------------------------------------------------------
// Credit Scores
// ---------------------------------------------------------------------------

/// Upper bound of the credit score range. Scores are `0..=1000`; the oracle
/// gateway rejects anything above this before it reaches the registry.
pub const MAX_CREDIT_SCORE: u32 = 1000;

/// Inclusive score floors for each eligibility tier, evaluated highest-first.
/// Below `TIER_MICRO_MIN` an address is ineligible to borrow.
pub const TIER_PREMIUM_MIN: u32 = 850;
pub const TIER_PRIME_MIN: u32 = 700;
pub const TIER_STANDARD_MIN: u32 = 550;
pub const TIER_MICRO_MIN: u32 = 400;

// ---------------------------------------------------------------------------
// Settlement Asset
// ---------------------------------------------------------------------------

/// The settlement asset is a 6-decimal stable-value token. All protocol
/// amounts are denominated in micro-units; the protocol never divides by
/// this — it exists for display and for writing readable constants.
pub const ASSET_DECIMALS: u8 = 6;

/// One whole settlement-asset unit in micro-units.
pub const MICRO: u64 = 1_000_000;

/// Amount minted per devnet faucet call: 1,000 whole units. Enough to fund
/// a standard-tier loan cycle in one call.
pub const FAUCET_AMOUNT: u64 = 1_000 * MICRO;

// ---------------------------------------------------------------------------
// Loan Terms
// ---------------------------------------------------------------------------

/// Maximum principal per tier, in micro-units.
pub const MAX_LOAN_PREMIUM: u64 = 5_000 * MICRO;
pub const MAX_LOAN_PRIME: u64 = 2_000 * MICRO;
pub const MAX_LOAN_STANDARD: u64 = 500 * MICRO;
pub const MAX_LOAN_MICRO: u64 = 100 * MICRO;

/// Flat interest rate per tier, in whole percent. Computed once on principal
/// at origination — not compounding per period.
pub const RATE_PREMIUM_PCT: u64 = 4;
pub const RATE_PRIME_PCT: u64 = 4;
pub const RATE_STANDARD_PCT: u64 = 5;
pub const RATE_MICRO_PCT: u64 = 5;

/// Every loan is repaid in exactly four installments.
pub const INSTALLMENTS_TOTAL: u32 = 4;

/// Blocks per installment period: 2016 blocks ≈ two weeks at 10-minute
/// blocks. The due height advances by this much after each payment.
pub const INSTALLMENT_PERIOD_BLOCKS: u64 = 2016;

/// Split of collected interest, in whole percent. The vault share accrues to
/// depositors by raising the share price; the remainder is routed to the
/// protocol treasury. Must sum to 100.
pub const VAULT_INTEREST_SHARE_PCT: u64 = 80;
pub const TREASURY_INTEREST_SHARE_PCT: u64 = 20;

// ---------------------------------------------------------------------------
// Profile Token Metadata
// ---------------------------------------------------------------------------

/// Base URI for credit-profile token metadata, consumed by external indexers
/// via the registry's `token_uri` read.
pub const PROFILE_TOKEN_URI_BASE: &str = "https://api.stratalabs.finance/profiles/";

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default REST API port for `strata-node`.
pub const DEFAULT_RPC_PORT: u16 = 8470;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 8471;

/// Default block interval in milliseconds. Ten minutes matches the burn
/// chain the installment cadence was sized for; devnet runs override this
/// to something humane.
pub const DEFAULT_BLOCK_INTERVAL_MS: u64 = 600_000;
