//! End-to-end lending flows across the registry, oracle gateway, and vault,
//! exercised against the in-memory settlement asset.

use strata_protocol::oracle::{CreditOracleGateway, Tier};
use strata_protocol::registry::CreditIdentityRegistry;
use strata_protocol::token::{FungibleAssetPort, InMemoryToken};
use strata_protocol::vault::{LendingVault, LoanStatus, VaultConfig};

const ADMIN: &str = "deployer";
const ORACLE_GATEWAY: &str = "strata.credit-oracle";
const ORACLE_SIGNER: &str = "oracle-service";
const VAULT_ADDR: &str = "strata.loan-vault";
const TREASURY: &str = "strata-treasury";

struct Protocol {
    token: InMemoryToken,
    registry: CreditIdentityRegistry,
    gateway: CreditOracleGateway,
    vault: LendingVault,
}

/// Wires the three components the way a deployment transaction would:
/// registry trusts the gateway and vault addresses, gateway trusts the
/// off-chain signer.
fn deploy() -> Protocol {
    let mut registry = CreditIdentityRegistry::new(ADMIN);
    registry.set_oracle_contract(ADMIN, ORACLE_GATEWAY).unwrap();
    registry.set_vault_contract(ADMIN, VAULT_ADDR).unwrap();

    let mut gateway = CreditOracleGateway::new(ADMIN, ORACLE_GATEWAY);
    gateway.set_oracle_address(ADMIN, ORACLE_SIGNER).unwrap();

    let vault = LendingVault::new(VaultConfig {
        admin: ADMIN.to_string(),
        contract_address: VAULT_ADDR.to_string(),
        treasury: TREASURY.to_string(),
    });

    Protocol {
        token: InMemoryToken::new(),
        registry,
        gateway,
        vault,
    }
}

impl Protocol {
    fn submit_score(&mut self, subject: &str, score: u32) {
        self.gateway
            .submit_score(&mut self.registry, ORACLE_SIGNER, subject, score, 1)
            .unwrap();
    }

    fn deposit(&mut self, lp: &str, amount: u64) -> u64 {
        self.token.mint(lp, amount);
        self.vault.deposit(&mut self.token, lp, amount).unwrap()
    }

    fn repay_all(&mut self, borrower: &str) {
        loop {
            let receipt = self
                .vault
                .repay_installment(&mut self.token, &mut self.registry, borrower)
                .unwrap();
            if receipt.status == LoanStatus::Repaid {
                break;
            }
        }
    }
}

#[test]
fn depositor_earns_yield_from_a_repaid_prime_loan() {
    let mut p = deploy();
    p.deposit("lp", 3_000_000_000);

    p.submit_score("borrower", 750);
    let terms = p
        .vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    assert_eq!(terms.loan_amount, 2_000_000_000);
    assert_eq!(terms.total_owed, 2_080_000_000);

    p.token.mint("borrower", 80_000_000);
    p.repay_all("borrower");

    // 80M interest: 64M stays in the pool, 16M goes to the treasury, so the
    // sole depositor's shares now redeem above par.
    let payout = p
        .vault
        .withdraw(&mut p.token, "lp", 3_000_000_000)
        .unwrap();
    assert_eq!(payout, 3_064_000_000);
    assert_eq!(p.token.balance_of("lp"), 3_064_000_000);
    assert_eq!(p.token.balance_of(TREASURY), 16_000_000);
    assert_eq!(p.token.balance_of(VAULT_ADDR), 0);
}

#[test]
fn standard_tier_borrower_gets_standard_terms() {
    let mut p = deploy();
    p.deposit("lp", 1_000_000_000);
    p.submit_score("borrower", 600);

    let e = p.gateway.check_eligibility(&p.registry, "borrower");
    assert_eq!(e.tier, Tier::Standard);

    let terms = p
        .vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    assert_eq!(terms.loan_amount, 500_000_000);
    assert_eq!(terms.total_owed, 525_000_000);
    assert_eq!(terms.installment_size, 131_250_000);
}

#[test]
fn two_equal_depositors_split_yield_equally() {
    let mut p = deploy();
    p.deposit("lp-1", 2_000_000_000);
    p.deposit("lp-2", 2_000_000_000);

    p.submit_score("borrower", 750);
    p.vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    p.token.mint("borrower", 80_000_000);
    p.repay_all("borrower");

    // 64M of pool yield across 4,000M shares: each half redeems for 2,032M.
    let payout_1 = p.vault.withdraw(&mut p.token, "lp-1", 2_000_000_000).unwrap();
    let payout_2 = p.vault.withdraw(&mut p.token, "lp-2", 2_000_000_000).unwrap();
    assert_eq!(payout_1, 2_032_000_000);
    assert_eq!(payout_1, payout_2);
    assert_eq!(p.token.balance_of(VAULT_ADDR), 0);
}

#[test]
fn defaulted_borrower_keeps_the_stain_on_their_profile() {
    let mut p = deploy();
    p.deposit("lp", 1_000_000_000);
    p.submit_score("borrower", 450);

    p.vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    p.vault
        .mark_default(&mut p.registry, ADMIN, "borrower")
        .unwrap();

    let profile = p.registry.get_profile("borrower").unwrap();
    assert_eq!(profile.total_loans, 1);
    assert_eq!(profile.total_defaulted, 1);
    assert_eq!(profile.repayment_rate, 0);
    assert_eq!(profile.outstanding_debt, 0);

    // A later clean loan lifts the rate to the mixed-history figure.
    p.vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    p.token.mint("borrower", 5_000_000);
    p.repay_all("borrower");
    assert_eq!(p.registry.get_profile("borrower").unwrap().repayment_rate, 50);
}

#[test]
fn full_lifecycle_score_upgrade_and_reloan() {
    let mut p = deploy();
    p.deposit("lp", 6_000_000_000);

    // Micro-tier first loan.
    p.submit_score("borrower", 450);
    let terms = p
        .vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    assert_eq!(terms.loan_amount, 100_000_000);
    p.token.mint("borrower", 5_000_000);
    p.repay_all("borrower");

    // Score upgrade after clean history; second loan at the new tier.
    p.submit_score("borrower", 870);
    let terms = p
        .vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 10_000)
        .unwrap();
    assert_eq!(terms.loan_amount, 5_000_000_000);
    assert_eq!(terms.total_owed, 5_200_000_000);

    let profile = p.registry.get_profile("borrower").unwrap();
    assert_eq!(profile.total_loans, 2);
    assert_eq!(profile.outstanding_debt, 5_200_000_000);
    assert_eq!(profile.credit_score, 870);

    // Profile identity is unchanged across the whole history.
    assert_eq!(p.registry.last_token_id(), 1);
}

#[test]
fn value_is_conserved_across_the_whole_flow() {
    let mut p = deploy();
    p.deposit("lp", 3_000_000_000);
    p.submit_score("borrower", 750);
    p.vault
        .apply_for_loan(&mut p.token, &mut p.registry, "borrower", 0)
        .unwrap();
    p.token.mint("borrower", 80_000_000);
    let supply_before = p.token.total_supply();

    p.repay_all("borrower");
    p.vault.withdraw(&mut p.token, "lp", 1_000_000_000).unwrap();

    // Protocol operations move value, never create or destroy it.
    assert_eq!(p.token.total_supply(), supply_before);
}
