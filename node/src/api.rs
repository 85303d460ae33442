//! # REST API
//!
//! Builds the axum router that exposes the protocol node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                    | Description                          |
//! |--------|-------------------------|--------------------------------------|
//! | GET    | `/health`               | Liveness probe                       |
//! | GET    | `/status`               | Node status summary                  |
//! | GET    | `/profiles/:address`    | Credit profile                       |
//! | GET    | `/eligibility/:address` | Borrowing eligibility                |
//! | GET    | `/loans/:address`       | Most recent loan                     |
//! | GET    | `/shares/:address`      | Vault shares held                    |
//! | GET    | `/vault/stats`          | Aggregate pool figures               |
//! | POST   | `/oracle/scores`        | Submit a credit score (oracle signer)|
//! | POST   | `/vault/deposits`       | Deposit into the pool                |
//! | POST   | `/vault/withdrawals`    | Redeem shares                        |
//! | POST   | `/vault/loans`          | Originate a loan                     |
//! | POST   | `/vault/repayments`     | Pay the next installment             |
//! | POST   | `/vault/defaults`       | Write off a loan (admin)             |
//! | POST   | `/faucet`               | Mint devnet settlement asset         |
//!
//! Caller identity travels in the request body. The node is a devnet host,
//! not a signature verifier — authenticating callers is the deployment's
//! transaction layer's job.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use strata_protocol::error::ProtocolError;
use strata_protocol::oracle::CreditOracleGateway;
use strata_protocol::registry::CreditIdentityRegistry;
use strata_protocol::token::InMemoryToken;
use strata_protocol::vault::{LendingVault, LoanStatus, VaultConfig};

use crate::metrics::SharedMetrics;

/// Component address the registry trusts for score writes.
pub const ORACLE_GATEWAY_ADDRESS: &str = "strata.credit-oracle";

/// Component address the registry trusts for debt writes, and the account
/// the vault holds pool funds under.
pub const VAULT_ADDRESS: &str = "strata.loan-vault";

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The full protocol state hosted by this node: all three components plus
/// the devnet settlement asset, mutated together under one lock.
pub struct Ledger {
    pub registry: CreditIdentityRegistry,
    pub gateway: CreditOracleGateway,
    pub vault: LendingVault,
    pub token: InMemoryToken,
}

impl Ledger {
    /// Wires the components the way a deployment transaction would: the
    /// registry trusts the gateway and vault addresses, the gateway trusts
    /// the off-chain signer, and the vault knows its admin and treasury.
    ///
    /// Trust configuration cannot fail here — `admin` is the caller of its
    /// own setup.
    pub fn bootstrap(admin: &str, oracle_signer: &str, treasury: &str) -> Self {
        let mut registry = CreditIdentityRegistry::new(admin);
        let mut gateway = CreditOracleGateway::new(admin, ORACLE_GATEWAY_ADDRESS);

        // Infallible by construction; a panic here is a bug in bootstrap itself.
        registry
            .set_oracle_contract(admin, ORACLE_GATEWAY_ADDRESS)
            .expect("admin configures own registry");
        registry
            .set_vault_contract(admin, VAULT_ADDRESS)
            .expect("admin configures own registry");
        gateway
            .set_oracle_address(admin, oracle_signer)
            .expect("admin configures own gateway");

        let vault = LendingVault::new(VaultConfig {
            admin: admin.to_string(),
            contract_address: VAULT_ADDRESS.to_string(),
            treasury: treasury.to_string(),
        });

        Self {
            registry,
            gateway,
            vault,
            token: InMemoryToken::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`. The ledger sits behind a single
/// `RwLock`, which serializes mutations the way a chain serializes
/// transactions: reads run concurrently, writes run alone.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Current block height (advanced by the block ticker).
    pub block_height: Arc<std::sync::atomic::AtomicU64>,
    /// The hosted protocol state.
    pub ledger: Arc<RwLock<Ledger>>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/profiles/:address", get(profile_handler))
        .route("/eligibility/:address", get(eligibility_handler))
        .route("/loans/:address", get(loan_handler))
        .route("/shares/:address", get(shares_handler))
        .route("/vault/stats", get(vault_stats_handler))
        .route("/oracle/scores", post(submit_score_handler))
        .route("/vault/deposits", post(deposit_handler))
        .route("/vault/withdrawals", post(withdraw_handler))
        .route("/vault/loans", post(apply_loan_handler))
        .route("/vault/repayments", post(repay_handler))
        .route("/vault/defaults", post(default_handler))
        .route("/faucet", post(faucet_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Current block height of the installment clock.
    pub block_height: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Request body for `POST /oracle/scores`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitScoreRequest {
    /// Must match the configured oracle signer.
    pub caller: String,
    /// The address being scored.
    pub subject: String,
    /// Credit score, `0..=1000`.
    pub score: u32,
    /// Bitmask of the signal categories backing the score.
    #[serde(default)]
    pub source_bitmask: u32,
}

/// Request body for `POST /vault/deposits`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub caller: String,
    /// Amount in micro-units.
    pub amount: u64,
}

/// Response payload for `POST /vault/deposits`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    /// Shares minted for this deposit.
    pub shares_minted: u64,
    /// Caller's total share balance after the deposit.
    pub total_shares_held: u64,
}

/// Request body for `POST /vault/withdrawals`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub caller: String,
    /// Shares to redeem.
    pub shares: u64,
}

/// Response payload for `POST /vault/withdrawals`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawResponse {
    /// Settlement-asset payout in micro-units.
    pub payout: u64,
    /// Caller's remaining share balance.
    pub total_shares_held: u64,
}

/// Request body for `POST /vault/loans` and `POST /vault/repayments`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowerRequest {
    pub caller: String,
}

/// Request body for `POST /vault/defaults`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultRequest {
    /// Must match the vault administrator.
    pub caller: String,
    /// The borrower whose active loan is written off.
    pub borrower: String,
}

/// Request body for `POST /faucet`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FaucetRequest {
    pub account: String,
}

/// Response payload for `POST /faucet`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FaucetResponse {
    /// Account balance after the grant, in micro-units.
    pub balance: u64,
}

/// Response payload for `GET /shares/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SharesResponse {
    pub address: String,
    /// Shares held.
    pub shares: u64,
    /// Current redemption value of those shares, in micro-units.
    pub value: u64,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub error: String,
    /// Stable protocol error code.
    pub code: u32,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps a protocol error onto an HTTP response, carrying the stable numeric
/// code in the body so integrators can match on it.
fn error_response(err: ProtocolError) -> Response {
    let status = match err.code() {
        100 | 306 | 403 => StatusCode::FORBIDDEN,
        300 | 303 => StatusCode::NOT_FOUND,
        102 | 302 => StatusCode::CONFLICT,
        200 | 301 | 307 | 308 => StatusCode::BAD_REQUEST,
        305 | 500 => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorResponse {
        error: err.to_string(),
        code: err.code(),
    };
    (status, Json(body)).into_response()
}

/// Pushes the pool gauges after any vault mutation.
fn sync_vault_gauges(state: &AppState, vault: &LendingVault) {
    let stats = vault.stats();
    state
        .metrics
        .vault_total_deposits
        .set(stats.total_deposits as i64);
    state
        .metrics
        .vault_total_shares
        .set(stats.total_shares as i64);
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// Liveness probe for orchestrators. It intentionally does not inspect
/// protocol state — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        block_height: state
            .block_height
            .load(std::sync::atomic::Ordering::Relaxed),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /profiles/:address` — returns the credit profile. 404 if the address
/// was never scored.
async fn profile_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let ledger = state.ledger.read().await;
    match ledger.registry.get_profile(&address) {
        Some(profile) => Json(profile).into_response(),
        None => error_response(ProtocolError::NoProfile { address }),
    }
}

/// `GET /eligibility/:address` — returns borrowing eligibility. Addresses
/// without a profile report the ineligible tier rather than 404.
async fn eligibility_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let ledger = state.ledger.read().await;
    let eligibility = ledger.gateway.check_eligibility(&ledger.registry, &address);
    Json(eligibility)
}

/// `GET /loans/:address` — returns the borrower's most recent loan, active
/// or terminal. 404 if they never borrowed.
async fn loan_handler(Path(address): Path<String>, State(state): State<AppState>) -> Response {
    let ledger = state.ledger.read().await;
    match ledger.vault.get_loan(&address) {
        Some(loan) => Json(loan).into_response(),
        None => error_response(ProtocolError::NoActiveLoan { borrower: address }),
    }
}

/// `GET /shares/:address` — returns shares held and their redemption value.
async fn shares_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let ledger = state.ledger.read().await;
    let shares = ledger.vault.user_shares(&address);
    let stats = ledger.vault.stats();
    let value = if stats.total_shares == 0 {
        0
    } else {
        (shares as u128 * stats.total_deposits as u128 / stats.total_shares as u128) as u64
    };
    Json(SharesResponse {
        address,
        shares,
        value,
    })
}

/// `GET /vault/stats` — aggregate pool figures.
async fn vault_stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.read().await;
    Json(ledger.vault.stats())
}

// ---------------------------------------------------------------------------
// Write Handlers
// ---------------------------------------------------------------------------

/// `POST /oracle/scores` — submits a credit score for an address.
///
/// 403 unless `caller` is the configured oracle signer; 400 for scores
/// above 1000.
async fn submit_score_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitScoreRequest>,
) -> Response {
    let mut ledger = state.ledger.write().await;
    let Ledger {
        registry, gateway, ..
    } = &mut *ledger;

    match gateway.submit_score(registry, &req.caller, &req.subject, req.score, req.source_bitmask)
    {
        Ok(()) => {
            state.metrics.scores_submitted_total.inc();
            let eligibility = gateway.check_eligibility(registry, &req.subject);
            (StatusCode::OK, Json(eligibility)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `POST /vault/deposits` — deposits settlement asset into the pool.
async fn deposit_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Response {
    let mut ledger = state.ledger.write().await;
    let Ledger { vault, token, .. } = &mut *ledger;

    match vault.deposit(token, &req.caller, req.amount) {
        Ok(shares_minted) => {
            sync_vault_gauges(&state, vault);
            let resp = DepositResponse {
                shares_minted,
                total_shares_held: vault.user_shares(&req.caller),
            };
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `POST /vault/withdrawals` — redeems shares for settlement asset.
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Response {
    let mut ledger = state.ledger.write().await;
    let Ledger { vault, token, .. } = &mut *ledger;

    match vault.withdraw(token, &req.caller, req.shares) {
        Ok(payout) => {
            sync_vault_gauges(&state, vault);
            let resp = WithdrawResponse {
                payout,
                total_shares_held: vault.user_shares(&req.caller),
            };
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `POST /vault/loans` — originates a loan at the caller's tier maximum.
async fn apply_loan_handler(
    State(state): State<AppState>,
    Json(req): Json<BorrowerRequest>,
) -> Response {
    let current_block = state
        .block_height
        .load(std::sync::atomic::Ordering::Relaxed);

    let mut ledger = state.ledger.write().await;
    let Ledger {
        registry,
        vault,
        token,
        ..
    } = &mut *ledger;

    match vault.apply_for_loan(token, registry, &req.caller, current_block) {
        Ok(terms) => {
            state.metrics.loans_originated_total.inc();
            state.metrics.active_loans.inc();
            sync_vault_gauges(&state, vault);
            (StatusCode::OK, Json(terms)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `POST /vault/repayments` — pays the caller's next installment.
async fn repay_handler(
    State(state): State<AppState>,
    Json(req): Json<BorrowerRequest>,
) -> Response {
    let mut ledger = state.ledger.write().await;
    let Ledger {
        registry,
        vault,
        token,
        ..
    } = &mut *ledger;

    match vault.repay_installment(token, registry, &req.caller) {
        Ok(receipt) => {
            if receipt.status == LoanStatus::Repaid {
                state.metrics.loans_repaid_total.inc();
                state.metrics.active_loans.dec();
            }
            sync_vault_gauges(&state, vault);
            (StatusCode::OK, Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `POST /vault/defaults` — writes off a borrower's active loan. Admin-only.
async fn default_handler(
    State(state): State<AppState>,
    Json(req): Json<DefaultRequest>,
) -> Response {
    let mut ledger = state.ledger.write().await;
    let Ledger {
        registry, vault, ..
    } = &mut *ledger;

    match vault.mark_default(registry, &req.caller, &req.borrower) {
        Ok(()) => {
            state.metrics.loans_defaulted_total.inc();
            state.metrics.active_loans.dec();
            (StatusCode::OK, Json(serde_json::json!({ "status": "defaulted" }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `POST /faucet` — mints the devnet faucet grant to an account.
async fn faucet_handler(
    State(state): State<AppState>,
    Json(req): Json<FaucetRequest>,
) -> impl IntoResponse {
    let mut ledger = state.ledger.write().await;
    let balance = ledger.token.faucet(&req.account);
    tracing::debug!(account = %req.account, balance, "faucet grant");
    Json(FaucetResponse { balance })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
