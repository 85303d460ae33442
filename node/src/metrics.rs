//! # Prometheus Metrics
//!
//! Exposes operational metrics for the protocol node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers and background tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total credit scores accepted through the oracle gateway.
    pub scores_submitted_total: IntCounter,
    /// Total loans originated by the vault.
    pub loans_originated_total: IntCounter,
    /// Total loans fully repaid.
    pub loans_repaid_total: IntCounter,
    /// Total loans written off as defaulted.
    pub loans_defaulted_total: IntCounter,
    /// Current pool value claimed by depositors, in micro-units.
    pub vault_total_deposits: IntGauge,
    /// Current shares outstanding across all depositors.
    pub vault_total_shares: IntGauge,
    /// Loans currently in active status.
    pub active_loans: IntGauge,
    /// Current block height of the installment clock.
    pub block_height: IntGauge,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("strata".into()), None)
            .expect("failed to create prometheus registry");

        let scores_submitted_total = IntCounter::new(
            "scores_submitted_total",
            "Total credit scores accepted through the oracle gateway",
        )
        .expect("metric creation");
        registry
            .register(Box::new(scores_submitted_total.clone()))
            .expect("metric registration");

        let loans_originated_total = IntCounter::new(
            "loans_originated_total",
            "Total loans originated by the vault",
        )
        .expect("metric creation");
        registry
            .register(Box::new(loans_originated_total.clone()))
            .expect("metric registration");

        let loans_repaid_total =
            IntCounter::new("loans_repaid_total", "Total loans fully repaid")
                .expect("metric creation");
        registry
            .register(Box::new(loans_repaid_total.clone()))
            .expect("metric registration");

        let loans_defaulted_total = IntCounter::new(
            "loans_defaulted_total",
            "Total loans written off as defaulted",
        )
        .expect("metric creation");
        registry
            .register(Box::new(loans_defaulted_total.clone()))
            .expect("metric registration");

        let vault_total_deposits = IntGauge::new(
            "vault_total_deposits",
            "Pool value claimed by depositors, in micro-units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(vault_total_deposits.clone()))
            .expect("metric registration");

        let vault_total_shares = IntGauge::new(
            "vault_total_shares",
            "Shares outstanding across all depositors",
        )
        .expect("metric creation");
        registry
            .register(Box::new(vault_total_shares.clone()))
            .expect("metric registration");

        let active_loans =
            IntGauge::new("active_loans", "Loans currently in active status")
                .expect("metric creation");
        registry
            .register(Box::new(active_loans.clone()))
            .expect("metric registration");

        let block_height = IntGauge::new(
            "block_height",
            "Current block height of the installment clock",
        )
        .expect("metric creation");
        registry
            .register(Box::new(block_height.clone()))
            .expect("metric registration");

        Self {
            registry,
            scores_submitted_total,
            loans_originated_total,
            loans_repaid_total,
            loans_defaulted_total,
            vault_total_deposits,
            vault_total_shares,
            active_loans,
            block_height,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_encode() {
        let metrics = NodeMetrics::new();
        metrics.scores_submitted_total.inc();
        metrics.vault_total_deposits.set(3_000_000_000);
        metrics.block_height.set(42);

        let body = metrics.encode().expect("encode");
        assert!(body.contains("strata_scores_submitted_total 1"));
        assert!(body.contains("strata_vault_total_deposits 3000000000"));
        assert!(body.contains("strata_block_height 42"));
    }
}
