// Copyright (c) 2026 Strata Labs. MIT License.
// See LICENSE for details.

//! # Strata Protocol Node
//!
//! Entry point for the `strata-node` binary. Parses CLI arguments,
//! initializes logging and metrics, bootstraps the protocol ledger, and
//! serves the REST API.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — start the protocol node
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use cli::{Commands, StrataNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = StrataNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full protocol node: API server, metrics endpoint, and the
/// block ticker that drives installment due heights.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "strata_node=info,strata_protocol=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        admin = %args.admin,
        oracle_signer = %args.oracle_signer,
        treasury = %args.treasury,
        block_interval_ms = args.block_interval_ms,
        "starting strata-node"
    );

    // --- Protocol ledger ---
    let ledger = api::Ledger::bootstrap(&args.admin, &args.oracle_signer, &args.treasury);
    tracing::info!(
        oracle = api::ORACLE_GATEWAY_ADDRESS,
        vault = api::VAULT_ADDRESS,
        "protocol components wired"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Block height ---
    let block_height = Arc::new(std::sync::atomic::AtomicU64::new(0));

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        block_height: Arc::clone(&block_height),
        ledger: Arc::new(RwLock::new(ledger)),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Block ticker ---
    // Installment due heights are denominated in blocks. Without a chain
    // underneath, the node advances height on a fixed interval; devnet runs
    // shrink the interval to exercise the schedule quickly.
    let height_ref = Arc::clone(&block_height);
    let metrics_ref = Arc::clone(&node_metrics);
    let block_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(
            args.block_interval_ms.max(1),
        ));
        // The first tick fires immediately; skip it so height starts at 0.
        interval.tick().await;
        loop {
            interval.tick().await;
            let h = height_ref.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
            metrics_ref.block_height.set(h as i64);
            tracing::debug!(height = h, "block height advanced");
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    block_loop.abort();
    tracing::info!("strata-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("strata-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
