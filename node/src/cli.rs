//! # CLI Interface
//!
//! Defines the command-line argument structure for `strata-node` using
//! `clap` derive. Supports two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};

/// Strata protocol node.
///
/// A single-process deployment of the Strata lending protocol: hosts the
/// credit identity registry, oracle gateway, and lending vault behind a
/// REST API, with a devnet settlement asset and Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "strata-node",
    about = "Strata lending protocol node",
    version,
    propagate_version = true
)]
pub struct StrataNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Strata node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the protocol node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "STRATA_RPC_PORT", default_value_t = strata_protocol::config::DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "STRATA_METRICS_PORT", default_value_t = strata_protocol::config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Protocol administrator address. Configures component trust at
    /// startup and is the only identity allowed to mark defaults.
    #[arg(long, env = "STRATA_ADMIN", default_value = "deployer")]
    pub admin: String,

    /// Address of the off-chain scoring service authorized to submit
    /// credit scores.
    #[arg(long, env = "STRATA_ORACLE_SIGNER", default_value = "oracle-service")]
    pub oracle_signer: String,

    /// Destination account for the treasury's interest cut.
    #[arg(long, env = "STRATA_TREASURY", default_value = "strata-treasury")]
    pub treasury: String,

    /// Milliseconds between block-height ticks. Installment due heights
    /// are denominated in blocks, so devnet runs set this low to exercise
    /// the schedule quickly.
    #[arg(long, env = "STRATA_BLOCK_INTERVAL_MS", default_value_t = strata_protocol::config::DEFAULT_BLOCK_INTERVAL_MS)]
    pub block_interval_ms: u64,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "STRATA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        StrataNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_protocol_config() {
        let cli = StrataNodeCli::parse_from(["strata-node", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.rpc_port, strata_protocol::config::DEFAULT_RPC_PORT);
        assert_eq!(args.admin, "deployer");
        assert_eq!(args.log_format, "pretty");
    }
}
