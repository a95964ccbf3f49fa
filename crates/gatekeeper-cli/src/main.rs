// crates/gatekeeper-cli/src/main.rs
// ============================================================================
// Module: Gatekeeper Admin CLI
// Description: Command dispatcher for one-shot orchestrator ticks, scanner
//              jobs, and read-only catalog inspection.
// Purpose: Give operators and container entry points a single binary for
//          everything that is not the long-lived Gate HTTP server.
// Dependencies: clap, gatekeeper-config, gatekeeper-core,
//               gatekeeper-orchestrator, gatekeeper-runner,
//               gatekeeper-store-sqlite, gatekeeper-worker, tokio
// ============================================================================

//! ## Overview
//! `scan` is the scanner job entry point: the Orchestrator's [`JobSpec`]
//! names `["scan"]` as its `command_args` and carries `PACKAGE_NAME` in its
//! environment (§4.F), so a deployed scanner image's entrypoint is this
//! binary invoked as `gatekeeper-cli scan`. `tick` runs a single Orchestrator
//! pass and is meant for a cron-driven deployment rather than the long-lived
//! interval loop (§4.F, §5). `status` and `list` are read-only catalog
//! inspection, grounded on `original_source/check_db.py` and
//! `original_source/list_packages.py`.

pub(crate) mod commands;

use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "gatekeeper-cli", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Orchestrator, either once (cron-driven) or as a long-lived
    /// interval loop sharing the same tick implementation (§4.F, §5).
    Tick {
        /// Keep running, ticking every `ORCHESTRATOR_TICK_SECONDS`, instead
        /// of exiting after one tick.
        #[arg(long)]
        interval_loop: bool,
    },
    /// Run the scanner worker contract for one package spec.
    Scan {
        /// `name==version` spec; falls back to the `PACKAGE_NAME` env var.
        package: Option<String>,
    },
    /// Print catalog status counts.
    Status,
    /// List catalog rows.
    List {
        /// Only list `pending` rows, oldest first.
        #[arg(long)]
        pending: bool,
        /// Maximum rows to return.
        #[arg(long, default_value_t = 100)]
        limit: u32,
        /// Row offset for pagination.
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Tick { interval_loop } => commands::tick::run(interval_loop).await,
        Commands::Scan { package } => commands::scan::run(package).await,
        Commands::Status => commands::admin::status(),
        Commands::List { pending, limit, offset } => commands::admin::list(pending, limit, offset),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "gatekeeper-cli command failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder().with_default_directive(tracing::Level::INFO.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).finish().try_init().ok();
}
