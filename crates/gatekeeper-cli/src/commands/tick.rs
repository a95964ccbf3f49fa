// crates/gatekeeper-cli/src/commands/tick.rs
// ============================================================================
// Module: Tick Command
// Description: Runs the Orchestrator once or as a long-lived interval loop
//              (§4.F, §5).
// Purpose: Let either a cron-driven deployment or a long-lived process
//          invoke the same dispatch algorithm.
// Dependencies: gatekeeper-config, gatekeeper-core, gatekeeper-orchestrator,
//               gatekeeper-runner, gatekeeper-store-sqlite
// ============================================================================

use std::error::Error;
use std::sync::Arc;

use gatekeeper_config::OrchestratorConfig;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::WorkloadRunnerClient;
use gatekeeper_orchestrator::Orchestrator;
use gatekeeper_orchestrator::TickConfig;
use gatekeeper_orchestrator::TickSummary;
use gatekeeper_runner::HttpWorkloadRunnerClient;
use gatekeeper_store_sqlite::SqliteCatalogStore;

const JOB_NAME_PREFIX: &str = "scanner-";

pub(crate) async fn run(interval_loop: bool) -> Result<(), Box<dyn Error>> {
    let config = OrchestratorConfig::from_env()?;

    let catalog: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::open(&config.database_url)?);
    let runner: Arc<dyn WorkloadRunnerClient> =
        Arc::new(HttpWorkloadRunnerClient::new(config.runner_endpoint.clone(), config.runner_token.clone())?);

    let tick_config = TickConfig {
        job_name_prefix: JOB_NAME_PREFIX.to_string(),
        max_concurrent_jobs: config.max_concurrent_jobs,
        scanner_image: config.scanner_image.clone(),
        database_url: config.database_url.clone(),
        pypi_server_url: config.pypi_server_url.to_string(),
        runtime_versions: config.runtime_versions.clone(),
        job_timeout_seconds: config.job_timeout.as_secs(),
    };
    let orchestrator = Orchestrator::new(catalog, runner, tick_config);

    if !interval_loop {
        let summary = orchestrator.run_tick().await?;
        log_summary(&summary);
        return Ok(());
    }

    tracing::info!(tick_interval_seconds = config.tick_interval.as_secs(), "starting orchestrator interval loop");
    let mut ticker = tokio::time::interval(config.tick_interval);
    loop {
        ticker.tick().await;
        match orchestrator.run_tick().await {
            Ok(summary) => log_summary(&summary),
            Err(err) => tracing::error!(error = %err, "orchestrator tick failed, will retry next interval"),
        }
    }
}

fn log_summary(summary: &TickSummary) {
    tracing::info!(
        running_before = summary.running_before,
        slots = summary.slots,
        claimed = summary.claimed,
        submitted = summary.submitted,
        failed_submissions = summary.failed_submissions,
        "tick finished"
    );
}
