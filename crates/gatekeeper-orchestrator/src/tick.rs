// crates/gatekeeper-orchestrator/src/tick.rs
// ============================================================================
// Module: Orchestrator Tick
// Description: One run of the periodic scan-dispatch algorithm (§4.F).
// Purpose: Claim pending catalog rows up to the free concurrency slots and
//          submit a scanner job for each, without ever exceeding the global
//          cap read from the workload runner.
// Dependencies: gatekeeper-core, gatekeeper-config, tokio, tracing
// ============================================================================

//! ## Overview
//! A tick has five steps (§4.F): count running jobs via the runner, compute
//! free slots, claim that many `pending` rows from the catalog, submit one
//! job per row, and emit a structured summary. `RunnerUnavailable` and
//! `CatalogUnavailable` (§7) are surfaced as distinct errors rather than
//! silently treated as "zero running jobs" or "nothing to claim"; the
//! design note in `spec.md` §9 calls out exactly this kind of broad
//! exception-to-default masking as a defect to avoid. A per-job submit
//! failure, by contrast, is expected and handled inline: the row stays
//! `pending` and the next tick retries it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use gatekeeper_core::CatalogEntry;
use gatekeeper_core::CatalogError;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::RunnerError;
use gatekeeper_core::WorkloadRunnerClient;
use thiserror::Error;

use crate::job::build_job_spec;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that abort a tick outright (§7: `CatalogUnavailable`,
/// `RunnerUnavailable`). Both are logged by the caller and the tick is
/// skipped; the next scheduled tick retries from scratch.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The workload runner could not be reached to count running jobs.
    #[error("workload runner unavailable: {0}")]
    RunnerUnavailable(#[source] RunnerError),
    /// The catalog could not be reached to claim pending rows.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Fixed parameters for every tick (component G's job-naming prefix, the
/// concurrency cap, and the fields every job spec needs).
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Prefix used both to count running jobs and to name new ones
    /// (`scanner-`).
    pub job_name_prefix: String,
    /// Global concurrency cap on in-flight scans (`MAX_CONCURRENT_JOBS`).
    pub max_concurrent_jobs: u32,
    /// Container image for scanner jobs (`SCANNER_IMAGE`).
    pub scanner_image: String,
    /// SQLite connection string passed through to the worker's environment.
    pub database_url: String,
    /// Internal index base URL passed through to the worker's environment.
    pub pypi_server_url: String,
    /// Runtime versions the worker should attempt, in order.
    pub runtime_versions: Vec<String>,
    /// Per-job wall-clock timeout passed to the runner.
    pub job_timeout_seconds: u64,
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// A structured summary of one tick, emitted via `tracing` and returned for
/// callers (tests, the CLI) that want to inspect it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Jobs the runner reported running at the start of the tick.
    pub running_before: u32,
    /// Free slots computed from `max_concurrent_jobs - running_before`.
    pub slots: u32,
    /// Rows claimed from the catalog this tick.
    pub claimed: usize,
    /// Jobs successfully submitted to the runner.
    pub submitted: usize,
    /// Jobs whose submission failed; the underlying row stays `pending`.
    pub failed_submissions: usize,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// The periodic scan-dispatch controller (component F).
pub struct Orchestrator {
    catalog: Arc<dyn CatalogStore>,
    runner: Arc<dyn WorkloadRunnerClient>,
    config: TickConfig,
}

impl Orchestrator {
    /// Builds an orchestrator over its dependencies, built once at the
    /// binary's startup (§9: explicit dependency-passing, no singletons).
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, runner: Arc<dyn WorkloadRunnerClient>, config: TickConfig) -> Self {
        Self { catalog, runner, config }
    }

    /// Runs one tick of the dispatch algorithm (§4.F steps 1-5).
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the runner or catalog cannot be
    /// reached; the tick is abandoned rather than guessing a default.
    pub async fn run_tick(&self) -> Result<TickSummary, OrchestratorError> {
        let running_before = self
            .runner
            .count_running(&self.config.job_name_prefix)
            .await
            .map_err(OrchestratorError::RunnerUnavailable)?;

        let slots = self.config.max_concurrent_jobs.saturating_sub(running_before);
        let mut summary = TickSummary { running_before, slots, ..TickSummary::default() };
        if slots == 0 {
            tracing::info!(running_before, "orchestrator tick: no free slots");
            return Ok(summary);
        }

        let candidates = self.claim(slots).await.map_err(OrchestratorError::CatalogUnavailable)?;
        summary.claimed = candidates.len();

        for entry in candidates {
            let spec = build_job_spec(
                &entry,
                &self.config.scanner_image,
                &self.config.database_url,
                &self.config.pypi_server_url,
                &self.config.runtime_versions,
                self.config.job_timeout_seconds,
            );
            let job_name = spec.job_name.clone();
            match self.runner.submit(spec).await {
                Ok(()) => {
                    summary.submitted += 1;
                    tracing::info!(job_name, package = %entry.name, version = %entry.version, "scanner job submitted");
                }
                Err(err) => {
                    summary.failed_submissions += 1;
                    tracing::warn!(
                        job_name,
                        package = %entry.name,
                        version = %entry.version,
                        error = %err,
                        "scanner job submission failed, row remains pending"
                    );
                }
            }
        }

        tracing::info!(
            running_before,
            slots,
            claimed = summary.claimed,
            submitted = summary.submitted,
            failed = summary.failed_submissions,
            "orchestrator tick complete"
        );
        Ok(summary)
    }

    async fn claim(&self, limit: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        let catalog = self.catalog.clone();
        match tokio::task::spawn_blocking(move || catalog.claim(limit)).await {
            Ok(result) => result,
            Err(join_err) => Err(CatalogError::Connectivity(join_err.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
