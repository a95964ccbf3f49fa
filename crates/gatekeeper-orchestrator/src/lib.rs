// crates/gatekeeper-orchestrator/src/lib.rs
// ============================================================================
// Module: Gatekeeper Orchestrator
// Description: The periodic scan-dispatch controller (component F).
// Purpose: Enforce the global scan concurrency cap, claim pending catalog
//          rows, and submit scanner jobs to the workload runner.
// Dependencies: gatekeeper-core, gatekeeper-config, tokio, tracing
// ============================================================================

//! ## Overview
//! [`Orchestrator::run_tick`] is the whole of component F: count in-flight
//! scans via the workload runner, compute the number of free slots, claim
//! that many `pending` catalog rows, and submit one job spec per row. It is
//! meant to be called either from a `tokio::time::interval` loop inside a
//! long-lived process or once from a cron-driven binary entry point; both
//! paths share this single implementation, per §5's scheduling model.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod job;
pub mod tick;

pub use job::build_job_spec;
pub use job::sanitize_job_name_component;
pub use tick::Orchestrator;
pub use tick::OrchestratorError;
pub use tick::TickConfig;
pub use tick::TickSummary;
