// crates/gatekeeper-runner/src/lib.rs
// ============================================================================
// Module: Gatekeeper Workload Runner Client
// Description: Async HTTP client to the in-cluster workload runner
//              (component G).
// Purpose: Count in-flight scan jobs and submit new ones for the
//          Orchestrator's tick loop.
// Dependencies: gatekeeper-core, gatekeeper-config, reqwest, serde, tokio
// ============================================================================

//! ## Overview
//! `HttpWorkloadRunnerClient` implements [`gatekeeper_core::WorkloadRunnerClient`]
//! against an in-cluster job runner reachable without mutual TLS (§5's
//! resolved Open Question: the runner is unauthenticated in-cluster traffic,
//! optionally bearing a static token). Both operations retry up to
//! [`gatekeeper_config::CLIENT_RETRY_ATTEMPTS`] times with a fixed
//! [`gatekeeper_config::CLIENT_RETRY_BACKOFF`] between attempts.

pub mod client;

pub use client::HttpWorkloadRunnerClient;
