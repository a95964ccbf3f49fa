// crates/gatekeeper-core/src/error.rs
// ============================================================================
// Module: Error Kinds
// Description: The error kinds every Gatekeeper component surfaces (§7).
// Purpose: Make "caught broadly, logged, treated as zero/absent" failure
//          modes explicit types instead of silently-swallowed exceptions.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The source this system is drawn from caught exceptions broadly and
//! converted them to logged defaults (for example "runner unreachable ->
//! treat as zero running jobs"). That masks real outages. These error kinds
//! make each such condition an explicit, matchable type so a caller can
//! choose to alert rather than silently substitute a default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::catalog::ScanStatus;

// ============================================================================
// SECTION: Catalog Errors
// ============================================================================

/// Errors surfaced by a catalog store implementation.
///
/// # Invariants
/// - Variants are stable for programmatic handling; callers match on
///   [`CatalogError::is_transient`] to decide whether to retry.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transient connectivity failure (lock contention, dropped
    /// connection). Safe to retry with backoff.
    #[error("catalog connectivity error: {0}")]
    Connectivity(String),
    /// The requested status transition is not legal for the scan lifecycle.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        /// The row's current status.
        from: ScanStatus,
        /// The status the caller attempted to transition to.
        to: ScanStatus,
    },
    /// Store data failed an integrity check (corrupt row, schema mismatch).
    #[error("catalog store corruption: {0}")]
    Corrupt(String),
    /// An operation referenced a row that does not exist.
    #[error("catalog row not found for {name} {version}")]
    NotFound {
        /// Package name looked up.
        name: String,
        /// Version spec looked up.
        version: String,
    },
}

impl CatalogError {
    /// Returns true when the failure is transient connectivity and the
    /// caller's retry policy (§4.A: up to 3 attempts, 2 s backoff) applies.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// `CatalogUnavailable`: the catalog could not be reached at all after
/// retries. The Gate returns `500 Internal`; the Orchestrator logs and
/// skips the tick.
#[derive(Debug, Error)]
#[error("catalog unavailable: {0}")]
pub struct CatalogUnavailable(pub String);

// ============================================================================
// SECTION: Upstream Errors
// ============================================================================

/// `UpstreamUnavailable`: the internal index probe failed for a reason
/// other than `404`. The Gate treats this as `Absent` for decision purposes
/// but must log it.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request timed out or the connection failed.
    #[error("upstream index transport error: {0}")]
    Transport(String),
    /// The upstream index returned an unexpected, non-404 status.
    #[error("upstream index returned unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status code returned by the upstream index.
        status: u16,
    },
}

// ============================================================================
// SECTION: Runner Errors
// ============================================================================

/// `RunnerUnavailable`: the workload runner could not be reached. The
/// Orchestrator logs and leaves affected rows `pending` for the next tick.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The request timed out or the connection failed after retries.
    #[error("workload runner transport error: {0}")]
    Transport(String),
    /// The runner rejected the submission (malformed spec, quota, etc.).
    #[error("workload runner rejected submission: {0}")]
    Rejected(String),
}

// ============================================================================
// SECTION: Gate Errors
// ============================================================================

/// Errors surfaced by the Gate's decision algorithm (§4.D step 5: any
/// unexpected exception in steps 1-4 is logged and produces `500 Internal`).
#[derive(Debug, Error)]
pub enum GateError {
    /// The catalog could not be reached; surfaces as `500 Internal`.
    #[error(transparent)]
    CatalogUnavailable(#[from] CatalogUnavailable),
    /// An unexpected internal failure occurred while forming a decision.
    #[error("internal gate error: {0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Worker Errors
// ============================================================================

/// `PublishFailed`: the scanner worker's upload step failed after a clean
/// scan. The row stays non-terminal and the worker exits non-zero so the
/// Orchestrator resubmits it.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Every configured runtime failed to download the release.
    #[error("download failed for every runtime: {0}")]
    DownloadFailed(String),
    /// The vulnerability scanner tool itself failed to run.
    #[error("scanner tool failed: {0}")]
    ScanToolFailed(String),
    /// Uploading a clean artifact to the internal index failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),
}
