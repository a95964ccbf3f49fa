// crates/gatekeeper-core/src/interfaces.rs
// ============================================================================
// Module: Backend Interfaces
// Description: Backend-agnostic traits for the Catalog, upstream index, and
//              workload runner (components A, B, G).
// Purpose: Let the Gate and Orchestrator depend on contracts, not concrete
//          backends, so tests can substitute fakes.
// Dependencies: crate::catalog, crate::error
// ============================================================================

//! ## Overview
//! These traits are the seams the Gate (component D) and Orchestrator
//! (component F) are built against. Implementations must be deterministic
//! given their backing state and must not swallow errors: transient and
//! structural failures are distinct [`CatalogError`] variants so callers can
//! apply the retry policy in §4.A without guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::catalog::CatalogEntry;
use crate::catalog::PackageName;
use crate::catalog::RuntimeVersion;
use crate::catalog::ScanStatus;
use crate::catalog::VersionSpec;
use crate::catalog::VulnerabilityInfo;
use crate::error::CatalogError;
use crate::error::RunnerError;
use crate::error::UpstreamError;

// ============================================================================
// SECTION: Catalog Store
// ============================================================================

/// Durable mapping from `(name, version)` to scan state (component A).
pub trait CatalogStore: Send + Sync {
    /// Finds the row matching `name` and `version`. When `version` is
    /// absent, matches rows whose version is the `latest` sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on connectivity or corruption failures.
    fn find_by_name_and_version(
        &self,
        name: &PackageName,
        version: Option<&VersionSpec>,
    ) -> Result<Option<CatalogEntry>, CatalogError>;

    /// Idempotently inserts a `pending` row. On conflict, returns the
    /// existing row untouched (`ON CONFLICT DO NOTHING` semantics).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on connectivity or corruption failures.
    fn upsert_pending(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        runtime_version: Option<&RuntimeVersion>,
    ) -> Result<CatalogEntry, CatalogError>;

    /// Claims up to `limit` `pending` rows, oldest `created_at` first,
    /// bumping their `updated_at` to mark the claim. Safe to call
    /// concurrently from multiple processes.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on connectivity or corruption failures.
    fn claim(&self, limit: u32) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Atomically transitions a row to `status`, rejecting illegal
    /// transitions (§3's lifecycle table).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::IllegalTransition`] when the transition is
    /// not permitted, [`CatalogError::NotFound`] when no row matches, or a
    /// connectivity/corruption error.
    fn finalize(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        status: ScanStatus,
        vulnerability_info: Option<VulnerabilityInfo>,
        error_message: Option<String>,
    ) -> Result<CatalogEntry, CatalogError>;

    /// Returns the number of rows in each status.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on connectivity or corruption failures.
    fn count_by_status(&self) -> Result<Vec<(ScanStatus, u64)>, CatalogError>;

    /// Resets a row stuck in a non-terminal error status
    /// ([`ScanStatus::is_reschedulable`]) back to `pending`, clearing its
    /// error message. Unlike [`CatalogStore::finalize`] this bypasses the
    /// scan lifecycle's transition table: a reschedulable status has no
    /// legal outgoing transition, but the Gate must still be able to give
    /// the package another pass through the scanner.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when no row matches, or a
    /// connectivity/corruption error.
    fn reschedule(&self, name: &PackageName, version: &VersionSpec) -> Result<CatalogEntry, CatalogError>;

    /// Lists `pending` rows, oldest first, for the admin surface (§2.K).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on connectivity or corruption failures.
    fn list_pending(&self, limit: u32, offset: u32) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Lists all rows, for the admin surface (§2.K).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on connectivity or corruption failures.
    fn list_all(&self, limit: u32, offset: u32) -> Result<Vec<CatalogEntry>, CatalogError>;
}

// ============================================================================
// SECTION: Upstream Index Client
// ============================================================================

/// The outcome of probing the internal index for a package (component B).
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// The index returned `200` with the passed-through body and headers.
    Present {
        /// Response body, passed through verbatim.
        body: Vec<u8>,
        /// `Content-Type` header value, if present.
        content_type: Option<String>,
    },
    /// The index returned `404`.
    Absent,
}

/// A retrieved artifact's bytes and metadata, for the `/packages/...`
/// streaming surface (§6).
#[derive(Debug, Clone)]
pub struct ArtifactOutcome {
    /// Artifact bytes.
    pub body: Vec<u8>,
    /// `Content-Type` header value, if present.
    pub content_type: Option<String>,
    /// `Content-Disposition` header value, if present.
    pub content_disposition: Option<String>,
}

/// Stateless HTTP client to the internal index's Simple-Index endpoint
/// (component B).
#[async_trait::async_trait]
pub trait IndexClient: Send + Sync {
    /// Probes `GET /simple/{name}/`. A non-404, non-200 status or transport
    /// failure is an [`UpstreamError`]; callers (the Gate) treat this as
    /// `Absent` for decision purposes but must log it.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure or an unexpected
    /// status code.
    async fn probe(&self, name: &PackageName) -> Result<ProbeOutcome, UpstreamError>;

    /// Streams `GET /packages/{path}` for the installer-facing artifact
    /// download surface.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure or an unexpected
    /// status code.
    async fn stream_artifact(&self, path: &str) -> Result<Option<ArtifactOutcome>, UpstreamError>;

    /// Proxies `GET /simple/` (the full index listing) verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure or an unexpected
    /// status code.
    async fn list_index(&self) -> Result<ProbeOutcome, UpstreamError>;
}

// ============================================================================
// SECTION: Workload Runner Client
// ============================================================================

/// A scanner job submission spec (component G). The core treats this as
/// opaque beyond the fields it needs to build (job naming, env vars).
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Unique job name: `scanner-<name>-<version>-py<runtime>-<unix-seconds>`.
    pub job_name: String,
    /// Container image to run.
    pub image: String,
    /// Command-line arguments passed to the container entrypoint.
    pub command_args: Vec<String>,
    /// Environment variables passed to the container.
    pub env: Vec<(String, String)>,
    /// Per-job wall-clock timeout in seconds.
    pub timeout_seconds: u64,
}

/// Abstracts the remote workload runner (component G).
#[async_trait::async_trait]
pub trait WorkloadRunnerClient: Send + Sync {
    /// Counts jobs whose name starts with `prefix` and whose status is not
    /// in `{done, failed, cancelled}`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] after retries are exhausted.
    async fn count_running(&self, prefix: &str) -> Result<u32, RunnerError>;

    /// Submits a job spec to the runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] after retries are exhausted or when the
    /// runner rejects the submission outright.
    async fn submit(&self, spec: JobSpec) -> Result<(), RunnerError>;
}
