// crates/gatekeeper-worker/src/traits.rs
// ============================================================================
// Module: Scanner Worker Backend Traits
// Description: The three seams the worker contract (§4.H) is built against.
// Purpose: Let `run_scan_job` be exercised against fakes instead of real
//          `pip`/scanner/`twine` subprocesses.
// Dependencies: gatekeeper-core, async-trait
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gatekeeper_core::PackageName;
use gatekeeper_core::VersionSpec;
use gatekeeper_core::VulnerabilityInfo;
use gatekeeper_core::WorkerError;

use crate::artifact::DownloadedArtifact;

// ============================================================================
// SECTION: Package Downloader
// ============================================================================

/// Downloads a release using one runtime's package installer (§4.H step 1).
///
/// A `None` result means this runtime could not retrieve the release (the
/// runtime is unavailable, the download failed, or it timed out); the
/// caller treats this as a soft per-runtime failure and tries the next
/// configured runtime. An `Err` is reserved for failures unrelated to the
/// release itself (for example, the staging directory could not be
/// created).
#[async_trait::async_trait]
pub trait PackageDownloader: Send + Sync {
    /// Attempts to download `name==version` for `runtime_version` into a
    /// subdirectory of `staging_dir` isolated from other runtimes' attempts.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::DownloadFailed`] when the staging directory
    /// itself cannot be prepared.
    async fn download(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        runtime_version: &str,
        staging_dir: &Path,
    ) -> Result<Option<DownloadedArtifact>, WorkerError>;
}

// ============================================================================
// SECTION: Vulnerability Scanner
// ============================================================================

/// The outcome of scanning a staging directory (§4.H step 3).
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// True when the scanner reported a `CRITICAL` or `HIGH` severity hit.
    pub vulnerable: bool,
    /// Structured scanner report; populated iff `vulnerable`.
    pub vulnerability_info: Option<VulnerabilityInfo>,
}

/// Runs a vulnerability scanner over a staging directory, surfacing only
/// `CRITICAL` and `HIGH` severities (§4.H step 3).
#[async_trait::async_trait]
pub trait VulnerabilityScanner: Send + Sync {
    /// Scans every artifact in `staging_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ScanToolFailed`] when the scanner tool itself
    /// fails to run (distinct from it running and reporting a clean
    /// result).
    async fn scan(&self, staging_dir: &Path) -> Result<ScanOutcome, WorkerError>;
}

// ============================================================================
// SECTION: Artifact Publisher
// ============================================================================

/// Publishes a clean artifact to the internal index (§4.H step 6).
///
/// Implementations MUST treat "file already exists" as success
/// (`twine`-equivalent idempotent upload semantics), since a retried
/// worker may re-upload a file a previous attempt already published.
#[async_trait::async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Uploads `artifact` to the internal index.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::PublishFailed`] when the upload fails for a
    /// reason other than the artifact already being present.
    async fn publish(&self, artifact: &DownloadedArtifact) -> Result<(), WorkerError>;
}
