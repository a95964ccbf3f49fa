// crates/gatekeeper-worker/src/contract.rs
// ============================================================================
// Module: Scanner Worker Contract
// Description: `run_scan_job`, the orchestration function implementing
//              §4.H steps 1-6.
// Purpose: Drive the download/scan/publish sequence for one claimed
//          `(name, version)` row and finalize the catalog accordingly.
// Dependencies: gatekeeper-core, crate::artifact, crate::traits, tokio
// ============================================================================

//! ## Overview
//! `run_scan_job` is the scanner process's entire job, stated once so it
//! can run against real subprocess backends in production and against
//! fakes in tests. It downloads for every configured runtime (stopping
//! early on a universal artifact), scans the staging directory, and
//! finalizes the catalog row: `vulnerable` without publishing anything, or
//! `completed` only after every retrieved artifact has been accepted by the
//! internal index. A download failure across *every* runtime finalizes
//! `download_error`; a scanner tool failure finalizes `scan_error`. A
//! publish failure does **not** finalize the row at all; it stays
//! `downloaded`, and the worker process is expected to exit non-zero so the
//! job is treated as failed (§4.H: "the contract does not require the
//! worker to roll back").

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use gatekeeper_core::CatalogStore;
use gatekeeper_core::PackageName;
use gatekeeper_core::ScanStatus;
use gatekeeper_core::VersionSpec;
use gatekeeper_core::VulnerabilityInfo;
use gatekeeper_core::WorkerError;

use crate::artifact::DownloadedArtifact;
use crate::artifact::is_universal_artifact;
use crate::traits::ArtifactPublisher;
use crate::traits::PackageDownloader;
use crate::traits::VulnerabilityScanner;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// The terminal outcome of a completed scan job. An `Err` result means the
/// job failed (download, scan, or publish); the worker binary maps that to
/// a non-zero exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanJobOutcome {
    /// Scan was clean and every artifact was published; the catalog row is
    /// now `completed`.
    Completed {
        /// Artifact filenames that were uploaded.
        published: Vec<String>,
    },
    /// Scan reported a `CRITICAL`/`HIGH` hit; the catalog row is now
    /// `vulnerable` and nothing was published.
    Vulnerable,
}

// ============================================================================
// SECTION: Download Phase
// ============================================================================

/// Downloads `name==version` for each of `runtime_versions` in order,
/// stopping at the first universal artifact (§4.H step 2).
async fn download_for_all_runtimes(
    downloader: &dyn PackageDownloader,
    name: &PackageName,
    version: &VersionSpec,
    runtime_versions: &[String],
    staging_dir: &Path,
) -> Result<Vec<DownloadedArtifact>, WorkerError> {
    let mut downloaded = Vec::new();
    for runtime_version in runtime_versions {
        let Some(artifact) = downloader.download(name, version, runtime_version, staging_dir).await? else {
            tracing::warn!(package = %name, version = %version, runtime_version, "download failed for this runtime");
            continue;
        };
        let universal = is_universal_artifact(&artifact.filename);
        tracing::info!(package = %name, version = %version, runtime_version, filename = %artifact.filename, universal, "downloaded artifact");
        downloaded.push(artifact);
        if universal {
            break;
        }
    }
    Ok(downloaded)
}

// ============================================================================
// SECTION: Orchestration
// ============================================================================

/// Runs the full scanner worker contract for `(name, version)`, mutating
/// `catalog` per §4.H's finalize rules.
///
/// # Errors
///
/// Returns [`WorkerError::DownloadFailed`] when every configured runtime
/// failed to download the release, [`WorkerError::ScanToolFailed`] when
/// the scanner tool itself failed, or [`WorkerError::PublishFailed`] when
/// a clean artifact could not be uploaded. In every case the first two are
/// also recorded as a terminal catalog transition; a publish failure is
/// not, since the row is expected to be retried.
#[allow(clippy::too_many_arguments)]
pub async fn run_scan_job(
    catalog: &Arc<dyn CatalogStore>,
    downloader: &dyn PackageDownloader,
    scanner: &dyn VulnerabilityScanner,
    publisher: &dyn ArtifactPublisher,
    name: &PackageName,
    version: &VersionSpec,
    runtime_versions: &[String],
    staging_dir: &Path,
) -> Result<ScanJobOutcome, WorkerError> {
    let artifacts = download_for_all_runtimes(downloader, name, version, runtime_versions, staging_dir).await?;

    if artifacts.is_empty() {
        let detail = "failed to download the release for every configured runtime".to_string();
        finalize(catalog, name, version, ScanStatus::DownloadError, None, Some(detail.clone())).await;
        return Err(WorkerError::DownloadFailed(detail));
    }

    finalize(catalog, name, version, ScanStatus::Downloaded, None, None).await;

    let scan_outcome = match scanner.scan(staging_dir).await {
        Ok(outcome) => outcome,
        Err(WorkerError::ScanToolFailed(detail)) => {
            finalize(catalog, name, version, ScanStatus::ScanError, None, Some(detail.clone())).await;
            return Err(WorkerError::ScanToolFailed(detail));
        }
        Err(other) => return Err(other),
    };

    if scan_outcome.vulnerable {
        finalize(catalog, name, version, ScanStatus::Vulnerable, scan_outcome.vulnerability_info, None).await;
        return Ok(ScanJobOutcome::Vulnerable);
    }

    let mut published = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        if let Err(err) = publisher.publish(artifact).await {
            tracing::error!(package = %name, version = %version, filename = %artifact.filename, error = %err, "publish failed, row stays non-terminal");
            return Err(err);
        }
        published.push(artifact.filename.clone());
    }

    finalize(catalog, name, version, ScanStatus::Completed, None, None).await;
    Ok(ScanJobOutcome::Completed { published })
}

async fn finalize(
    catalog: &Arc<dyn CatalogStore>,
    name: &PackageName,
    version: &VersionSpec,
    status: ScanStatus,
    vulnerability_info: Option<VulnerabilityInfo>,
    error_message: Option<String>,
) {
    let catalog = catalog.clone();
    let name = name.clone();
    let version = version.clone();
    let result = tokio::task::spawn_blocking(move || {
        catalog.finalize(&name, &version, status, vulnerability_info, error_message)
    })
    .await;
    match result {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::error!(error = %err, status = %status, "catalog finalize failed"),
        Err(join_err) => tracing::error!(error = %join_err, status = %status, "catalog finalize task panicked"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use gatekeeper_core::CatalogEntry;
    use gatekeeper_core::CatalogError;
    use gatekeeper_core::RuntimeVersion;

    use super::*;
    use crate::traits::ScanOutcome;

    struct FakeCatalog {
        entry: Mutex<CatalogEntry>,
    }

    impl CatalogStore for FakeCatalog {
        fn find_by_name_and_version(
            &self,
            _name: &PackageName,
            _version: Option<&VersionSpec>,
        ) -> Result<Option<CatalogEntry>, CatalogError> {
            Ok(Some(self.entry.lock().unwrap().clone()))
        }

        fn upsert_pending(
            &self,
            name: &PackageName,
            version: &VersionSpec,
            runtime_version: Option<&RuntimeVersion>,
        ) -> Result<CatalogEntry, CatalogError> {
            Ok(CatalogEntry::new_pending(name.clone(), version.clone(), runtime_version.cloned()))
        }

        fn claim(&self, _limit: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
            Ok(Vec::new())
        }

        fn finalize(
            &self,
            _name: &PackageName,
            _version: &VersionSpec,
            status: ScanStatus,
            vulnerability_info: Option<VulnerabilityInfo>,
            error_message: Option<String>,
        ) -> Result<CatalogEntry, CatalogError> {
            let mut entry = self.entry.lock().unwrap();
            entry.status = status;
            entry.vulnerability_info = vulnerability_info;
            entry.error_message = error_message;
            Ok(entry.clone())
        }

        fn count_by_status(&self) -> Result<Vec<(ScanStatus, u64)>, CatalogError> {
            Ok(Vec::new())
        }

        fn reschedule(&self, _name: &PackageName, _version: &VersionSpec) -> Result<CatalogEntry, CatalogError> {
            unimplemented!("not exercised by contract tests")
        }

        fn list_pending(&self, _limit: u32, _offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
            Ok(Vec::new())
        }

        fn list_all(&self, _limit: u32, _offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
            Ok(Vec::new())
        }
    }

    struct FakeDownloader {
        files: Vec<Option<&'static str>>,
    }

    #[async_trait::async_trait]
    impl PackageDownloader for FakeDownloader {
        async fn download(
            &self,
            _name: &PackageName,
            _version: &VersionSpec,
            runtime_version: &str,
            _staging_dir: &Path,
        ) -> Result<Option<DownloadedArtifact>, WorkerError> {
            let index: usize = runtime_version.parse().unwrap_or(0);
            Ok(self.files.get(index).copied().flatten().map(|filename| DownloadedArtifact {
                path: PathBuf::from(filename),
                filename: filename.to_string(),
            }))
        }
    }

    struct FakeScanner {
        vulnerable: bool,
    }

    #[async_trait::async_trait]
    impl VulnerabilityScanner for FakeScanner {
        async fn scan(&self, _staging_dir: &Path) -> Result<ScanOutcome, WorkerError> {
            Ok(ScanOutcome {
                vulnerable: self.vulnerable,
                vulnerability_info: self
                    .vulnerable
                    .then(|| VulnerabilityInfo::new(serde_json::json!({"cve": "CVE-2024-1234"}))),
            })
        }
    }

    struct FakePublisher {
        fail: bool,
        uploaded: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ArtifactPublisher for FakePublisher {
        async fn publish(&self, artifact: &DownloadedArtifact) -> Result<(), WorkerError> {
            if self.fail {
                return Err(WorkerError::PublishFailed("connection reset".to_string()));
            }
            self.uploaded.lock().unwrap().push(artifact.filename.clone());
            Ok(())
        }
    }

    fn fresh_entry(name: &str) -> Arc<dyn CatalogStore> {
        Arc::new(FakeCatalog {
            entry: Mutex::new(CatalogEntry::new_pending(PackageName::new(name), VersionSpec::latest(), None)),
        })
    }

    #[tokio::test]
    async fn universal_artifact_short_circuits_remaining_runtimes() {
        let catalog = fresh_entry("foo");
        let downloader = FakeDownloader { files: vec![Some("foo-1.0.0-py3-none-any.whl"), Some("should-not-be-reached.whl")] };
        let scanner = FakeScanner { vulnerable: false };
        let publisher = FakePublisher { fail: false, uploaded: Mutex::new(Vec::new()) };
        let name = PackageName::new("foo");
        let version = VersionSpec::latest();

        let outcome = run_scan_job(
            &catalog,
            &downloader,
            &scanner,
            &publisher,
            &name,
            &version,
            &["0".to_string(), "1".to_string()],
            Path::new("/tmp/staging"),
        )
        .await
        .expect("scan succeeds");

        match outcome {
            ScanJobOutcome::Completed { published } => assert_eq!(published, vec!["foo-1.0.0-py3-none-any.whl".to_string()]),
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn vulnerable_scan_does_not_publish() {
        let catalog = fresh_entry("bar");
        let downloader = FakeDownloader { files: vec![Some("bar-1.0.0-cp311-cp311-manylinux.whl")] };
        let scanner = FakeScanner { vulnerable: true };
        let publisher = FakePublisher { fail: false, uploaded: Mutex::new(Vec::new()) };
        let name = PackageName::new("bar");
        let version = VersionSpec::latest();

        let outcome = run_scan_job(
            &catalog,
            &downloader,
            &scanner,
            &publisher,
            &name,
            &version,
            &["0".to_string()],
            Path::new("/tmp/staging"),
        )
        .await
        .expect("scan succeeds");

        assert_eq!(outcome, ScanJobOutcome::Vulnerable);
        assert!(publisher.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_runtime_failing_download_is_a_download_error() {
        let catalog = fresh_entry("baz");
        let downloader = FakeDownloader { files: vec![None, None] };
        let scanner = FakeScanner { vulnerable: false };
        let publisher = FakePublisher { fail: false, uploaded: Mutex::new(Vec::new()) };
        let name = PackageName::new("baz");
        let version = VersionSpec::latest();

        let result = run_scan_job(
            &catalog,
            &downloader,
            &scanner,
            &publisher,
            &name,
            &version,
            &["0".to_string(), "1".to_string()],
            Path::new("/tmp/staging"),
        )
        .await;

        assert!(matches!(result, Err(WorkerError::DownloadFailed(_))));
    }

    #[tokio::test]
    async fn publish_failure_does_not_finalize_completed() {
        let catalog = fresh_entry("qux");
        let downloader = FakeDownloader { files: vec![Some("qux-1.0.0-py3-none-any.whl")] };
        let scanner = FakeScanner { vulnerable: false };
        let publisher = FakePublisher { fail: true, uploaded: Mutex::new(Vec::new()) };
        let name = PackageName::new("qux");
        let version = VersionSpec::latest();

        let result = run_scan_job(
            &catalog,
            &downloader,
            &scanner,
            &publisher,
            &name,
            &version,
            &["0".to_string()],
            Path::new("/tmp/staging"),
        )
        .await;

        assert!(matches!(result, Err(WorkerError::PublishFailed(_))));
    }
}
