// crates/gatekeeper-worker/src/subprocess.rs
// ============================================================================
// Module: Subprocess-Backed Worker Implementations
// Description: `PackageDownloader`/`VulnerabilityScanner` implementations
//              that shell out to `pip` and a configurable vulnerability
//              scanner (§4.H), matching `original_source/scan_package.py`.
// Purpose: The real backends a deployed `scanner-worker` binary wires up.
// Dependencies: tokio (process, fs), gatekeeper-core
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gatekeeper_core::PackageName;
use gatekeeper_core::VersionSpec;
use gatekeeper_core::VulnerabilityInfo;
use gatekeeper_core::WorkerError;
use tokio::process::Command;

use crate::artifact::DownloadedArtifact;
use crate::traits::PackageDownloader;
use crate::traits::ScanOutcome;
use crate::traits::VulnerabilityScanner;

// ============================================================================
// SECTION: Package Downloader
// ============================================================================

/// Downloads a release with `python<major>.<minor> -m pip download`, one
/// subprocess per runtime version, matching
/// `download_package_for_python_version` in `original_source/scan_package.py`.
#[derive(Debug, Clone, Default)]
pub struct SubprocessPackageDownloader;

fn major_minor(runtime_version: &str) -> String {
    runtime_version.splitn(3, '.').take(2).collect::<Vec<_>>().join(".")
}

fn package_spec(name: &PackageName, version: &VersionSpec) -> String {
    let raw = version.as_str();
    if raw.starts_with('=') || raw.starts_with('>') || raw.starts_with('<') || raw.starts_with('~') {
        format!("{name}{raw}")
    } else {
        format!("{name}=={raw}")
    }
}

#[async_trait::async_trait]
impl PackageDownloader for SubprocessPackageDownloader {
    async fn download(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        runtime_version: &str,
        staging_dir: &Path,
    ) -> Result<Option<DownloadedArtifact>, WorkerError> {
        let python_cmd = format!("python{}", major_minor(runtime_version));
        let pkg_dir = staging_dir.join(format!("packages_{runtime_version}"));
        tokio::fs::create_dir_all(&pkg_dir)
            .await
            .map_err(|err| WorkerError::DownloadFailed(format!("could not prepare staging directory: {err}")))?;

        let spec = package_spec(name, version);
        let output = Command::new(&python_cmd)
            .args(["-m", "pip", "download", &spec, "--no-deps", "-d"])
            .arg(&pkg_dir)
            .arg("--no-cache-dir")
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(runtime_version, error = %err, "python runtime unavailable, skipping");
                return Ok(None);
            }
        };

        if !output.status.success() {
            tracing::warn!(runtime_version, package = %spec, "pip download failed");
            return Ok(None);
        }

        first_downloaded_file(&pkg_dir).await
    }
}

async fn first_downloaded_file(pkg_dir: &Path) -> Result<Option<DownloadedArtifact>, WorkerError> {
    let mut entries = tokio::fs::read_dir(pkg_dir)
        .await
        .map_err(|err| WorkerError::DownloadFailed(format!("could not list staging directory: {err}")))?;
    while let Some(entry) =
        entries.next_entry().await.map_err(|err| WorkerError::DownloadFailed(err.to_string()))?
    {
        let path = entry.path();
        let is_artifact = path.extension().is_some_and(|ext| ext == "whl")
            || path.to_string_lossy().ends_with(".tar.gz");
        if is_artifact {
            return Ok(Some(DownloadedArtifact::new(path)));
        }
    }
    Ok(None)
}

// ============================================================================
// SECTION: Vulnerability Scanner
// ============================================================================

/// Runs a configurable vulnerability scanner tool (default `trivy`) over
/// the staging directory, surfacing `CRITICAL`/`HIGH` severities only,
/// matching `scan_package_vulnerabilities` in
/// `original_source/scan_package.py`.
#[derive(Debug, Clone)]
pub struct SubprocessVulnerabilityScanner {
    command: String,
}

impl SubprocessVulnerabilityScanner {
    /// Builds a scanner that invokes `command` (found on `PATH`).
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl Default for SubprocessVulnerabilityScanner {
    fn default() -> Self {
        Self::new("trivy")
    }
}

#[async_trait::async_trait]
impl VulnerabilityScanner for SubprocessVulnerabilityScanner {
    async fn scan(&self, staging_dir: &Path) -> Result<ScanOutcome, WorkerError> {
        let report_path = staging_dir.join("scan_report.json");
        let output = Command::new(&self.command)
            .args(["fs", "--exit-code", "1", "--severity", "CRITICAL,HIGH", "--format", "json", "--output"])
            .arg(&report_path)
            .arg(staging_dir)
            .output()
            .await
            .map_err(|err| WorkerError::ScanToolFailed(err.to_string()))?;

        match output.status.code() {
            Some(0) => Ok(ScanOutcome { vulnerable: false, vulnerability_info: None }),
            Some(1) => {
                let body = tokio::fs::read(&report_path)
                    .await
                    .map_err(|err| WorkerError::ScanToolFailed(format!("reading scan report: {err}")))?;
                let report: serde_json::Value = serde_json::from_slice(&body)
                    .map_err(|err| WorkerError::ScanToolFailed(format!("parsing scan report: {err}")))?;
                Ok(ScanOutcome { vulnerable: true, vulnerability_info: Some(VulnerabilityInfo::new(report)) })
            }
            other => Err(WorkerError::ScanToolFailed(format!("unexpected scanner exit status: {other:?}"))),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_minor_drops_patch_component() {
        assert_eq!(major_minor("3.11.0"), "3.11");
    }

    #[test]
    fn package_spec_uses_double_equals_for_bare_version() {
        let spec = package_spec(&PackageName::new("requests"), &VersionSpec::from_optional(Some("2.31.0")));
        assert_eq!(spec, "requests==2.31.0");
    }

    #[test]
    fn package_spec_preserves_comparator() {
        let spec = package_spec(&PackageName::new("django"), &VersionSpec::from_optional(Some(">=4.2")));
        assert_eq!(spec, "django>=4.2");
    }
}
