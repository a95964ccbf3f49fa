// crates/gatekeeper-cli/src/commands/scan.rs
// ============================================================================
// Module: Scan Command
// Description: Runs the scanner worker contract for one package spec (§4.H).
// Purpose: The entry point a deployed scanner job container runs, matching
//          `original_source/scan_package.py`'s `main()`: a `name==version`
//          spec from the command line or the `PACKAGE_NAME` environment
//          variable.
// Dependencies: gatekeeper-config, gatekeeper-core, gatekeeper-worker,
//               gatekeeper-store-sqlite, tempfile
// ============================================================================

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use gatekeeper_config::WorkerConfig;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::PackageName;
use gatekeeper_core::VersionSpec;
use gatekeeper_store_sqlite::SqliteCatalogStore;
use gatekeeper_worker::HttpArtifactPublisher;
use gatekeeper_worker::ScanJobOutcome;
use gatekeeper_worker::SubprocessPackageDownloader;
use gatekeeper_worker::SubprocessVulnerabilityScanner;
use gatekeeper_worker::run_scan_job;

/// A malformed `name==version` package spec.
#[derive(Debug)]
struct InvalidPackageSpec(String);

impl fmt::Display for InvalidPackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid package spec {:?}, expected name==version", self.0)
    }
}

impl Error for InvalidPackageSpec {}

/// Splits a `name==version` spec, matching `parse_package_spec` in
/// `original_source/scan_package.py`.
fn parse_package_spec(spec: &str) -> Result<(PackageName, VersionSpec), InvalidPackageSpec> {
    let Some((name, version)) = spec.split_once("==") else {
        return Err(InvalidPackageSpec(spec.to_string()));
    };
    let name = name.trim();
    let version = version.trim();
    if name.is_empty() || version.is_empty() {
        return Err(InvalidPackageSpec(spec.to_string()));
    }
    Ok((PackageName::new(name), VersionSpec::from_optional(Some(version))))
}

pub(crate) async fn run(package: Option<String>) -> Result<(), Box<dyn Error>> {
    let spec = package
        .or_else(|| std::env::var("PACKAGE_NAME").ok())
        .ok_or("no package spec given: pass it as an argument or set PACKAGE_NAME")?;
    let (name, version) = parse_package_spec(&spec)?;

    let config = WorkerConfig::from_env()?;
    tracing::info!(package = %name, version = %version, "starting scan job");

    let catalog: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::open(&config.database_url)?);
    let downloader = SubprocessPackageDownloader;
    let scanner = SubprocessVulnerabilityScanner::default();
    let publisher =
        HttpArtifactPublisher::new(config.pypi_server_url.clone(), config.pypi_username.clone(), config.pypi_password.clone())?;

    let staging_dir = tempfile::tempdir()?;

    let outcome = run_scan_job(
        &catalog,
        &downloader,
        &scanner,
        &publisher,
        &name,
        &version,
        &config.runtime_versions,
        staging_dir.path(),
    )
    .await?;

    match outcome {
        ScanJobOutcome::Completed { published } => {
            tracing::info!(package = %name, version = %version, published = published.len(), "scan job completed");
        }
        ScanJobOutcome::Vulnerable => {
            tracing::warn!(package = %name, version = %version, "scan job found a vulnerability, not published");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_version() {
        let (name, version) = parse_package_spec("requests==2.31.0").expect("valid spec");
        assert_eq!(name.as_str(), "requests");
        assert_eq!(version.as_str(), "2.31.0");
    }

    #[test]
    fn trims_whitespace_around_both_parts() {
        let (name, version) = parse_package_spec(" requests == 2.31.0 ").expect("valid spec");
        assert_eq!(name.as_str(), "requests");
        assert_eq!(version.as_str(), "2.31.0");
    }

    #[test]
    fn rejects_spec_with_no_separator() {
        assert!(parse_package_spec("requests").is_err());
    }

    #[test]
    fn rejects_spec_with_empty_name_or_version() {
        assert!(parse_package_spec("==2.31.0").is_err());
        assert!(parse_package_spec("requests==").is_err());
    }
}
