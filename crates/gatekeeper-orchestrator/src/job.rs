// crates/gatekeeper-orchestrator/src/job.rs
// ============================================================================
// Module: Job Spec Builder
// Description: Builds the scanner job spec submitted to the workload
//              runner for a claimed catalog row (§4.F, §4.G).
// Purpose: Give every scanner job a unique, predictable name and the
//          environment the worker contract (§4.H) needs.
// Dependencies: gatekeeper-core
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use gatekeeper_core::CatalogEntry;
use gatekeeper_core::JobSpec;

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Lowercases and replaces every byte outside `[a-z0-9-]` with `-`, so a
/// package name or version is safe to embed in a job name.
#[must_use]
pub fn sanitize_job_name_component(raw: &str) -> String {
    raw.to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

// ============================================================================
// SECTION: Job Spec
// ============================================================================

/// Builds the job spec for `entry`, per the naming convention
/// `scanner-<sanitized-name>-<sanitized-version>-py<runtime>-<unix-seconds>`
/// (§4.F).
#[must_use]
pub fn build_job_spec(
    entry: &CatalogEntry,
    scanner_image: &str,
    database_url: &str,
    pypi_server_url: &str,
    runtime_versions: &[String],
    job_timeout_seconds: u64,
) -> JobSpec {
    let runtime_tag = entry.runtime_version.as_ref().map_or_else(|| "na".to_string(), |v| sanitize_job_name_component(v.as_str()));
    let unix_seconds = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let job_name = format!(
        "scanner-{}-{}-py{}-{}",
        sanitize_job_name_component(entry.name.as_str()),
        sanitize_job_name_component(entry.version.as_str()),
        runtime_tag,
        unix_seconds
    );
    let env = vec![
        ("PACKAGE_NAME".to_string(), format!("{}=={}", entry.name, entry.version)),
        ("PYPI_SERVER_URL".to_string(), pypi_server_url.to_string()),
        ("DATABASE_URL".to_string(), database_url.to_string()),
        ("RUNTIME_VERSIONS".to_string(), runtime_versions.join(" ")),
    ];
    JobSpec {
        job_name,
        image: scanner_image.to_string(),
        command_args: vec!["scan".to_string()],
        env,
        timeout_seconds: job_timeout_seconds,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use gatekeeper_core::PackageName;
    use gatekeeper_core::RuntimeVersion;
    use gatekeeper_core::VersionSpec;

    use super::*;

    #[test]
    fn sanitize_replaces_disallowed_bytes() {
        assert_eq!(sanitize_job_name_component("Requests[Security]"), "requests-security-");
        assert_eq!(sanitize_job_name_component(">=1.20.0"), "--1-20-0");
    }

    #[test]
    fn job_name_includes_runtime_and_is_lowercase() {
        let entry = CatalogEntry::new_pending(
            PackageName::new("Requests"),
            VersionSpec::from_optional(Some("2.31.0")),
            Some(RuntimeVersion::new("3.11.0")),
        );
        let spec = build_job_spec(&entry, "scanner:latest", "sqlite:///tmp/x.db", "http://index", &["3.11.0".to_string()], 3600);
        assert!(spec.job_name.starts_with("scanner-requests-2-31-0-py3-11-0-"));
        assert_eq!(spec.image, "scanner:latest");
        assert!(spec.env.iter().any(|(k, v)| k == "PACKAGE_NAME" && v == "requests==2.31.0"));
    }

    #[test]
    fn job_name_uses_na_when_runtime_unknown() {
        let entry =
            CatalogEntry::new_pending(PackageName::new("foo"), VersionSpec::latest(), None);
        let spec = build_job_spec(&entry, "scanner:latest", "sqlite:///tmp/x.db", "http://index", &[], 3600);
        assert!(spec.job_name.starts_with("scanner-foo-latest-pyna-"));
    }
}
