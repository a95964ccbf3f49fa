// crates/gatekeeper-core/src/catalog.rs
// ============================================================================
// Module: Catalog Data Model
// Description: The `(name, version)` scan-lifecycle row and its fields.
// Purpose: Define the durable state every Gate decision and scan job reads
//          and writes.
// Dependencies: serde, serde_json, crate::timestamp
// ============================================================================

//! ## Overview
//! A [`CatalogEntry`] is one row per `(name, version)`. Its `status` walks a
//! fixed lifecycle: `pending -> downloaded -> {completed, vulnerable,
//! scan_error}` or `pending -> {not_found, download_error}`. `completed` and
//! `vulnerable` are terminal; every other status is treated as "unknown" by
//! the Gate and re-scheduled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::timestamp::Timestamp;

// ============================================================================
// SECTION: Package Identity
// ============================================================================

/// Normalized package identifier.
///
/// # Invariants
/// - Always lower-cased; comparisons and hashing are case-insensitive by
///   construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Builds a normalized package name from raw installer input.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    /// Returns the normalized name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The token used for a catalog row whose installer did not pin a version.
pub const LATEST: &str = "latest";

/// The literal requested version, `latest` when unpinned, or a
/// comparator-prefixed string (`>=1.20.0`) for an inexact specifier.
///
/// # Invariants
/// - Never empty; an absent version normalizes to [`LATEST`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSpec(String);

impl VersionSpec {
    /// Normalizes an optional installer-supplied version string.
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => Self(value.to_string()),
            None => Self::latest(),
        }
    }

    /// The `latest` sentinel, used when the installer did not pin a version.
    #[must_use]
    pub fn latest() -> Self {
        Self(LATEST.to_string())
    }

    /// Returns true when this spec is the unpinned `latest` sentinel.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.0 == LATEST
    }

    /// Returns the version spec as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime interpreter version extracted from the installer's User-Agent
/// (for example `3.11.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeVersion(String);

impl RuntimeVersion {
    /// Wraps a raw runtime version string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the runtime version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Scan Lifecycle
// ============================================================================

/// The scan lifecycle status of a catalog row.
///
/// # Invariants
/// - `Completed` and `Vulnerable` are terminal; every other variant is
///   treated as "unknown" by the Gate and re-scheduled via `UpsertPending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Claimed or created, awaiting a scanner job.
    Pending,
    /// A scanner job has downloaded the artifact(s) and is scanning.
    Downloaded,
    /// Scan finished clean; artifact(s) published to the internal index.
    Completed,
    /// Scan found a `CRITICAL` or `HIGH` severity vulnerability.
    Vulnerable,
    /// The package or version does not exist upstream.
    NotFound,
    /// Every configured runtime failed to download the release.
    DownloadError,
    /// The vulnerability scanner tool itself failed.
    ScanError,
    /// An unclassified error occurred during the scan job.
    Error,
}

impl ScanStatus {
    /// Returns true when this status is a terminal outcome of the scan
    /// lifecycle (`completed` or `vulnerable`).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Vulnerable)
    }

    /// Returns true when a Gate encountering this status should treat the
    /// row as "unknown" and re-schedule it via `UpsertPending`.
    #[must_use]
    pub const fn is_reschedulable(self) -> bool {
        matches!(self, Self::NotFound | Self::DownloadError | Self::ScanError | Self::Error)
    }

    /// Returns true when a transition from `self` to `next` is legal per the
    /// scan lifecycle (§3: `pending -> downloaded -> {completed, vulnerable,
    /// scan_error}`, or `pending -> {not_found, download_error}`).
    ///
    /// `pending -> pending` is a legal no-op used by the Orchestrator's
    /// claim step to bump `updated_at`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Pending | Self::Downloaded | Self::NotFound | Self::DownloadError
            ),
            Self::Downloaded => {
                matches!(next, Self::Completed | Self::Vulnerable | Self::ScanError)
            }
            Self::Completed
            | Self::Vulnerable
            | Self::NotFound
            | Self::DownloadError
            | Self::ScanError
            | Self::Error => false,
        }
    }

    /// Returns the lowercase wire name used in storage and admin JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloaded => "downloaded",
            Self::Completed => "completed",
            Self::Vulnerable => "vulnerable",
            Self::NotFound => "not_found",
            Self::DownloadError => "download_error",
            Self::ScanError => "scan_error",
            Self::Error => "error",
        }
    }

    /// Parses a status from its wire name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "pending" => Self::Pending,
            "downloaded" => Self::Downloaded,
            "completed" => Self::Completed,
            "vulnerable" => Self::Vulnerable,
            "not_found" => Self::NotFound,
            "download_error" => Self::DownloadError,
            "scan_error" => Self::ScanError,
            "error" => Self::Error,
            _ => return None,
        })
    }

    /// All variants, in the order rows typically progress through them.
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::Downloaded,
        Self::Completed,
        Self::Vulnerable,
        Self::NotFound,
        Self::DownloadError,
        Self::ScanError,
        Self::Error,
    ];
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Vulnerability Info
// ============================================================================

/// Structured scanner output, populated iff `status = vulnerable`.
///
/// Stored as opaque JSON: the scanner tool's report shape (for example a map
/// of CVE identifier to severity/description) is not interpreted by the
/// core, only passed through to the 403 problem+json body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VulnerabilityInfo(Value);

impl VulnerabilityInfo {
    /// Wraps a raw JSON scanner report.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the wrapped JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the wrapper, returning the wrapped JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

// ============================================================================
// SECTION: Catalog Entry
// ============================================================================

/// One row of the catalog: the scan lifecycle state of a `(name, version)`
/// pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Normalized package identifier.
    pub name: PackageName,
    /// Requested version, `latest`, or a comparator-prefixed string.
    pub version: VersionSpec,
    /// Runtime interpreter version of the first installer that asked.
    pub runtime_version: Option<RuntimeVersion>,
    /// Current scan lifecycle status.
    pub status: ScanStatus,
    /// Structured scanner output; set iff `status = vulnerable`.
    pub vulnerability_info: Option<VulnerabilityInfo>,
    /// Short diagnostic message for operator debugging.
    pub error_message: Option<String>,
    /// Row creation time.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl CatalogEntry {
    /// Builds a fresh `pending` row at the current time.
    #[must_use]
    pub fn new_pending(
        name: PackageName,
        version: VersionSpec,
        runtime_version: Option<RuntimeVersion>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            name,
            version,
            runtime_version,
            status: ScanStatus::Pending,
            vulnerability_info: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
