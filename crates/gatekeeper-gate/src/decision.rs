// crates/gatekeeper-gate/src/decision.rs
// ============================================================================
// Module: Gate Decision Algorithm
// Description: The five-step security decision the Gate makes per request
//              (component D).
// Purpose: Decide, for a normalized `(name, version, runtime_version)`,
//          whether to proxy, block, or ask the installer to wait.
// Dependencies: gatekeeper-core, gatekeeper-config, tokio
// ============================================================================

//! ## Overview
//! Request normalization (done by the caller via
//! [`gatekeeper_core::normalize_request`] before calling [`decide`]) precedes
//! the five-step algorithm implemented here:
//!
//! 1. Probe the internal index for the package *name*.
//! 2. If present, proxy the real listing straight through. This is the
//!    happy path for any name that has ever had a release published, and it
//!    never touches the catalog, regardless of which version was requested
//!    or what that version's catalog row (if any) holds.
//! 3. Otherwise look up the `(name, version)` row in the catalog.
//! 4. Case analysis on that row: absent creates a `pending` row and answers
//!    `503`; `vulnerable` blocks with `403`; `completed` re-probes upstream
//!    once (covering eventual-consistency lag between the `Finalize` commit
//!    and the index being queryable) before proxying; anything else
//!    non-terminal means a scan is already in flight (`503` with
//!    `Retry-After`); a reschedulable error status (`not_found`,
//!    `download_error`, `scan_error`, `error`) is treated as "unknown" and
//!    given a fresh pass through the scanner.
//!
//! Step 5 (any unexpected failure in steps 1-4 becomes `500 Internal`) is
//! expressed by [`decide`]'s `Result` return type: callers that see
//! `Err(GateError::Internal(_))` or a catalog-unavailable error respond
//! `500`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use gatekeeper_config::PENDING_RETRY_AFTER_SECONDS;
use gatekeeper_core::CatalogEntry;
use gatekeeper_core::CatalogError;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::CatalogUnavailable;
use gatekeeper_core::GateError;
use gatekeeper_core::IndexClient;
use gatekeeper_core::PackageName;
use gatekeeper_core::ProbeOutcome;
use gatekeeper_core::RuntimeVersion;
use gatekeeper_core::ScanStatus;
use gatekeeper_core::VersionSpec;
use gatekeeper_core::VulnerabilityInfo;

// ============================================================================
// SECTION: Decision Outcome
// ============================================================================

/// The Gate's decision for a single request.
#[derive(Debug)]
pub enum GateDecision {
    /// The package is known-clean; serve the real artifact listing.
    Proxy {
        /// Response body, passed through verbatim.
        body: Vec<u8>,
        /// `Content-Type` header value, if present.
        content_type: Option<String>,
    },
    /// The package is known-vulnerable; block the request.
    Blocked {
        /// Structured scanner output, when available.
        vulnerability_info: Option<VulnerabilityInfo>,
    },
    /// A scan is in flight (or was just scheduled); ask the installer to
    /// retry later.
    Pending {
        /// Seconds the installer should wait before retrying.
        retry_after_seconds: u32,
    },
}

// ============================================================================
// SECTION: Decision Algorithm
// ============================================================================

/// Decides the outcome for a normalized package request.
///
/// # Errors
///
/// Returns [`GateError`] when the catalog cannot be reached or an
/// unexpected internal failure occurs; both surface as `500 Internal`.
pub async fn decide(
    catalog: &Arc<dyn CatalogStore>,
    index: &Arc<dyn IndexClient>,
    name: &PackageName,
    version: Option<&VersionSpec>,
    runtime_version: Option<&RuntimeVersion>,
) -> Result<GateDecision, GateError> {
    // Step 1-2: a package name that already has any published release
    // bypasses the catalog entirely, regardless of which version was
    // requested or what the catalog holds for it.
    match index.probe(name).await {
        Ok(ProbeOutcome::Present { body, content_type }) => {
            return Ok(GateDecision::Proxy { body, content_type });
        }
        Ok(ProbeOutcome::Absent) => {}
        Err(err) => {
            tracing::warn!(package = %name, error = %err, "upstream probe failed, treating as absent");
        }
    }

    // Step 3-4: upstream has no record under this name. Catalog state now
    // drives the decision.
    let existing = find_entry(catalog, name, version).await.map_err(to_gate_error)?;

    match existing {
        None => {
            let version = version.cloned().unwrap_or_else(VersionSpec::latest);
            upsert_pending(catalog, name, &version, runtime_version).await.map_err(to_gate_error)?;
            Ok(GateDecision::Pending { retry_after_seconds: PENDING_RETRY_AFTER_SECONDS })
        }
        Some(entry) => match entry.status {
            ScanStatus::Vulnerable => {
                Ok(GateDecision::Blocked { vulnerability_info: entry.vulnerability_info })
            }
            ScanStatus::Completed => decide_proxy(index, name).await,
            _ if entry.status.is_reschedulable() => {
                reschedule(catalog, name, &entry.version).await.map_err(to_gate_error)?;
                Ok(GateDecision::Pending { retry_after_seconds: PENDING_RETRY_AFTER_SECONDS })
            }
            _ => Ok(GateDecision::Pending { retry_after_seconds: PENDING_RETRY_AFTER_SECONDS }),
        },
    }
}

async fn decide_proxy(index: &Arc<dyn IndexClient>, name: &PackageName) -> Result<GateDecision, GateError> {
    match index.probe(name).await {
        Ok(ProbeOutcome::Present { body, content_type }) => Ok(GateDecision::Proxy { body, content_type }),
        Ok(ProbeOutcome::Absent) => {
            // §4.D step 4: a `completed` row commits to 200 regardless of
            // what the re-probe finds ("otherwise re-probe once before
            // committing") — no row status authorizes any response outside
            // {200, 403, 503, 500} (P1).
            tracing::warn!(package = %name, "catalog marked package completed but upstream has no record, proxying empty body");
            Ok(GateDecision::Proxy { body: Vec::new(), content_type: None })
        }
        Err(err) => {
            // §4.B: a TransportError is treated as absent for decision
            // purposes and merely logged, even on this re-probe.
            tracing::warn!(package = %name, error = %err, "completed-row re-probe failed, committing to 200 anyway");
            Ok(GateDecision::Proxy { body: Vec::new(), content_type: None })
        }
    }
}

// ============================================================================
// SECTION: Blocking Catalog Bridge
// ============================================================================

async fn find_entry(
    catalog: &Arc<dyn CatalogStore>,
    name: &PackageName,
    version: Option<&VersionSpec>,
) -> Result<Option<CatalogEntry>, CatalogError> {
    let catalog = catalog.clone();
    let name = name.clone();
    let version = version.cloned();
    run_blocking(move || catalog.find_by_name_and_version(&name, version.as_ref())).await
}

async fn upsert_pending(
    catalog: &Arc<dyn CatalogStore>,
    name: &PackageName,
    version: &VersionSpec,
    runtime_version: Option<&RuntimeVersion>,
) -> Result<CatalogEntry, CatalogError> {
    let catalog = catalog.clone();
    let name = name.clone();
    let version = version.clone();
    let runtime_version = runtime_version.cloned();
    run_blocking(move || catalog.upsert_pending(&name, &version, runtime_version.as_ref())).await
}

async fn reschedule(
    catalog: &Arc<dyn CatalogStore>,
    name: &PackageName,
    version: &VersionSpec,
) -> Result<CatalogEntry, CatalogError> {
    let catalog = catalog.clone();
    let name = name.clone();
    let version = version.clone();
    run_blocking(move || catalog.reschedule(&name, &version)).await
}

async fn run_blocking<T, F>(f: F) -> Result<T, CatalogError>
where
    F: FnOnce() -> Result<T, CatalogError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_err) => Err(CatalogError::Connectivity(join_err.to_string())),
    }
}

fn to_gate_error(err: CatalogError) -> GateError {
    if err.is_transient() {
        GateError::from(CatalogUnavailable(err.to_string()))
    } else {
        GateError::Internal(err.to_string())
    }
}
