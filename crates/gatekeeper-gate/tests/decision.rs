// crates/gatekeeper-gate/tests/decision.rs
// ============================================================================
// Module: Gate Decision Tests
// Description: Exercises `decide` against in-memory fakes for the catalog
//              and upstream index (component D).
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use gatekeeper_core::ArtifactOutcome;
use gatekeeper_core::CatalogEntry;
use gatekeeper_core::CatalogError;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::IndexClient;
use gatekeeper_core::PackageName;
use gatekeeper_core::ProbeOutcome;
use gatekeeper_core::RuntimeVersion;
use gatekeeper_core::ScanStatus;
use gatekeeper_core::UpstreamError;
use gatekeeper_core::VersionSpec;
use gatekeeper_core::VulnerabilityInfo;
use gatekeeper_gate::GateDecision;
use gatekeeper_gate::decide;

#[derive(Default)]
struct FakeCatalog {
    rows: Mutex<HashMap<(String, String), CatalogEntry>>,
}

impl FakeCatalog {
    fn seed(entry: CatalogEntry) -> Arc<Self> {
        let store = Self::default();
        store.rows.lock().unwrap().insert(
            (entry.name.as_str().to_string(), entry.version.as_str().to_string()),
            entry,
        );
        Arc::new(store)
    }
}

impl CatalogStore for FakeCatalog {
    fn find_by_name_and_version(
        &self,
        name: &PackageName,
        version: Option<&VersionSpec>,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        let version_str = version.map_or_else(|| VersionSpec::latest().as_str().to_string(), |v| v.as_str().to_string());
        Ok(self.rows.lock().unwrap().get(&(name.as_str().to_string(), version_str)).cloned())
    }

    fn upsert_pending(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        runtime_version: Option<&RuntimeVersion>,
    ) -> Result<CatalogEntry, CatalogError> {
        let key = (name.as_str().to_string(), version.as_str().to_string());
        let mut rows = self.rows.lock().unwrap();
        let entry = rows
            .entry(key)
            .or_insert_with(|| CatalogEntry::new_pending(name.clone(), version.clone(), runtime_version.cloned()))
            .clone();
        Ok(entry)
    }

    fn claim(&self, _limit: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(Vec::new())
    }

    fn finalize(
        &self,
        _name: &PackageName,
        _version: &VersionSpec,
        _status: ScanStatus,
        _vulnerability_info: Option<VulnerabilityInfo>,
        _error_message: Option<String>,
    ) -> Result<CatalogEntry, CatalogError> {
        unimplemented!("not exercised by decision tests")
    }

    fn count_by_status(&self) -> Result<Vec<(ScanStatus, u64)>, CatalogError> {
        Ok(Vec::new())
    }

    fn reschedule(&self, name: &PackageName, version: &VersionSpec) -> Result<CatalogEntry, CatalogError> {
        let key = (name.as_str().to_string(), version.as_str().to_string());
        let mut rows = self.rows.lock().unwrap();
        let entry = rows.get_mut(&key).ok_or_else(|| CatalogError::NotFound {
            name: name.as_str().to_string(),
            version: version.as_str().to_string(),
        })?;
        entry.status = ScanStatus::Pending;
        entry.error_message = None;
        Ok(entry.clone())
    }

    fn list_pending(&self, _limit: u32, _offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(Vec::new())
    }

    fn list_all(&self, _limit: u32, _offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(Vec::new())
    }
}

enum FakeProbe {
    Absent,
    Present(Vec<u8>),
    Failing,
}

struct FakeIndex {
    probe: FakeProbe,
}

#[async_trait::async_trait]
impl IndexClient for FakeIndex {
    async fn probe(&self, _name: &PackageName) -> Result<ProbeOutcome, UpstreamError> {
        match &self.probe {
            FakeProbe::Absent => Ok(ProbeOutcome::Absent),
            FakeProbe::Present(body) => Ok(ProbeOutcome::Present { body: body.clone(), content_type: None }),
            FakeProbe::Failing => Err(UpstreamError::Transport("connection refused".to_string())),
        }
    }

    async fn stream_artifact(&self, _path: &str) -> Result<Option<ArtifactOutcome>, UpstreamError> {
        Ok(None)
    }

    async fn list_index(&self) -> Result<ProbeOutcome, UpstreamError> {
        Ok(ProbeOutcome::Absent)
    }
}

#[tokio::test]
async fn package_present_upstream_bypasses_the_catalog_entirely() {
    // A name with any published release proxies straight through on the
    // step 1-2 happy path, even with no catalog row for this exact version.
    // The catalog is never consulted and no row gets created.
    let catalog: Arc<dyn CatalogStore> = Arc::new(FakeCatalog::default());
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Present(b"<html></html>".to_vec()) });
    let name = PackageName::new("requests");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    match decision {
        GateDecision::Proxy { body, .. } => assert_eq!(body, b"<html></html>"),
        other => panic!("expected proxy decision, got {other:?}"),
    }

    let stored = catalog.find_by_name_and_version(&name, None).unwrap();
    assert!(stored.is_none(), "no catalog row should be created on the probe-present fast path");
}

#[tokio::test]
async fn unknown_package_absent_upstream_schedules_a_scan() {
    let catalog: Arc<dyn CatalogStore> = Arc::new(FakeCatalog::default());
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Absent });
    let name = PackageName::new("newpkg");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    assert!(matches!(decision, GateDecision::Pending { .. }));

    let stored = catalog.find_by_name_and_version(&name, None).unwrap().expect("row created");
    assert_eq!(stored.status, ScanStatus::Pending);
}

#[tokio::test]
async fn completed_package_proxies_upstream() {
    let entry = {
        let mut entry =
            CatalogEntry::new_pending(PackageName::new("requests"), VersionSpec::latest(), None);
        entry.status = ScanStatus::Completed;
        entry
    };
    let catalog: Arc<dyn CatalogStore> = FakeCatalog::seed(entry);
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Present(b"ok".to_vec()) });
    let name = PackageName::new("requests");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    match decision {
        GateDecision::Proxy { body, .. } => assert_eq!(body, b"ok"),
        other => panic!("expected proxy decision, got {other:?}"),
    }
}

#[tokio::test]
async fn vulnerable_package_is_blocked() {
    let entry = {
        let mut entry =
            CatalogEntry::new_pending(PackageName::new("leftpad-evil"), VersionSpec::latest(), None);
        entry.status = ScanStatus::Vulnerable;
        entry.vulnerability_info = Some(VulnerabilityInfo::new(serde_json::json!({"cve": "CVE-2024-0000"})));
        entry
    };
    let catalog: Arc<dyn CatalogStore> = FakeCatalog::seed(entry);
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Absent });
    let name = PackageName::new("leftpad-evil");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    assert!(matches!(decision, GateDecision::Blocked { vulnerability_info: Some(_) }));
}

#[tokio::test]
async fn reschedulable_error_row_is_reset_to_pending() {
    let entry = {
        let mut entry =
            CatalogEntry::new_pending(PackageName::new("flaky"), VersionSpec::latest(), None);
        entry.status = ScanStatus::DownloadError;
        entry.error_message = Some("timed out".to_string());
        entry
    };
    let catalog: Arc<dyn CatalogStore> = FakeCatalog::seed(entry);
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Absent });
    let name = PackageName::new("flaky");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    assert!(matches!(decision, GateDecision::Pending { .. }));

    let stored = catalog.find_by_name_and_version(&name, None).unwrap().expect("row still present");
    assert_eq!(stored.status, ScanStatus::Pending);
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn pending_row_asks_installer_to_wait() {
    let entry = CatalogEntry::new_pending(PackageName::new("midscan"), VersionSpec::latest(), None);
    let catalog: Arc<dyn CatalogStore> = FakeCatalog::seed(entry);
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Absent });
    let name = PackageName::new("midscan");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    assert!(matches!(decision, GateDecision::Pending { .. }));
}

#[tokio::test]
async fn completed_package_reprobe_failure_still_commits_to_200() {
    // §4.D step 4 / P1: a `completed` row commits to 200 regardless of what
    // the re-probe finds ("otherwise re-probe once before committing") —
    // no row status authorizes a response outside {200, 403, 503, 500}.
    let entry = {
        let mut entry =
            CatalogEntry::new_pending(PackageName::new("requests"), VersionSpec::latest(), None);
        entry.status = ScanStatus::Completed;
        entry
    };
    let catalog: Arc<dyn CatalogStore> = FakeCatalog::seed(entry);
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Failing });
    let name = PackageName::new("requests");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    assert!(matches!(decision, GateDecision::Proxy { .. }));
}

#[tokio::test]
async fn upstream_probe_failure_on_unknown_package_is_treated_as_absent() {
    let catalog: Arc<dyn CatalogStore> = Arc::new(FakeCatalog::default());
    let index: Arc<dyn IndexClient> = Arc::new(FakeIndex { probe: FakeProbe::Failing });
    let name = PackageName::new("unreachable");

    let decision = decide(&catalog, &index, &name, None, None).await.expect("decide succeeds");
    assert!(matches!(decision, GateDecision::Pending { .. }));
}
