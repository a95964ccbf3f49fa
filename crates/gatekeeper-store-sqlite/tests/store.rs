// crates/gatekeeper-store-sqlite/tests/store.rs
// ============================================================================
// Module: SQLite Catalog Store Integration Tests
// Description: Exercises the `packages` table against a scratch database
//              file per test (component A).
// ============================================================================

use gatekeeper_core::CatalogStore;
use gatekeeper_core::PackageName;
use gatekeeper_core::ScanStatus;
use gatekeeper_core::VersionSpec;
use gatekeeper_store_sqlite::SqliteCatalogStore;

fn open_scratch_store() -> (tempfile::TempDir, SqliteCatalogStore) {
    let dir = tempfile::tempdir().expect("create scratch dir");
    let path = dir.path().join("catalog.sqlite3");
    let store = SqliteCatalogStore::open(path.to_str().expect("utf8 path")).expect("open store");
    (dir, store)
}

#[test]
fn find_on_empty_catalog_returns_none() {
    let (_dir, store) = open_scratch_store();
    let name = PackageName::new("requests");
    let found = store.find_by_name_and_version(&name, None).expect("query succeeds");
    assert!(found.is_none());
}

#[test]
fn upsert_pending_is_idempotent() {
    let (_dir, store) = open_scratch_store();
    let name = PackageName::new("requests");
    let version = VersionSpec::latest();

    let first = store.upsert_pending(&name, &version, None).expect("first insert");
    let second = store.upsert_pending(&name, &version, None).expect("second insert is a no-op");

    assert_eq!(first.created_at, second.created_at);
    assert_eq!(second.status, ScanStatus::Pending);

    let counts = store.count_by_status().expect("count");
    let pending_count = counts.iter().find(|(status, _)| *status == ScanStatus::Pending).map(|(_, n)| *n);
    assert_eq!(pending_count, Some(1));
}

#[test]
fn claim_returns_oldest_pending_rows_first() {
    let (_dir, store) = open_scratch_store();
    let alpha = PackageName::new("alpha");
    let beta = PackageName::new("beta");
    let version = VersionSpec::latest();

    store.upsert_pending(&alpha, &version, None).expect("insert alpha");
    store.upsert_pending(&beta, &version, None).expect("insert beta");

    let claimed = store.claim(1).expect("claim one row");
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].name, alpha);

    let claimed_rest = store.claim(10).expect("claim remaining rows");
    assert_eq!(claimed_rest.len(), 1);
    assert_eq!(claimed_rest[0].name, beta);
}

#[test]
fn finalize_rejects_illegal_transition() {
    let (_dir, store) = open_scratch_store();
    let name = PackageName::new("requests");
    let version = VersionSpec::latest();
    store.upsert_pending(&name, &version, None).expect("insert pending");

    let result = store.finalize(&name, &version, ScanStatus::Completed, None, None);
    assert!(result.is_err(), "pending -> completed must be illegal without passing through downloaded");
}

#[test]
fn finalize_accepts_legal_transition_chain() {
    let (_dir, store) = open_scratch_store();
    let name = PackageName::new("requests");
    let version = VersionSpec::latest();
    store.upsert_pending(&name, &version, None).expect("insert pending");

    store.finalize(&name, &version, ScanStatus::Downloaded, None, None).expect("pending -> downloaded");
    let finalized =
        store.finalize(&name, &version, ScanStatus::Completed, None, None).expect("downloaded -> completed");

    assert_eq!(finalized.status, ScanStatus::Completed);
}

#[test]
fn reschedule_resets_an_error_row_to_pending() {
    let (_dir, store) = open_scratch_store();
    let name = PackageName::new("flaky-pkg");
    let version = VersionSpec::latest();
    store.upsert_pending(&name, &version, None).expect("insert pending");
    store.finalize(&name, &version, ScanStatus::NotFound, None, Some("boom".to_string())).expect("pending -> not_found");

    let rescheduled = store.reschedule(&name, &version).expect("reschedule");
    assert_eq!(rescheduled.status, ScanStatus::Pending);
    assert!(rescheduled.error_message.is_none());
}

#[test]
fn finalize_on_unknown_row_is_not_found() {
    let (_dir, store) = open_scratch_store();
    let name = PackageName::new("ghost");
    let version = VersionSpec::latest();

    let result = store.finalize(&name, &version, ScanStatus::Downloaded, None, None);
    assert!(matches!(result, Err(gatekeeper_core::CatalogError::NotFound { .. })));
}

#[test]
fn list_pending_excludes_finalized_rows() {
    let (_dir, store) = open_scratch_store();
    let pending_name = PackageName::new("pending-pkg");
    let done_name = PackageName::new("done-pkg");
    let version = VersionSpec::latest();

    store.upsert_pending(&pending_name, &version, None).expect("insert pending");
    store.upsert_pending(&done_name, &version, None).expect("insert done");
    store.finalize(&done_name, &version, ScanStatus::Downloaded, None, None).expect("advance");

    let pending_rows = store.list_pending(10, 0).expect("list pending");
    assert_eq!(pending_rows.len(), 1);
    assert_eq!(pending_rows[0].name, pending_name);

    let all_rows = store.list_all(10, 0).expect("list all");
    assert_eq!(all_rows.len(), 2);
}
