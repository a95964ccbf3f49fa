// crates/gatekeeper-core/tests/catalog.rs
// ============================================================================
// Module: Catalog Lifecycle Tests
// Description: Covers the scan lifecycle transition table from §3.
// ============================================================================

use gatekeeper_core::ScanStatus;

#[test]
fn pending_may_self_transition() {
    assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Pending));
}

#[test]
fn pending_may_advance_to_downloaded() {
    assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Downloaded));
}

#[test]
fn pending_may_fail_closed_without_download() {
    assert!(ScanStatus::Pending.can_transition_to(ScanStatus::NotFound));
    assert!(ScanStatus::Pending.can_transition_to(ScanStatus::DownloadError));
}

#[test]
fn downloaded_may_only_reach_terminal_or_scan_error() {
    assert!(ScanStatus::Downloaded.can_transition_to(ScanStatus::Completed));
    assert!(ScanStatus::Downloaded.can_transition_to(ScanStatus::Vulnerable));
    assert!(ScanStatus::Downloaded.can_transition_to(ScanStatus::ScanError));
    assert!(!ScanStatus::Downloaded.can_transition_to(ScanStatus::Pending));
}

#[test]
fn terminal_states_reject_every_transition() {
    for terminal in [ScanStatus::Completed, ScanStatus::Vulnerable] {
        for target in ScanStatus::ALL {
            assert!(!terminal.can_transition_to(target), "{terminal} -> {target} must be illegal");
        }
    }
}

#[test]
fn non_terminal_error_states_are_reschedulable() {
    assert!(ScanStatus::NotFound.is_reschedulable());
    assert!(ScanStatus::DownloadError.is_reschedulable());
    assert!(ScanStatus::ScanError.is_reschedulable());
    assert!(ScanStatus::Error.is_reschedulable());
    assert!(!ScanStatus::Pending.is_reschedulable());
    assert!(!ScanStatus::Downloaded.is_reschedulable());
}

#[test]
fn wire_names_round_trip() {
    for status in ScanStatus::ALL {
        assert_eq!(ScanStatus::parse(status.as_str()), Some(status));
    }
}
