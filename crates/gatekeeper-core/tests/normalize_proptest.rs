// crates/gatekeeper-core/tests/normalize_proptest.rs
// ============================================================================
// Module: Normalizer Round-Trip Property
// Description: P8 from the testable properties: for every `(name, op,
//              version)` synthesizing `name{op}version`, the normalizer
//              returns `(name, v)` where `v == version` iff `op == "=="`
//              and `v == op + version` otherwise.
// ============================================================================

use gatekeeper_core::normalize::normalize_request;
use proptest::prelude::*;

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,15}"
}

fn version_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}"
}

fn op_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("=="),
        Just(">="),
        Just("<="),
        Just(">"),
        Just("<"),
        Just("~="),
    ]
}

proptest! {
    #[test]
    fn round_trips_every_operator(name in name_strategy(), op in op_strategy(), version in version_strategy()) {
        let target = format!("{name}{op}{version}");
        let result = normalize_request(&target, None);
        prop_assert_eq!(result.name.as_str(), name.to_ascii_lowercase());
        let got = result.version.expect("spec always yields a version").to_string();
        if op == "==" {
            prop_assert_eq!(got, version);
        } else {
            prop_assert_eq!(got, format!("{op}{version}"));
        }
    }
}
