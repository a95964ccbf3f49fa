// crates/gatekeeper-core/src/normalize.rs
// ============================================================================
// Module: Request Normalizer
// Description: Parses the Simple-Index request target and installer
//              User-Agent into `(name, version?, runtime_version?)`.
// Purpose: Give the Gate a single, deterministic view of "what was asked
//          for" regardless of how the installer phrased it.
// Dependencies: regex, crate::catalog
// ============================================================================

//! ## Overview
//! Normalization is best-effort: ambiguous input never produces a
//! user-surfaced parse error (`InvalidSpec` in §7), it flows through with
//! `version = None`. There is exactly one entry point, [`normalize_request`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::PackageName;
use crate::catalog::RuntimeVersion;
use crate::catalog::VersionSpec;

// ============================================================================
// SECTION: Normalized Request
// ============================================================================

/// The result of normalizing an installer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    /// Normalized package name with extras and version specifier stripped.
    pub name: PackageName,
    /// Version spec derived from the request target, if any was present.
    pub version: Option<VersionSpec>,
    /// Runtime interpreter version extracted from the User-Agent, if found.
    pub runtime_version: Option<RuntimeVersion>,
}

// ============================================================================
// SECTION: Regex Cache
// ============================================================================

fn extras_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("static regex is valid"))
}

fn spec_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>[A-Za-z0-9_.-]+)(?P<op>==|>=|<=|~=|>|<)(?P<version>.+)$")
            .expect("static regex is valid")
    })
}

fn python_user_agent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:CPython|Python)/(\d+\.\d+\.\d+)").expect("static regex is valid")
    })
}

fn bare_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("static regex is valid"))
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes a raw request target and installer User-Agent.
///
/// Rules (§4.C):
/// - Bracketed extras (`requests[security]`) are stripped before parsing.
/// - `==` yields a bare version; `>=`, `<=`, `>`, `<`, `~=` yield
///   `<op><version>` verbatim.
/// - The runtime version is the first `(?:CPython|Python)/(\d+\.\d+\.\d+)`
///   match in the User-Agent, else the first bare `\d+\.\d+\.\d+`
///   substring, else absent.
/// - Empty input yields an empty name and no version.
#[must_use]
pub fn normalize_request(raw_target: &str, user_agent: Option<&str>) -> NormalizedRequest {
    let without_extras = extras_pattern().replace_all(raw_target.trim(), "");
    let (name, version) = split_name_and_version(&without_extras);
    let runtime_version = user_agent.and_then(parse_runtime_version);
    NormalizedRequest {
        name: PackageName::new(&name),
        version,
        runtime_version,
    }
}

/// Splits a (possibly spec-qualified) package name into a bare name and an
/// optional version spec.
fn split_name_and_version(target: &str) -> (String, Option<VersionSpec>) {
    if target.is_empty() {
        return (String::new(), None);
    }
    let Some(captures) = spec_pattern().captures(target) else {
        return (target.to_string(), None);
    };
    let name = captures["name"].to_string();
    let op = &captures["op"];
    let version = captures["version"].trim();
    let spec = if op == "==" {
        VersionSpec::from_optional(Some(version))
    } else {
        VersionSpec::from_optional(Some(&format!("{op}{version}")))
    };
    (name, Some(spec))
}

/// Extracts the runtime interpreter version from an installer User-Agent.
#[must_use]
pub fn parse_runtime_version(user_agent: &str) -> Option<RuntimeVersion> {
    if user_agent.is_empty() {
        return None;
    }
    python_user_agent_pattern()
        .captures(user_agent)
        .or_else(|| bare_version_pattern().captures(user_agent))
        .map(|captures| {
            let matched = captures.get(1).unwrap_or_else(|| captures.get(0).expect("match exists"));
            RuntimeVersion::new(matched.as_str())
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_extras() {
        let result = normalize_request("requests[security]", None);
        assert_eq!(result.name.as_str(), "requests");
        assert_eq!(result.version, None);
    }

    #[test]
    fn exact_version_is_bare() {
        let result = normalize_request("numpy==1.20.0", None);
        assert_eq!(result.name.as_str(), "numpy");
        assert_eq!(result.version.unwrap().as_str(), "1.20.0");
    }

    #[test]
    fn inexact_version_keeps_operator() {
        let result = normalize_request("numpy>=1.20.0", None);
        assert_eq!(result.version.unwrap().as_str(), ">=1.20.0");
    }

    #[test]
    fn extras_and_version_combine() {
        let result = normalize_request("requests[security]==2.31.0", None);
        assert_eq!(result.name.as_str(), "requests");
        assert_eq!(result.version.unwrap().as_str(), "2.31.0");
    }

    #[test]
    fn empty_input_yields_empty_name() {
        let result = normalize_request("", None);
        assert_eq!(result.name.as_str(), "");
        assert_eq!(result.version, None);
    }

    #[test]
    fn runtime_version_prefers_cpython_marker() {
        let ua = "pip/23.0.1 CPython/3.11.0";
        assert_eq!(parse_runtime_version(ua).unwrap().as_str(), "3.11.0");
    }

    #[test]
    fn runtime_version_falls_back_to_bare_digits() {
        let ua = "some-client/3.8.5 (metadata)";
        assert_eq!(parse_runtime_version(ua).unwrap().as_str(), "3.8.5");
    }

    #[test]
    fn runtime_version_absent_when_no_digits() {
        let ua = "pip/23.1.2 {\"ci\":null}";
        assert_eq!(parse_runtime_version(ua), None);
    }

    #[test]
    fn tilde_equal_operator_is_preserved() {
        let result = normalize_request("django~=4.2", None);
        assert_eq!(result.version.unwrap().as_str(), "~=4.2");
    }
}
