// crates/gatekeeper-core/src/problem.rs
// ============================================================================
// Module: Problem Details
// Description: RFC 9457 problem+json payload shape (component E).
// Purpose: Give the 403 and 503 response bodies one byte-exact shape.
// Dependencies: serde, serde_json
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Problem Details
// ============================================================================

/// An RFC 9457 `application/problem+json` document.
///
/// # Invariants
/// - `type_uri`, `title`, `status`, `detail`, and `instance` are always
///   present; extension members (for example `vulnerabilities`) are
///   flattened alongside them.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    /// A URI identifying the problem type.
    #[serde(rename = "type")]
    pub type_uri: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence.
    pub detail: String,
    /// A URI reference identifying the specific occurrence.
    pub instance: String,
    /// Extension members beyond the core RFC 9457 fields.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl ProblemDetails {
    /// Builds a problem document with no extension members.
    #[must_use]
    pub fn new(
        type_uri: impl Into<String>,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status,
            detail: detail.into(),
            instance: instance.into(),
            extensions: Map::new(),
        }
    }

    /// Adds an extension member, returning the builder for chaining.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}
