// crates/gatekeeper-gate/src/state.rs
// ============================================================================
// Module: Gate State
// Description: Shared application state for the Gate's axum handlers.
// Purpose: Hold the backend trait objects the Orchestrator-free request path
//          needs: the catalog and the upstream index.
// Dependencies: gatekeeper-core, url
// ============================================================================

use std::sync::Arc;

use gatekeeper_core::CatalogStore;
use gatekeeper_core::IndexClient;
use url::Url;

/// Shared state for the Gate HTTP server.
///
/// Cloned per-request by axum's `State` extractor; cheap, since every field
/// is an `Arc`.
#[derive(Clone)]
pub struct GateState {
    /// Catalog store backend (component A).
    pub catalog: Arc<dyn CatalogStore>,
    /// Upstream internal-index client (component B).
    pub index: Arc<dyn IndexClient>,
    /// Base URL used to build problem+json `type` URIs.
    pub problem_base_url: Url,
}

impl GateState {
    /// Builds Gate state from its backend dependencies.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, index: Arc<dyn IndexClient>, problem_base_url: Url) -> Self {
        Self { catalog, index, problem_base_url }
    }
}
