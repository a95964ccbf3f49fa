// crates/gatekeeper-gate/src/handlers.rs
// ============================================================================
// Module: Gate HTTP Handlers
// Description: axum route handlers exposing the Gate's HTTP surface (§6).
// Purpose: Wire incoming installer/admin requests through normalization,
//          the decision algorithm, and the response encoder.
// Dependencies: axum, gatekeeper-core
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use gatekeeper_core::CatalogEntry;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::ScanStatus;
use gatekeeper_core::normalize_request;
use serde::Deserialize;
use serde::Serialize;

use crate::decision::decide;
use crate::response::render_decision;
use crate::response::render_error;
use crate::state::GateState;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the Gate's axum [`Router`], wired to `state`.
#[must_use]
pub fn router(state: GateState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/simple/", get(simple_index))
        .route("/simple/{name}/", get(simple_package))
        .route("/packages/{*path}", get(stream_artifact))
        .route("/admin/packages", get(admin_list_all))
        .route("/admin/packages/pending", get(admin_list_pending))
        .route("/admin/packages/counts", get(admin_counts))
        .with_state(state)
}

// ============================================================================
// SECTION: Health
// ============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

// ============================================================================
// SECTION: Installer Surface
// ============================================================================

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(axum::http::header::USER_AGENT).and_then(|value| value.to_str().ok())
}

async fn simple_package(
    State(state): State<GateState>,
    Path(raw_target): Path<String>,
    headers: HeaderMap,
) -> Response {
    let normalized = normalize_request(&raw_target, user_agent(&headers));
    let decision = decide(
        &state.catalog,
        &state.index,
        &normalized.name,
        normalized.version.as_ref(),
        normalized.runtime_version.as_ref(),
    )
    .await;
    match decision {
        Ok(decision) => render_decision(&state.problem_base_url, normalized.name.as_str(), decision),
        Err(err) => render_error(&state.problem_base_url, &err),
    }
}

async fn simple_index(State(state): State<GateState>) -> Response {
    match state.index.list_index().await {
        Ok(gatekeeper_core::ProbeOutcome::Present { body, content_type }) => {
            let mut response = (StatusCode::OK, body).into_response();
            if let Some(content_type) = content_type
                && let Ok(value) = axum::http::HeaderValue::from_str(&content_type)
            {
                response.headers_mut().insert(axum::http::header::CONTENT_TYPE, value);
            }
            response
        }
        Ok(gatekeeper_core::ProbeOutcome::Absent) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to list upstream index");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

async fn stream_artifact(State(state): State<GateState>, Path(path): Path<String>) -> Response {
    match state.index.stream_artifact(&path).await {
        Ok(Some(outcome)) => {
            let mut response = (StatusCode::OK, outcome.body).into_response();
            if let Some(content_type) = outcome.content_type
                && let Ok(value) = axum::http::HeaderValue::from_str(&content_type)
            {
                response.headers_mut().insert(axum::http::header::CONTENT_TYPE, value);
            }
            if let Some(content_disposition) = outcome.content_disposition
                && let Ok(value) = axum::http::HeaderValue::from_str(&content_disposition)
            {
                response.headers_mut().insert(axum::http::header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(error = %err, path = %path, "failed to stream artifact");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

// ============================================================================
// SECTION: Admin Surface
// ============================================================================

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

const fn default_limit() -> u32 {
    100
}

#[derive(Debug, Serialize)]
struct CatalogEntryWire {
    name: String,
    version: String,
    runtime_version: Option<String>,
    status: ScanStatus,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<CatalogEntry> for CatalogEntryWire {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            name: entry.name.to_string(),
            version: entry.version.to_string(),
            runtime_version: entry.runtime_version.map(|v| v.to_string()),
            status: entry.status,
            error_message: entry.error_message,
            created_at: entry.created_at.to_string(),
            updated_at: entry.updated_at.to_string(),
        }
    }
}

async fn admin_list_all(
    State(state): State<GateState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<CatalogEntryWire>>, StatusCode> {
    let catalog = state.catalog.clone();
    let entries = tokio::task::spawn_blocking(move || catalog.list_all(page.limit, page.offset))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(|err| {
            tracing::error!(error = %err, "admin catalog listing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(entries.into_iter().map(CatalogEntryWire::from).collect()))
}

async fn admin_list_pending(
    State(state): State<GateState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<CatalogEntryWire>>, StatusCode> {
    let catalog = state.catalog.clone();
    let entries = tokio::task::spawn_blocking(move || catalog.list_pending(page.limit, page.offset))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(|err| {
            tracing::error!(error = %err, "admin catalog listing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(entries.into_iter().map(CatalogEntryWire::from).collect()))
}

#[derive(Debug, Serialize)]
struct StatusCountWire {
    status: ScanStatus,
    count: u64,
}

async fn admin_counts(State(state): State<GateState>) -> Result<Json<Vec<StatusCountWire>>, StatusCode> {
    let catalog = state.catalog.clone();
    let counts = tokio::task::spawn_blocking(move || catalog.count_by_status())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(|err| {
            tracing::error!(error = %err, "admin catalog count failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(counts.into_iter().map(|(status, count)| StatusCountWire { status, count }).collect()))
}
