// crates/gatekeeper-gate/src/response.rs
// ============================================================================
// Module: Response Encoder
// Description: Turns a `GateDecision` or `GateError` into an HTTP response
//              (component E).
// Purpose: Give every non-2xx outcome a consistent RFC 9457
//          `application/problem+json` body.
// Dependencies: gatekeeper-core, axum
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use gatekeeper_core::GateError;
use gatekeeper_core::ProblemDetails;
use url::Url;

use crate::decision::GateDecision;

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

// ============================================================================
// SECTION: Decision Encoding
// ============================================================================

/// Encodes a [`GateDecision`] into its HTTP response. `name` is the
/// requested package name, used to build the problem document's
/// `instance` member (`/simple/{name}/`, per §4.E and §8 scenarios 2-3).
pub fn render_decision(problem_base_url: &Url, name: &str, decision: GateDecision) -> Response {
    let instance = format!("/simple/{name}/");
    match decision {
        GateDecision::Proxy { body, content_type } => {
            let mut response = (StatusCode::OK, body).into_response();
            if let Some(content_type) = content_type
                && let Ok(value) = HeaderValue::from_str(&content_type)
            {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            response
        }
        GateDecision::Blocked { vulnerability_info } => {
            let mut problem = ProblemDetails::new(
                problem_type_uri(problem_base_url, "vulnerability-detected"),
                "Package blocked".to_string(),
                StatusCode::FORBIDDEN.as_u16(),
                "This package version was found to contain a known vulnerability.".to_string(),
                instance,
            );
            if let Some(info) = vulnerability_info {
                problem = problem.with_extension("vulnerabilities", info.into_value());
            }
            problem_response(StatusCode::FORBIDDEN, &problem)
        }
        GateDecision::Pending { retry_after_seconds } => {
            let problem = ProblemDetails::new(
                problem_type_uri(problem_base_url, "scan-in-progress"),
                "Scan pending".to_string(),
                StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                "This package version has not finished its security scan yet. Retry shortly.".to_string(),
                instance,
            );
            let mut response = problem_response(StatusCode::SERVICE_UNAVAILABLE, &problem);
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

// ============================================================================
// SECTION: Error Encoding
// ============================================================================

/// Encodes a [`GateError`] into its HTTP response (§4.D step 5).
pub fn render_error(problem_base_url: &Url, error: &GateError) -> Response {
    tracing::error!(error = %error, "gate decision failed");
    let problem = ProblemDetails::new(
        problem_type_uri(problem_base_url, "internal-error"),
        "Internal error".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "An unexpected error occurred while evaluating this request.".to_string(),
        "about:blank".to_string(),
    );
    problem_response(StatusCode::INTERNAL_SERVER_ERROR, &problem)
}

fn problem_type_uri(base: &Url, slug: &str) -> String {
    base.join(slug).map_or_else(|_| format!("about:blank#{slug}"), |url| url.to_string())
}

fn problem_response(status: StatusCode, problem: &ProblemDetails) -> Response {
    let mut response = (status, serde_json::to_vec(problem).unwrap_or_default()).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
    );
    response
}
