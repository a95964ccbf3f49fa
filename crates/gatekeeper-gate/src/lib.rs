// crates/gatekeeper-gate/src/lib.rs
// ============================================================================
// Module: Gatekeeper Gate
// Description: The installer-facing security decision engine (component D)
//              and its response encoder (component E).
// Purpose: Decide, for a requested `(name, version)`, whether to proxy the
//          real package, block it, or tell the installer to wait.
// Dependencies: gatekeeper-core, gatekeeper-config, axum
// ============================================================================

//! ## Overview
//! The Gate sits between pip/uv and the internal package index. Every
//! request is normalized (component C), then checked against the internal
//! index (component B); only when the index has no record under that name
//! does the Gate fall back to the catalog (component A) to decide whether a
//! scan should be scheduled. [`decision::decide`] implements the five-step
//! algorithm; [`response`] turns its outcome into an HTTP response,
//! including `application/problem+json` bodies for the non-2xx cases.

pub mod decision;
pub mod handlers;
pub mod response;
pub mod state;

pub use decision::GateDecision;
pub use decision::decide;
pub use state::GateState;
