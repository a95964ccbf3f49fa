// crates/gatekeeper-upstream/src/lib.rs
// ============================================================================
// Module: Gatekeeper Upstream Index Client
// Description: Async HTTP client to the internal package index (component B).
// Purpose: Probe and proxy the Simple-Index surface the Gate decides against.
// Dependencies: gatekeeper-core, gatekeeper-config, reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! `HttpIndexClient` implements [`gatekeeper_core::IndexClient`] against a
//! real internal package index over HTTPS. Every call is retried up to
//! [`gatekeeper_config::CLIENT_RETRY_ATTEMPTS`] times with a fixed
//! [`gatekeeper_config::CLIENT_RETRY_BACKOFF`] between attempts; a `404` is
//! never retried since it is a meaningful answer, not a failure.

pub mod client;

pub use client::HttpIndexClient;
