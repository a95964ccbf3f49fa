// crates/gatekeeper-core/src/lib.rs
// ============================================================================
// Module: Gatekeeper Core
// Description: Domain types, error kinds, and request normalization shared
//              across the Gatekeeper workspace.
// Purpose: Provide the backend-agnostic contract every other crate builds on.
// Dependencies: serde, serde_json, thiserror, time, regex
// ============================================================================

//! ## Overview
//! `gatekeeper-core` defines the catalog data model (component A's schema),
//! the error kinds every component surfaces (§7), the request normalizer
//! (component C), and RFC 9457 problem+json types (component E's payload
//! shape). It has no I/O of its own; store, client, and server crates depend
//! on it and provide the backends.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod error;
pub mod interfaces;
pub mod normalize;
pub mod problem;
pub mod timestamp;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogEntry;
pub use catalog::PackageName;
pub use catalog::RuntimeVersion;
pub use catalog::ScanStatus;
pub use catalog::VersionSpec;
pub use catalog::VulnerabilityInfo;
pub use error::CatalogError;
pub use error::CatalogUnavailable;
pub use error::GateError;
pub use error::RunnerError;
pub use error::UpstreamError;
pub use error::WorkerError;
pub use interfaces::ArtifactOutcome;
pub use interfaces::CatalogStore;
pub use interfaces::IndexClient;
pub use interfaces::JobSpec;
pub use interfaces::ProbeOutcome;
pub use interfaces::WorkloadRunnerClient;
pub use normalize::NormalizedRequest;
pub use normalize::normalize_request;
pub use problem::ProblemDetails;
pub use timestamp::Timestamp;
