// crates/gatekeeper-worker/src/lib.rs
// ============================================================================
// Module: Gatekeeper Scanner Worker
// Description: The scanner worker contract (component H): what a scan job
//              executes and how it mutates the catalog and internal index.
// Purpose: Give §4.H's download/scan/publish/finalize sequence a testable
//          shape: three small traits plus the orchestration function that
//          drives them, independent of the real `pip`/scanner/`twine`
//          subprocesses a deployed scanner job shells out to.
// Dependencies: gatekeeper-core, gatekeeper-config, async-trait, tokio,
//               reqwest, tracing
// ============================================================================

//! ## Overview
//! A scanner job is launched per `(name, version)` (by the Orchestrator,
//! via the workload runner). [`run_scan_job`] is the whole of its
//! contractual behavior: download the release for every configured
//! runtime (short-circuiting on a universal artifact), scan the staging
//! directory, and either publish-then-finalize-`completed` or
//! finalize-`vulnerable` without publishing. [`PackageDownloader`],
//! [`VulnerabilityScanner`], and [`ArtifactPublisher`] are the seams real
//! subprocess/HTTP backends plug into; [`subprocess`] and [`publish`]
//! provide the real implementations a deployed `scanner-worker` binary
//! wires up.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifact;
pub mod contract;
pub mod publish;
pub mod subprocess;
pub mod traits;

pub use artifact::DownloadedArtifact;
pub use artifact::is_universal_artifact;
pub use contract::ScanJobOutcome;
pub use contract::run_scan_job;
pub use publish::HttpArtifactPublisher;
pub use subprocess::SubprocessPackageDownloader;
pub use subprocess::SubprocessVulnerabilityScanner;
pub use traits::ArtifactPublisher;
pub use traits::PackageDownloader;
pub use traits::ScanOutcome;
pub use traits::VulnerabilityScanner;
