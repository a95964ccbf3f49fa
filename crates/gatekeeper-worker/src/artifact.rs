// crates/gatekeeper-worker/src/artifact.rs
// ============================================================================
// Module: Downloaded Artifact
// Description: A retrieved release file and the universal-artifact
//              short-circuit test (§4.H step 2).
// Purpose: Let the download loop recognize a runtime-independent artifact
//          and stop downloading for the remaining configured runtimes.
// Dependencies: std::path
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

// ============================================================================
// SECTION: Downloaded Artifact
// ============================================================================

/// A single release file retrieved into the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    /// Absolute path to the file on the staging directory's filesystem.
    pub path: PathBuf,
    /// The file's basename, as it should be uploaded to the internal index.
    pub filename: String,
}

impl DownloadedArtifact {
    /// Builds a downloaded artifact from a path, deriving `filename` from
    /// the path's final component.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let filename = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        Self { path, filename }
    }
}

// ============================================================================
// SECTION: Universal Artifact Detection
// ============================================================================

/// Returns true when `filename`'s extension indicates a runtime-independent
/// artifact (§4.H step 2, and the glossary's "Universal artifact"):
/// `.tar.gz`, `-py3-none-any.whl`, or `-py2.py3-none-any.whl`.
#[must_use]
pub fn is_universal_artifact(filename: &str) -> bool {
    filename.ends_with(".tar.gz")
        || filename.ends_with("-py3-none-any.whl")
        || filename.ends_with("-py2.py3-none-any.whl")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
