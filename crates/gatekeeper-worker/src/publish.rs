// crates/gatekeeper-worker/src/publish.rs
// ============================================================================
// Module: HTTP Artifact Publisher
// Description: `ArtifactPublisher` implementation posting to the internal
//              index's legacy upload API (§4.H step 6), `twine`-equivalent.
// Purpose: Upload a clean artifact over HTTP instead of shelling out to
//          `twine`, while preserving its idempotent "already exists"
//          semantics.
// Dependencies: reqwest, tokio, gatekeeper-core
// ============================================================================

//! ## Overview
//! `original_source/scan_package.py`'s `upload_to_pypi` shells out to the
//! `twine` CLI and treats an "already exists" response as success so a
//! retried worker never fails on a partially-published release.
//! `HttpArtifactPublisher` reproduces the same multipart legacy upload
//! request directly over `reqwest`, matching the client-construction
//! style used across this workspace's other HTTP backends
//! (`gatekeeper-upstream`, `gatekeeper-runner`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use gatekeeper_core::WorkerError;
use reqwest::Client;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use url::Url;

use crate::artifact::DownloadedArtifact;
use crate::traits::ArtifactPublisher;

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Publishes artifacts to the internal index's legacy upload endpoint over
/// HTTP Basic auth.
#[derive(Debug, Clone)]
pub struct HttpArtifactPublisher {
    client: Client,
    upload_url: Url,
    username: String,
    password: String,
}

impl HttpArtifactPublisher {
    /// Builds a publisher posting to `upload_url` with the internal
    /// index's publish credentials (`PYPI_USERNAME`/`PYPI_PASSWORD`).
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::PublishFailed`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(upload_url: Url, username: String, password: String) -> Result<Self, WorkerError> {
        let client = Client::builder().build().map_err(|err| WorkerError::PublishFailed(err.to_string()))?;
        Ok(Self { client, upload_url, username, password })
    }
}

#[async_trait::async_trait]
impl ArtifactPublisher for HttpArtifactPublisher {
    async fn publish(&self, artifact: &DownloadedArtifact) -> Result<(), WorkerError> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|err| WorkerError::PublishFailed(format!("reading artifact: {err}")))?;
        let part = Part::bytes(bytes).file_name(artifact.filename.clone());
        let form = Form::new()
            .text(":action", "file_upload")
            .text("protocol_version", "1")
            .part("content", part);

        let response = self
            .client
            .post(self.upload_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .send()
            .await
            .map_err(|err| WorkerError::PublishFailed(err.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if body.to_ascii_lowercase().contains("already exists") {
            tracing::info!(filename = %artifact.filename, "artifact already present on internal index");
            return Ok(());
        }
        Err(WorkerError::PublishFailed(format!("upload failed with status {status}: {body}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::method;

    use super::*;

    #[tokio::test]
    async fn upload_success_returns_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let publisher =
            HttpArtifactPublisher::new(Url::parse(&server.uri()).unwrap(), "user".to_string(), "pass".to_string())
                .expect("build publisher");
        let (_dir, path) = write_temp_file().await;
        let artifact = DownloadedArtifact { path, filename: "foo-1.0.0.tar.gz".to_string() };
        publisher.publish(&artifact).await.expect("publish succeeds");
    }

    #[tokio::test]
    async fn already_exists_counts_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("File already exists"))
            .mount(&server)
            .await;

        let publisher =
            HttpArtifactPublisher::new(Url::parse(&server.uri()).unwrap(), "user".to_string(), "pass".to_string())
                .expect("build publisher");
        let (_dir, path) = write_temp_file().await;
        let artifact = DownloadedArtifact { path, filename: "foo-1.0.0.tar.gz".to_string() };
        publisher.publish(&artifact).await.expect("already-exists is success");
    }

    #[tokio::test]
    async fn other_failure_is_publish_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let publisher =
            HttpArtifactPublisher::new(Url::parse(&server.uri()).unwrap(), "user".to_string(), "pass".to_string())
                .expect("build publisher");
        let (_dir, path) = write_temp_file().await;
        let artifact = DownloadedArtifact { path, filename: "foo-1.0.0.tar.gz".to_string() };
        let result = publisher.publish(&artifact).await;
        assert!(matches!(result, Err(WorkerError::PublishFailed(_))));
    }

    async fn write_temp_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("foo-1.0.0.tar.gz");
        tokio::fs::write(&path, b"fake artifact bytes").await.expect("write temp file");
        (dir, path)
    }
}
