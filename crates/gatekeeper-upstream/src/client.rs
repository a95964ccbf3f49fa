// crates/gatekeeper-upstream/src/client.rs
// ============================================================================
// Module: HTTP Index Client
// Description: `gatekeeper_core::IndexClient` implementation over `reqwest`.
// Purpose: Probe, list, and stream from the internal Simple-Index (§4.B).
// Dependencies: gatekeeper-core, gatekeeper-config, reqwest, tokio, tracing
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use gatekeeper_config::ARTIFACT_STREAM_TIMEOUT;
use gatekeeper_config::CLIENT_RETRY_ATTEMPTS;
use gatekeeper_config::CLIENT_RETRY_BACKOFF;
use gatekeeper_config::UPSTREAM_PROBE_TIMEOUT;
use gatekeeper_core::ArtifactOutcome;
use gatekeeper_core::IndexClient;
use gatekeeper_core::PackageName;
use gatekeeper_core::ProbeOutcome;
use gatekeeper_core::UpstreamError;
use reqwest::Client;
use reqwest::StatusCode;
use url::Url;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Async HTTP client to the internal package index's Simple-Index surface.
#[derive(Debug, Clone)]
pub struct HttpIndexClient {
    client: Client,
    base_url: Url,
}

impl HttpIndexClient {
    /// Builds a client pointed at `base_url` (the `PYPI_SERVER_URL` value).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: Url) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| UpstreamError::Transport(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn simple_url(&self, name: &PackageName) -> Result<Url, UpstreamError> {
        self.base_url
            .join(&format!("simple/{}/", name.as_str()))
            .map_err(|err| UpstreamError::Transport(err.to_string()))
    }

    fn simple_index_url(&self) -> Result<Url, UpstreamError> {
        self.base_url.join("simple/").map_err(|err| UpstreamError::Transport(err.to_string()))
    }

    fn artifact_url(&self, path: &str) -> Result<Url, UpstreamError> {
        self.base_url
            .join(&format!("packages/{path}"))
            .map_err(|err| UpstreamError::Transport(err.to_string()))
    }

    async fn get_with_retry(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<reqwest::Response, UpstreamError> {
        let mut last_err = None;
        for attempt in 1..=CLIENT_RETRY_ATTEMPTS {
            match self.client.get(url.clone()).timeout(timeout).send().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    tracing::warn!(
                        url = %url,
                        attempt,
                        error = %err,
                        "upstream index request failed, retrying"
                    );
                    last_err = Some(err);
                    if attempt < CLIENT_RETRY_ATTEMPTS {
                        tokio::time::sleep(CLIENT_RETRY_BACKOFF).await;
                    }
                }
            }
        }
        Err(UpstreamError::Transport(
            last_err.map(|err| err.to_string()).unwrap_or_else(|| "retries exhausted".to_string()),
        ))
    }

    async fn response_to_probe_outcome(
        response: reqwest::Response,
    ) -> Result<ProbeOutcome, UpstreamError> {
        match response.status() {
            StatusCode::NOT_FOUND => Ok(ProbeOutcome::Absent),
            StatusCode::OK => {
                let content_type =
                    response.headers().get(reqwest::header::CONTENT_TYPE).and_then(|value| {
                        value.to_str().ok().map(str::to_string)
                    });
                let body = response
                    .bytes()
                    .await
                    .map_err(|err| UpstreamError::Transport(err.to_string()))?
                    .to_vec();
                Ok(ProbeOutcome::Present { body, content_type })
            }
            status => Err(UpstreamError::UnexpectedStatus { status: status.as_u16() }),
        }
    }
}

#[async_trait::async_trait]
impl IndexClient for HttpIndexClient {
    async fn probe(&self, name: &PackageName) -> Result<ProbeOutcome, UpstreamError> {
        let url = self.simple_url(name)?;
        let response = self.get_with_retry(&url, UPSTREAM_PROBE_TIMEOUT).await?;
        Self::response_to_probe_outcome(response).await
    }

    async fn stream_artifact(&self, path: &str) -> Result<Option<ArtifactOutcome>, UpstreamError> {
        let url = self.artifact_url(path)?;
        let response = self.get_with_retry(&url, ARTIFACT_STREAM_TIMEOUT).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::OK => {
                let content_type =
                    response.headers().get(reqwest::header::CONTENT_TYPE).and_then(|value| {
                        value.to_str().ok().map(str::to_string)
                    });
                let content_disposition = response
                    .headers()
                    .get(reqwest::header::CONTENT_DISPOSITION)
                    .and_then(|value| value.to_str().ok().map(str::to_string));
                let body = response
                    .bytes()
                    .await
                    .map_err(|err| UpstreamError::Transport(err.to_string()))?
                    .to_vec();
                Ok(Some(ArtifactOutcome { body, content_type, content_disposition }))
            }
            status => Err(UpstreamError::UnexpectedStatus { status: status.as_u16() }),
        }
    }

    async fn list_index(&self) -> Result<ProbeOutcome, UpstreamError> {
        let url = self.simple_index_url()?;
        let response = self.get_with_retry(&url, UPSTREAM_PROBE_TIMEOUT).await?;
        Self::response_to_probe_outcome(response).await
    }
}

#[cfg(test)]
mod tests {
    use gatekeeper_core::PackageName;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    use super::*;

    #[tokio::test]
    async fn probe_reports_absent_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/does-not-exist/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpIndexClient::new(Url::parse(&server.uri()).unwrap().join("/").unwrap())
            .expect("build client");
        let outcome = client.probe(&PackageName::new("does-not-exist")).await.expect("probe succeeds");
        assert!(matches!(outcome, ProbeOutcome::Absent));
    }

    #[tokio::test]
    async fn probe_reports_present_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/requests/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client =
            HttpIndexClient::new(Url::parse(&server.uri()).unwrap()).expect("build client");
        let outcome = client.probe(&PackageName::new("requests")).await.expect("probe succeeds");
        match outcome {
            ProbeOutcome::Present { body, .. } => assert_eq!(body, b"<html></html>"),
            ProbeOutcome::Absent => panic!("expected present outcome"),
        }
    }

    #[tokio::test]
    async fn probe_surfaces_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/broken/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client =
            HttpIndexClient::new(Url::parse(&server.uri()).unwrap()).expect("build client");
        let result = client.probe(&PackageName::new("broken")).await;
        assert!(matches!(result, Err(UpstreamError::UnexpectedStatus { status: 500 })));
    }
}
