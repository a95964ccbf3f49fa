// crates/gatekeeper-runner/src/client.rs
// ============================================================================
// Module: HTTP Workload Runner Client
// Description: `gatekeeper_core::WorkloadRunnerClient` implementation over
//              `reqwest`.
// Purpose: Count running scanner jobs and submit new ones (§4.G).
// Dependencies: gatekeeper-core, gatekeeper-config, reqwest, serde, tokio
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use gatekeeper_config::CLIENT_RETRY_ATTEMPTS;
use gatekeeper_config::CLIENT_RETRY_BACKOFF;
use gatekeeper_core::JobSpec;
use gatekeeper_core::RunnerError;
use gatekeeper_core::WorkloadRunnerClient;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    job_name: &'a str,
    image: &'a str,
    command_args: &'a [String],
    env: Vec<EnvVarWire<'a>>,
    timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
struct EnvVarWire<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u32,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Async HTTP client to the in-cluster workload runner.
#[derive(Debug, Clone)]
pub struct HttpWorkloadRunnerClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpWorkloadRunnerClient {
    /// Builds a client pointed at `base_url` (the `RUNNER_ENDPOINT` value),
    /// optionally bearing a static `token` (`RUNNER_TOKEN`).
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: Url, token: Option<String>) -> Result<Self, RunnerError> {
        let client = Client::builder()
            .build()
            .map_err(|err| RunnerError::Transport(err.to_string()))?;
        Ok(Self { client, base_url, token })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response, RunnerError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_err = None;
        for attempt in 1..=CLIENT_RETRY_ATTEMPTS {
            match self.authorize(build()).send().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "workload runner request failed, retrying");
                    last_err = Some(err);
                    if attempt < CLIENT_RETRY_ATTEMPTS {
                        tokio::time::sleep(CLIENT_RETRY_BACKOFF).await;
                    }
                }
            }
        }
        Err(RunnerError::Transport(
            last_err.map(|err| err.to_string()).unwrap_or_else(|| "retries exhausted".to_string()),
        ))
    }
}

#[async_trait::async_trait]
impl WorkloadRunnerClient for HttpWorkloadRunnerClient {
    async fn count_running(&self, prefix: &str) -> Result<u32, RunnerError> {
        let url = self
            .base_url
            .join("jobs/count")
            .map_err(|err| RunnerError::Transport(err.to_string()))?;
        let response = self
            .send_with_retry(|| self.client.get(url.clone()).query(&[("prefix", prefix)]))
            .await?;
        if !response.status().is_success() {
            return Err(RunnerError::Transport(format!(
                "unexpected status counting jobs: {}",
                response.status()
            )));
        }
        let parsed: CountResponse =
            response.json().await.map_err(|err| RunnerError::Transport(err.to_string()))?;
        Ok(parsed.count)
    }

    async fn submit(&self, spec: JobSpec) -> Result<(), RunnerError> {
        let url =
            self.base_url.join("jobs").map_err(|err| RunnerError::Transport(err.to_string()))?;
        let body = SubmitRequest {
            job_name: &spec.job_name,
            image: &spec.image,
            command_args: &spec.command_args,
            env: spec.env.iter().map(|(name, value)| EnvVarWire { name, value }).collect(),
            timeout_seconds: spec.timeout_seconds,
        };
        let response = self.send_with_retry(|| self.client.post(url.clone()).json(&body)).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                Err(RunnerError::Rejected(detail))
            }
            status => Err(RunnerError::Transport(format!("unexpected status submitting job: {status}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    use super::*;

    #[tokio::test]
    async fn count_running_parses_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 3})))
            .mount(&server)
            .await;

        let client = HttpWorkloadRunnerClient::new(Url::parse(&server.uri()).unwrap(), None)
            .expect("build client");
        let count = client.count_running("scanner-").await.expect("count succeeds");
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn submit_rejects_on_422() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad spec"))
            .mount(&server)
            .await;

        let client = HttpWorkloadRunnerClient::new(Url::parse(&server.uri()).unwrap(), None)
            .expect("build client");
        let spec = JobSpec {
            job_name: "scanner-requests-1.0.0-py3.11.0-123".to_string(),
            image: "scanner:latest".to_string(),
            command_args: vec![],
            env: vec![],
            timeout_seconds: 3600,
        };
        let result = client.submit(spec).await;
        assert!(matches!(result, Err(RunnerError::Rejected(_))));
    }

    #[tokio::test]
    async fn submit_succeeds_on_201() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = HttpWorkloadRunnerClient::new(Url::parse(&server.uri()).unwrap(), None)
            .expect("build client");
        let spec = JobSpec {
            job_name: "scanner-requests-1.0.0-py3.11.0-123".to_string(),
            image: "scanner:latest".to_string(),
            command_args: vec![],
            env: vec![],
            timeout_seconds: 3600,
        };
        client.submit(spec).await.expect("submit succeeds");
    }
}
