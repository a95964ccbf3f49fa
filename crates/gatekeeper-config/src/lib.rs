// crates/gatekeeper-config/src/lib.rs
// ============================================================================
// Module: Gatekeeper Configuration
// Description: Environment-variable configuration loading and validation.
// Purpose: Provide strict, fail-closed config parsing so a misconfigured
//          process never starts serving traffic or running a tick.
// Dependencies: url, thiserror
// ============================================================================

//! ## Overview
//! All Gatekeeper configuration is supplied via environment variables
//! (§6). Loading happens once at each binary's startup; missing required
//! variables or out-of-range values fail the process before it serves
//! traffic or runs an orchestrator tick, rather than defaulting silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Defaults
// ============================================================================

const DEFAULT_MAX_CONCURRENT_JOBS: u32 = 10;
const DEFAULT_RUNTIME_VERSIONS: &str = "3.9.0 3.10.0 3.11.0 3.12.0";
const DEFAULT_GATE_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ORCHESTRATOR_TICK_SECONDS: u64 = 300;
const DEFAULT_SCAN_JOB_TIMEOUT_SECONDS: u64 = 3_600;
const DEFAULT_PROBLEM_BASE_URL: &str = "https://errors.internal.example/";

/// Retry attempt count shared by the upstream index and workload runner
/// clients (§4.A, §4.G: "retried up to 3 times with 2 s backoff").
pub const CLIENT_RETRY_ATTEMPTS: u32 = 3;
/// Fixed backoff between client retry attempts.
pub const CLIENT_RETRY_BACKOFF: Duration = Duration::from_secs(2);
/// Upstream index probe timeout (§4.B).
pub const UPSTREAM_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Artifact streaming timeout (§6: `GET /packages/{filepath...}`).
pub const ARTIFACT_STREAM_TIMEOUT: Duration = Duration::from_secs(30);
/// `Retry-After` header value on a 503 Pending response (§4.E).
pub const PENDING_RETRY_AFTER_SECONDS: u32 = 300;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    /// A variable was set but could not be parsed or was out of range.
    #[error("invalid value for {variable}: {detail}")]
    Invalid {
        /// The offending environment variable's name.
        variable: &'static str,
        /// Why the value was rejected.
        detail: String,
    },
}

// ============================================================================
// SECTION: Gate Configuration
// ============================================================================

/// Configuration for the Gate HTTP server binary.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Base URL of the internal package index (`PYPI_SERVER_URL`).
    pub pypi_server_url: Url,
    /// SQLite connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Address the Gate HTTP server binds to (`GATE_BIND_ADDR`).
    pub bind_addr: SocketAddr,
    /// Base URL used to build problem+json `type` URIs.
    pub problem_base_url: Url,
}

impl GateConfig {
    /// Loads and validates Gate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// present variable fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pypi_server_url: require_url("PYPI_SERVER_URL")?,
            database_url: require_str("DATABASE_URL")?,
            bind_addr: optional_parsed("GATE_BIND_ADDR", DEFAULT_GATE_BIND_ADDR)?,
            problem_base_url: optional_url("PROBLEM_BASE_URL", DEFAULT_PROBLEM_BASE_URL)?,
        })
    }
}

// ============================================================================
// SECTION: Orchestrator Configuration
// ============================================================================

/// Configuration for the Orchestrator (periodic tick or cron-driven
/// one-shot invocation).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base URL of the internal package index, passed through to scanner
    /// jobs (`PYPI_SERVER_URL`).
    pub pypi_server_url: Url,
    /// SQLite connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Workload runner base URL (`RUNNER_ENDPOINT`).
    pub runner_endpoint: Url,
    /// Optional bearer credential for the workload runner (`RUNNER_TOKEN`).
    pub runner_token: Option<String>,
    /// Global concurrency cap on in-flight scan jobs (`MAX_CONCURRENT_JOBS`).
    pub max_concurrent_jobs: u32,
    /// Container image used for scanner jobs (`SCANNER_IMAGE`).
    pub scanner_image: String,
    /// Runtime versions scanned per release, in order (`RUNTIME_VERSIONS`).
    pub runtime_versions: Vec<String>,
    /// Interval between ticks when run as a long-lived loop
    /// (`ORCHESTRATOR_TICK_SECONDS`).
    pub tick_interval: Duration,
    /// Per-job wall-clock limit passed to the runner
    /// (`SCAN_JOB_TIMEOUT_SECONDS`).
    pub job_timeout: Duration,
}

impl OrchestratorConfig {
    /// Loads and validates Orchestrator configuration from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// present variable fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_concurrent_jobs =
            optional_parsed::<u32>("MAX_CONCURRENT_JOBS", &DEFAULT_MAX_CONCURRENT_JOBS.to_string())?;
        if max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid {
                variable: "MAX_CONCURRENT_JOBS",
                detail: "must be greater than zero".to_string(),
            });
        }
        let runtime_versions_raw =
            env::var("RUNTIME_VERSIONS").unwrap_or_else(|_| DEFAULT_RUNTIME_VERSIONS.to_string());
        let runtime_versions: Vec<String> =
            runtime_versions_raw.split_whitespace().map(str::to_string).collect();
        if runtime_versions.is_empty() {
            return Err(ConfigError::Invalid {
                variable: "RUNTIME_VERSIONS",
                detail: "must list at least one runtime version".to_string(),
            });
        }
        Ok(Self {
            pypi_server_url: require_url("PYPI_SERVER_URL")?,
            database_url: require_str("DATABASE_URL")?,
            runner_endpoint: require_url("RUNNER_ENDPOINT")?,
            runner_token: env::var("RUNNER_TOKEN").ok(),
            max_concurrent_jobs,
            scanner_image: require_str("SCANNER_IMAGE")?,
            runtime_versions,
            tick_interval: Duration::from_secs(optional_parsed(
                "ORCHESTRATOR_TICK_SECONDS",
                &DEFAULT_ORCHESTRATOR_TICK_SECONDS.to_string(),
            )?),
            job_timeout: Duration::from_secs(optional_parsed(
                "SCAN_JOB_TIMEOUT_SECONDS",
                &DEFAULT_SCAN_JOB_TIMEOUT_SECONDS.to_string(),
            )?),
        })
    }
}

// ============================================================================
// SECTION: Worker Configuration
// ============================================================================

/// Configuration for the scanner worker binary.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the internal package index (`PYPI_SERVER_URL`).
    pub pypi_server_url: Url,
    /// Internal index publish username (`PYPI_USERNAME`).
    pub pypi_username: String,
    /// Internal index publish password (`PYPI_PASSWORD`).
    pub pypi_password: String,
    /// SQLite connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Runtime versions to attempt, in order (`RUNTIME_VERSIONS`).
    pub runtime_versions: Vec<String>,
}

impl WorkerConfig {
    /// Loads and validates worker configuration from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// present variable fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let runtime_versions_raw =
            env::var("RUNTIME_VERSIONS").unwrap_or_else(|_| DEFAULT_RUNTIME_VERSIONS.to_string());
        Ok(Self {
            pypi_server_url: require_url("PYPI_SERVER_URL")?,
            pypi_username: require_str("PYPI_USERNAME")?,
            pypi_password: require_str("PYPI_PASSWORD")?,
            database_url: require_str("DATABASE_URL")?,
            runtime_versions: runtime_versions_raw.split_whitespace().map(str::to_string).collect(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn require_str(variable: &'static str) -> Result<String, ConfigError> {
    let value = env::var(variable).map_err(|_| ConfigError::Missing(variable))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            variable,
            detail: "must be non-empty".to_string(),
        });
    }
    Ok(value)
}

fn require_url(variable: &'static str) -> Result<Url, ConfigError> {
    let raw = require_str(variable)?;
    Url::parse(&raw).map_err(|err| ConfigError::Invalid {
        variable,
        detail: err.to_string(),
    })
}

fn optional_url(variable: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env::var(variable).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|err| ConfigError::Invalid {
        variable,
        detail: err.to_string(),
    })
}

fn optional_parsed<T>(variable: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(variable).unwrap_or_else(|_| default.to_string());
    parse_value(variable, &raw)
}

fn parse_value<T>(variable: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|err| ConfigError::Invalid {
        variable,
        detail: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_parsed_falls_back_to_default() {
        let value: u32 = optional_parsed("GATEKEEPER_DOES_NOT_EXIST", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_value_rejects_non_numeric_input() {
        let result: Result<u32, ConfigError> = parse_value("MAX_CONCURRENT_JOBS", "not-a-number");
        assert!(result.is_err());
    }
}
