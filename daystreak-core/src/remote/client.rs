//! HTTP client for the statistics API
//!
//! `GET /api/statistics` returns the snapshot wrapped in a `success` flag;
//! `POST /api/statistics` overwrites it. Transient failures (5xx, 429,
//! timeouts, connection errors) are retried with exponential backoff.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;

use super::RemoteTier;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::types::StatisticsSnapshot;

/// Response from GET /api/statistics
#[derive(Debug, Deserialize)]
struct StatisticsResponse {
    #[serde(default)]
    success: bool,
    #[serde(flatten)]
    snapshot: StatisticsSnapshot,
}

/// Failure of a single HTTP attempt
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying
    Transient(String),
    /// Retrying would not help
    Permanent(String),
}

impl AttemptError {
    fn message(self) -> String {
        match self {
            AttemptError::Transient(m) | AttemptError::Permanent(m) => m,
        }
    }
}

/// HTTP client for the remote statistics tier
pub struct StatisticsClient {
    config: RemoteConfig,
    http_client: reqwest::Client,
    endpoint: String,
}

impl StatisticsClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config
            .server_url
            .clone()
            .ok_or_else(|| Error::Config("remote.server_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/api/statistics", base_url),
            config,
            http_client,
        })
    }

    /// Create a client only when the remote tier is enabled and configured
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>> {
        if !config.is_ready() {
            return Ok(None);
        }
        Self::new(config.clone()).map(Some)
    }

    /// Full URL of the statistics endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_once(&self) -> std::result::Result<StatisticsSnapshot, AttemptError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(classify_transport)?;

        let response = check_status(response).await?;
        let body: StatisticsResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Permanent(format!("failed to parse response: {}", e)))?;

        if !body.success {
            return Err(AttemptError::Permanent(
                "server reported an unsuccessful fetch".to_string(),
            ));
        }
        Ok(body.snapshot)
    }

    async fn push_once(
        &self,
        snapshot: &StatisticsSnapshot,
    ) -> std::result::Result<(), AttemptError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(snapshot)
            .send()
            .await
            .map_err(classify_transport)?;

        check_status(response).await?;
        Ok(())
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut delay = Duration::from_millis(500);
        let mut last_error = None;

        for n in 0..=self.config.max_retries {
            if n > 0 {
                tracing::debug!(
                    "Retrying {} (attempt {}/{}), waiting {:?}",
                    operation,
                    n + 1,
                    self.config.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Transient(msg)) => {
                    tracing::warn!(operation, error = %msg, "Transient error from statistics API");
                    last_error = Some(msg);
                }
                Err(e) => return Err(Error::Remote(format!("{}: {}", operation, e.message()))),
            }
        }

        Err(Error::Remote(format!(
            "{}: {}",
            operation,
            last_error.unwrap_or_else(|| "max retries exceeded".to_string())
        )))
    }
}

#[async_trait]
impl RemoteTier for StatisticsClient {
    async fn fetch(&self) -> Result<StatisticsSnapshot> {
        self.with_retry("fetch statistics", || self.fetch_once()).await
    }

    async fn push(&self, snapshot: &StatisticsSnapshot) -> Result<()> {
        self.with_retry("save statistics", || self.push_once(snapshot)).await
    }
}

fn classify_transport(error: reqwest::Error) -> AttemptError {
    let msg = format!("HTTP request failed: {}", error);
    if error.is_timeout() || error.is_connect() || error.is_request() {
        AttemptError::Transient(msg)
    } else {
        AttemptError::Permanent(msg)
    }
}

async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, AttemptError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    let msg = format!("API error ({}): {}", status, error_text);

    if is_retryable_status(status) {
        Err(AttemptError::Transient(msg))
    } else {
        Err(AttemptError::Permanent(msg))
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
