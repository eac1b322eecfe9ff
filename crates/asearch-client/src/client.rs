//! HTTP client for the ASearch backend (`/api/ping`, `/api/search`).
//!
//! Wraps `reqwest` with typed status handling and transient-error retries.
//! Search responses are returned as undecoded JSON records so that one bad
//! record can be rejected by the derivation stage without failing the batch.

use std::time::Duration;

use asearch_core::{AppConfig, RequestDescriptor, PING_PATH};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;
use crate::orchestrator::SearchBackend;
use crate::retry::retry_with_backoff;

/// Body of `GET /api/ping`.
#[derive(Debug, Deserialize)]
struct PingResponse {
    #[serde(default)]
    pong: bool,
}

/// Client for the ASearch HTTP API.
///
/// Use [`SearchClient::from_config`] in the binary or [`SearchClient::new`]
/// to point at a mock server in tests.
pub struct SearchClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SearchClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// `max_retries` is the number of additional attempts after a transient
    /// failure; `0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise to exactly one trailing slash so relative joins append to
        // the base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// See [`SearchClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Calls `GET /api/ping` once and reports whether the backend answered `pong`.
    ///
    /// Readiness checks are never retried; a failure is reported as-is.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a ping object.
    pub async fn ping(&self) -> Result<bool, ClientError> {
        let url = self.endpoint_url(PING_PATH)?;
        let response: PingResponse = self.get_json(&url, "ping", 0).await?;
        Ok(response.pong)
    }

    /// Runs one search and returns the raw records in API order.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure after retries.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a JSON array.
    pub async fn search(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        let url = self.endpoint_url(&request.path_and_query())?;
        let context = format!("search(q={}, ctry={})", request.query().text, request.query().region);
        let records: Vec<serde_json::Value> =
            self.get_json(&url, &context, self.max_retries).await?;
        tracing::debug!(url = %url, records = records.len(), "search response received");
        Ok(records)
    }

    /// Resolves an absolute API path (`/api/...`) against the base URL.
    fn endpoint_url(&self, path_and_query: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path_and_query.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: format!("cannot join '{path_and_query}': {e}"),
            })
    }

    /// Sends a GET with up to `max_retries` retries, asserts a 2xx status, and
    /// decodes the body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
        max_retries: u32,
    ) -> Result<T, ClientError> {
        retry_with_backoff(max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ClientError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(|e| ClientError::Deserialize {
                context: context.to_owned(),
                source: e,
            })
        })
        .await
    }
}

impl SearchBackend for SearchClient {
    async fn fetch(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        self.search(request).await
    }
}
