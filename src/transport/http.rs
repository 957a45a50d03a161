//! `reqwest`-backed transport
//!
//! [`HttpTransport`] owns a single `reqwest::Client` configured with a
//! per-request timeout and a user agent. It performs exactly one HTTP
//! exchange per [`Transport::send`] call and never retries.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{MmfError, Result};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("mapmyfitness-rs/", env!("CARGO_PKG_VERSION"));

/// Production transport built on `reqwest`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mapmyfitness::transport::HttpTransport;
///
/// let transport = HttpTransport::new(Duration::from_secs(30), None).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Underlying reqwest HTTP client.
    http_client: Arc<reqwest::Client>,
}

impl HttpTransport {
    /// Construct a new [`HttpTransport`].
    ///
    /// No network I/O is performed at construction time.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Per-request timeout.
    /// * `user_agent` - `User-Agent` header; [`DEFAULT_USER_AGENT`] when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .map_err(|e| MmfError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client: Arc::new(http_client),
        })
    }

    /// Wraps an existing client, sharing its connection pool.
    pub fn with_client(http_client: Arc<reqwest::Client>) -> Self {
        Self { http_client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            params,
            headers,
        } = request;

        let mut builder = match method {
            HttpMethod::Get => self.http_client.get(url.clone()),
            HttpMethod::Delete => self.http_client.delete(url.clone()),
            HttpMethod::Post => self.http_client.post(url.clone()),
            HttpMethod::Put => self.http_client.put(url.clone()),
        };

        if method.sends_form_body() {
            builder = builder.form(&params);
        } else if !params.is_empty() {
            builder = builder.query(&params);
        }

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| MmfError::Transport(format!("{method} {url} failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            MmfError::Transport(format!("failed to read response body from {url}: {e}"))
        })?;

        tracing::debug!(%method, %url, status, "HTTP exchange complete");

        Ok(HttpResponse { status, body })
    }
}
