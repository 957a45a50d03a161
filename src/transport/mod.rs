//! HTTP transport abstraction
//!
//! The session controller and the request executor never talk to the network
//! directly; they hand a fully signed [`HttpRequest`] to a [`Transport`] and
//! get back the raw [`HttpResponse`]. Concrete implementations:
//!
//! - [`http::HttpTransport`] -- `reqwest`-backed transport used in production.
//! - [`fake::FakeTransport`] -- in-process recording fake (cfg(test) only).
//!
//! Parameters travel in the query string for `GET`/`DELETE` and as an
//! `application/x-www-form-urlencoded` body for `POST`/`PUT`.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{MmfError, Result};

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

/// HTTP verbs accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// `GET`, used by every catalogued endpoint
    #[default]
    Get,
    /// `POST`, used by the OAuth token endpoints
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether parameters go in a form body rather than the query string.
    pub fn sends_form_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = MmfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(MmfError::Configuration(format!(
                "unsupported HTTP method '{other}', expected GET, POST, PUT or DELETE"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A signed request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL, without the request parameters.
    pub url: Url,
    /// Flat request parameters, in insertion order.
    pub params: Vec<(String, String)>,
    /// Extra headers, including `Authorization`.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Returns the value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends one HTTP request and returns the raw response.
///
/// Implementations must not retry and must report network-level failures as
/// [`MmfError::Transport`]. A non-2xx status is not an error at this layer.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send `request` and wait for the full response body.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Transport`] if the request could not be sent or
    /// the body could not be read.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

pub mod http;

#[cfg(test)]
pub mod fake;

pub use http::HttpTransport;
