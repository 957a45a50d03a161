//! The MapMyFitness API client
//!
//! [`ApiClient`] ties the pieces together: it owns the
//! [`SessionController`] for the handshake, signs every API call with the
//! stored access token, and decodes responses in the format chosen at
//! construction.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mapmyfitness::client::{ApiClient, ClientOptions};
//! use mapmyfitness::storage::MemoryTokenStorage;
//! use mapmyfitness::transport::HttpTransport;
//!
//! # async fn run() -> mapmyfitness::Result<()> {
//! let options = ClientOptions::new("consumer-key", "consumer-secret")
//!     .with_callback_url("https://app.example/callback");
//! let transport = HttpTransport::new(std::time::Duration::from_secs(30), None)?;
//! let mut client = ApiClient::new(
//!     options,
//!     Arc::new(MemoryTokenStorage::new()),
//!     Arc::new(transport),
//! )?;
//!
//! if client.is_authorized().await {
//!     let me = client.get_user(None, None).await?;
//!     println!("{}", me.to_json());
//! } else if let Some(url) = client.init_session(None).await?.redirect_url() {
//!     println!("visit {url}");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::auth::oauth1::OAuthSigner;
use crate::auth::session::{CallbackParams, SessionController, SessionOutcome, SessionState};
use crate::auth::{Credentials, ProviderEndpoints};
use crate::catalog::{Endpoint, Params};
use crate::config::Config;
use crate::error::{MmfError, Result};
use crate::response::{decode, Decoded, ResponseFormat};
use crate::storage::TokenStorage;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, Transport};

/// User id meaning "the authorized user".
pub const DEFAULT_USER_ID: &str = "-";

/// Longest API error body carried verbatim into [`MmfError::Api`].
const MAX_ERROR_BODY: usize = 512;

// ---------------------------------------------------------------------------
// ClientOptions
// ---------------------------------------------------------------------------

/// Construction parameters for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Application consumer key.
    pub consumer_key: String,
    /// Application consumer secret.
    pub consumer_secret: String,
    /// Absolute callback URL; `None` uses out-of-band verification.
    pub callback_url: Option<String>,
    /// Response format wire name: `json`, `xml`, `php` or `txt`.
    pub response_format: String,
    /// Opt-in for the `php` response format.
    pub allow_native_serialized: bool,
    /// Provider and API URLs.
    pub endpoints: ProviderEndpoints,
}

impl ClientOptions {
    /// Options with the default format (`json`) and endpoints.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            callback_url: None,
            response_format: ResponseFormat::default().wire_name().to_string(),
            allow_native_serialized: false,
            endpoints: ProviderEndpoints::default(),
        }
    }

    /// Sets the OAuth callback URL.
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Sets the response format by wire name.
    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = format.into();
        self
    }

    /// Enables or disables the `php` response format.
    pub fn allow_native_serialized(mut self, allow: bool) -> Self {
        self.allow_native_serialized = allow;
        self
    }

    /// Overrides the provider and API URLs.
    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Raw result of one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded body.
    pub body: String,
}

impl ApiResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of [`ApiClient::custom_call`]: the decoded body and its status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body.
    pub response: Decoded,
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Authenticated client for the MapMyFitness 3.1 API.
#[derive(Debug)]
pub struct ApiClient {
    session: SessionController,
    storage: Arc<dyn TokenStorage>,
    transport: Arc<dyn Transport>,
    format: ResponseFormat,
    user_id: String,
}

impl ApiClient {
    /// Creates a client. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] for empty credentials, an invalid
    /// callback URL, or an unknown or disallowed response format.
    pub fn new(
        options: ClientOptions,
        storage: Arc<dyn TokenStorage>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let format =
            ResponseFormat::select(&options.response_format, options.allow_native_serialized)?;
        let credentials = Credentials::new(
            options.consumer_key,
            options.consumer_secret,
            options.callback_url.as_deref(),
        )?;
        let session = SessionController::new(
            credentials,
            options.endpoints,
            Arc::clone(&storage),
            Arc::clone(&transport),
        );

        Ok(Self {
            session,
            storage,
            transport,
            format,
            user_id: DEFAULT_USER_ID.to_string(),
        })
    }

    /// Builds the client, its token storage and an HTTP transport from
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the storage or
    /// HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let storage = config.storage.build()?;
        let transport = HttpTransport::new(
            Duration::from_secs(config.timeout_seconds),
            config.user_agent.as_deref(),
        )?;
        Self::new(config.client_options()?, storage, Arc::new(transport))
    }

    // -- session -----------------------------------------------------------

    /// Advances the OAuth handshake; see [`SessionController::init_session`].
    pub async fn init_session(
        &mut self,
        callback: Option<&CallbackParams>,
    ) -> Result<SessionOutcome> {
        self.session.init_session(callback).await
    }

    /// Forgets all tokens and returns to `Unauthenticated`. Never fails.
    pub async fn reset_session(&mut self) {
        self.session.reset_session().await
    }

    /// `true` iff an access token is stored.
    pub async fn is_authorized(&self) -> bool {
        self.session.is_authorized().await
    }

    /// Current handshake state, for the host to persist between requests.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Restores a handshake state persisted by the host.
    pub fn restore_session_state(&mut self, state: SessionState) {
        self.session.restore_state(state);
    }

    /// Sets the user that catalog methods act on when no user is given.
    pub fn set_user(&mut self, user_id: impl Into<String>) {
        self.user_id = user_id.into();
    }

    /// The effective user id; [`DEFAULT_USER_ID`] unless changed.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The response format fixed at construction.
    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    /// `explicit` if given, otherwise the effective user unless it is the
    /// "current user" sentinel.
    pub(crate) fn target_user(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| (self.user_id != DEFAULT_USER_ID).then(|| self.user_id.clone()))
    }

    // -- request execution -------------------------------------------------

    /// Signs and sends one request with the stored access token.
    ///
    /// `path` is relative to the API base, e.g. `users/get_user`. GET and
    /// DELETE send `params` in the query string, POST and PUT as a form body.
    /// Any caller-supplied `Authorization` header is replaced by the OAuth
    /// one.
    ///
    /// # Errors
    ///
    /// - [`MmfError::AuthRequired`] when no access token is stored; nothing
    ///   is sent in that case.
    /// - [`MmfError::Configuration`] for a path that is not relative.
    /// - [`MmfError::Transport`] when the request cannot be completed.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Params,
        headers: &[(String, String)],
    ) -> Result<ApiResponse> {
        let access_token = match self.storage.retrieve_access_token().await {
            Ok(token) => token,
            Err(MmfError::TokenNotFound(_)) => return Err(MmfError::AuthRequired),
            Err(e) => return Err(e),
        };

        let url = self.session.endpoints().resolve(path)?;
        let pairs = params.to_pairs();
        let authorization = OAuthSigner::new(self.session.credentials())
            .with_token(&access_token)
            .authorization_header(method, &url, &pairs);

        let mut request_headers: Vec<(String, String)> = headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
            .cloned()
            .collect();
        request_headers.push(("Authorization".to_string(), authorization));

        let request = HttpRequest {
            method,
            url,
            params: pairs,
            headers: request_headers,
        };
        let response = self.transport.send(request).await?;

        tracing::debug!(
            method = %method,
            path,
            status = response.status,
            "signed API request"
        );

        Ok(ApiResponse {
            status: response.status,
            body: response.body,
        })
    }

    /// GETs a catalog route with `o=<format>` and decodes the body.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// [`MmfError::Api`] for a non-2xx status and
    /// [`MmfError::MalformedResponse`] when the body does not decode.
    pub async fn fetch(&self, path: &str, params: Params) -> Result<Decoded> {
        let params = params.set("o", self.format.wire_name());
        let response = self.execute(HttpMethod::Get, path, &params, &[]).await?;

        if !response.is_success() {
            return Err(MmfError::Api {
                status: response.status,
                message: api_error_message(&response.body),
            });
        }
        decode(&response.body, self.format)
    }

    /// Calls any catalogued route with hand-built parameters.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use mapmyfitness::client::ApiClient;
    /// use mapmyfitness::catalog::{Endpoint, Params};
    ///
    /// # async fn run(client: &ApiClient) -> mapmyfitness::Result<()> {
    /// let types = client
    ///     .call_endpoint(Endpoint::GetRouteTypes, Params::new())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call_endpoint(&self, endpoint: Endpoint, params: Params) -> Result<Decoded> {
        self.fetch(endpoint.path(), params).await
    }

    /// Escape hatch for routes outside the catalog.
    ///
    /// Unlike [`fetch`](Self::fetch) no `o` parameter is added and the status
    /// is returned rather than checked. An error body that does not decode in
    /// the configured format is returned as [`Decoded::Raw`].
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// [`MmfError::MalformedResponse`] for a 2xx body that does not decode.
    pub async fn custom_call(
        &self,
        path: &str,
        params: &Params,
        method: HttpMethod,
        headers: &[(String, String)],
    ) -> Result<CustomResponse> {
        let response = self.execute(method, path, params, headers).await?;
        let decoded = match decode(&response.body, self.format) {
            Ok(decoded) => decoded,
            Err(_) if !response.is_success() => Decoded::Raw(response.body),
            Err(e) => return Err(e),
        };
        Ok(CustomResponse {
            status: response.status,
            response: decoded,
        })
    }
}

/// Best-effort message from an API error body.
fn api_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let candidates = [
            value.pointer("/result/errors/0"),
            value.pointer("/error/message"),
            value.get("error"),
            value.get("message"),
        ];
        if let Some(message) = candidates.into_iter().flatten().find_map(Value::as_str) {
            return message.to_string();
        }
    }

    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((end, _)) => format!("{}...", &trimmed[..end]),
        None => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
