//! MapMyFitness OAuth 1.0a provider endpoints
//!
//! [`ProviderEndpoints`] holds the three handshake URLs plus the REST API
//! base. [`OAuthProvider`] performs the two token requests and builds the
//! authorization URL; it holds no state of its own.

use url::Url;

use crate::auth::oauth1::OAuthSigner;
use crate::auth::token::{AccessToken, Credentials, RequestToken};
use crate::error::{MmfError, Result};
use crate::transport::{HttpMethod, HttpRequest, Transport};

/// Request-token endpoint.
pub const DEFAULT_REQUEST_TOKEN_URL: &str = "https://api.mapmyfitness.com/3.1/oauth/request_token";
/// User authorization page.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.mapmyfitness.com/oauth/authorize/";
/// Access-token endpoint.
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://api.mapmyfitness.com/3.1/oauth/access_token";
/// REST API base; endpoint paths such as `users/get_user` resolve against it.
pub const DEFAULT_API_BASE: &str = "https://api.mapmyfitness.com/3.1/";

// ---------------------------------------------------------------------------
// ProviderEndpoints
// ---------------------------------------------------------------------------

/// URLs of the OAuth provider and the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Where step 1 obtains a request token.
    pub request_token_url: Url,
    /// Where the user approves access.
    pub authorize_url: Url,
    /// Where step 2 exchanges the verifier for an access token.
    pub access_token_url: Url,
    /// Base URL for REST calls. Always ends with `/`.
    pub api_base: Url,
}

impl ProviderEndpoints {
    /// Builds endpoints from explicit URLs.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] when a URL does not parse.
    pub fn new(
        request_token_url: &str,
        authorize_url: &str,
        access_token_url: &str,
        api_base: &str,
    ) -> Result<Self> {
        Ok(Self {
            request_token_url: parse_url("request token URL", request_token_url)?,
            authorize_url: parse_url("authorize URL", authorize_url)?,
            access_token_url: parse_url("access token URL", access_token_url)?,
            api_base: parse_api_base(api_base)?,
        })
    }

    /// Lays every endpoint out under a single root, the way the API itself
    /// does: `<root>/oauth/request_token`, `<root>/oauth/authorize/`,
    /// `<root>/oauth/access_token` and `<root>/` for REST calls.
    ///
    /// Handy for pointing the client at a local mock server.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::auth::provider::ProviderEndpoints;
    ///
    /// let endpoints = ProviderEndpoints::rooted_at("http://127.0.0.1:9000/3.1").unwrap();
    /// assert_eq!(
    ///     endpoints.request_token_url.as_str(),
    ///     "http://127.0.0.1:9000/3.1/oauth/request_token"
    /// );
    /// assert_eq!(endpoints.api_base.as_str(), "http://127.0.0.1:9000/3.1/");
    /// ```
    pub fn rooted_at(root: &str) -> Result<Self> {
        let api_base = parse_api_base(root)?;
        let join = |path: &str| {
            api_base.join(path).map_err(|e| {
                MmfError::Configuration(format!("cannot build endpoint '{path}' under {root}: {e}"))
            })
        };
        Ok(Self {
            request_token_url: join("oauth/request_token")?,
            authorize_url: join("oauth/authorize/")?,
            access_token_url: join("oauth/access_token")?,
            api_base,
        })
    }

    /// Resolves an endpoint path such as `users/get_user` (leading `/`
    /// optional) against the API base.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] for an absolute URL or a path that
    /// does not join cleanly.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let relative = path.trim_start_matches('/');
        if relative.contains("://") {
            return Err(MmfError::Configuration(format!(
                "endpoint path must be relative to the API base, got '{path}'"
            )));
        }
        self.api_base
            .join(relative)
            .map_err(|e| MmfError::Configuration(format!("invalid endpoint path '{path}': {e}")))
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        // The defaults are compile-time constants known to parse.
        Self {
            request_token_url: Url::parse(DEFAULT_REQUEST_TOKEN_URL)
                .expect("default request token URL is valid"),
            authorize_url: Url::parse(DEFAULT_AUTHORIZE_URL).expect("default authorize URL is valid"),
            access_token_url: Url::parse(DEFAULT_ACCESS_TOKEN_URL)
                .expect("default access token URL is valid"),
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base is valid"),
        }
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| MmfError::Configuration(format!("invalid {what} '{raw}': {e}")))
}

/// Parses the API base and makes sure it ends with `/` so `join` appends
/// rather than replaces the last segment.
fn parse_api_base(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    parse_url("API base URL", &normalized)
}

// ---------------------------------------------------------------------------
// OAuthProvider
// ---------------------------------------------------------------------------

/// Talks to the provider's OAuth endpoints.
#[derive(Debug)]
pub struct OAuthProvider<'a> {
    credentials: &'a Credentials,
    endpoints: &'a ProviderEndpoints,
    transport: &'a dyn Transport,
}

impl<'a> OAuthProvider<'a> {
    /// Creates a provider view over borrowed collaborators.
    pub fn new(
        credentials: &'a Credentials,
        endpoints: &'a ProviderEndpoints,
        transport: &'a dyn Transport,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            transport,
        }
    }

    /// Handshake step 1: obtains a request token, sending `oauth_callback`.
    ///
    /// # Errors
    ///
    /// - [`MmfError::Transport`] if the provider cannot be reached.
    /// - [`MmfError::AuthFailure`] if the provider answers with a non-2xx
    ///   status, omits the token, or does not confirm the callback.
    pub async fn request_request_token(&self) -> Result<RequestToken> {
        let url = self.endpoints.request_token_url.clone();
        let header = OAuthSigner::new(self.credentials)
            .with_callback()
            .authorization_header(HttpMethod::Post, &url, &[]);

        let response = self
            .transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url,
                params: Vec::new(),
                headers: vec![("Authorization".to_string(), header)],
            })
            .await?;

        if !response.is_success() {
            return Err(MmfError::AuthFailure(format!(
                "request token endpoint returned {}: {}",
                response.status,
                response.body.trim()
            )));
        }

        let fields = TokenResponse::parse(&response.body)?;
        if let Some(confirmed) = &fields.callback_confirmed {
            if confirmed != "true" {
                return Err(MmfError::AuthFailure(
                    "provider did not confirm the callback URL".to_string(),
                ));
            }
        }

        Ok(RequestToken::new(fields.token, fields.token_secret))
    }

    /// The URL the user must visit to approve `request_token`.
    pub fn authorization_url(&self, request_token: &RequestToken) -> Url {
        let mut url = self.endpoints.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("oauth_token", &request_token.token);
        url
    }

    /// Handshake step 2: exchanges the request token and verifier for an
    /// access token, signing with the request token secret.
    ///
    /// Every failure, including an unreachable provider, is reported as
    /// [`MmfError::AuthFailure`].
    pub async fn request_access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken> {
        let url = self.endpoints.access_token_url.clone();
        let header = OAuthSigner::new(self.credentials)
            .with_token(request_token)
            .with_verifier(verifier)
            .authorization_header(HttpMethod::Post, &url, &[]);

        let response = self
            .transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url,
                params: Vec::new(),
                headers: vec![("Authorization".to_string(), header)],
            })
            .await
            .map_err(|e| MmfError::AuthFailure(format!("access token exchange failed: {e}")))?;

        if !response.is_success() {
            return Err(MmfError::AuthFailure(format!(
                "access token endpoint returned {}: {}",
                response.status,
                response.body.trim()
            )));
        }

        let fields = TokenResponse::parse(&response.body)?;
        Ok(AccessToken::new(fields.token, fields.token_secret))
    }
}

// ---------------------------------------------------------------------------
// Token endpoint response
// ---------------------------------------------------------------------------

/// Fields of a form-encoded token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenResponse {
    token: String,
    token_secret: String,
    callback_confirmed: Option<String>,
}

impl TokenResponse {
    /// Parses `oauth_token=...&oauth_token_secret=...[&oauth_callback_confirmed=...]`.
    fn parse(body: &str) -> Result<Self> {
        let mut token = None;
        let mut token_secret = None;
        let mut callback_confirmed = None;

        for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
            match key.as_ref() {
                "oauth_token" => token = Some(value.into_owned()),
                "oauth_token_secret" => token_secret = Some(value.into_owned()),
                "oauth_callback_confirmed" => callback_confirmed = Some(value.into_owned()),
                _ => {}
            }
        }

        match (token, token_secret) {
            (Some(token), Some(token_secret)) if !token.is_empty() => Ok(Self {
                token,
                token_secret,
                callback_confirmed,
            }),
            _ => Err(MmfError::AuthFailure(
                "token response is missing oauth_token or oauth_token_secret".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
