//! Consumer credentials and OAuth 1.0a token pairs
//!
//! [`Credentials`] identify the application to MapMyFitness and are fixed
//! for the lifetime of a client. [`RequestToken`] and [`AccessToken`] are
//! the temporary and long-lived token/secret pairs produced by the two
//! handshake steps.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{MmfError, Result};

/// OAuth 1.0a out-of-band callback value, sent when no callback URL is set.
pub const OUT_OF_BAND_CALLBACK: &str = "oob";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Application-level credentials used to sign every request.
///
/// # Examples
///
/// ```
/// use mapmyfitness::auth::token::Credentials;
///
/// let creds = Credentials::new("ck", "cs", Some("https://app/cb")).unwrap();
/// assert_eq!(creds.callback(), "https://app/cb");
///
/// let cli = Credentials::new("ck", "cs", None).unwrap();
/// assert_eq!(cli.callback(), "oob");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
    callback: Option<Url>,
}

impl Credentials {
    /// Creates credentials from a consumer key, secret and optional callback.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] when the key or secret is empty or
    /// the callback is not an absolute URL.
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        callback_url: Option<&str>,
    ) -> Result<Self> {
        let consumer_key = consumer_key.into();
        let consumer_secret = consumer_secret.into();

        if consumer_key.trim().is_empty() {
            return Err(MmfError::Configuration(
                "consumer key cannot be empty".to_string(),
            ));
        }
        if consumer_secret.trim().is_empty() {
            return Err(MmfError::Configuration(
                "consumer secret cannot be empty".to_string(),
            ));
        }

        let callback = callback_url
            .map(|raw| {
                Url::parse(raw).map_err(|e| {
                    MmfError::Configuration(format!("invalid callback URL '{raw}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            consumer_key,
            consumer_secret,
            callback,
        })
    }

    /// Derives a callback URL from the URL of the request currently being
    /// served, with query string and fragment removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::auth::token::Credentials;
    /// use url::Url;
    ///
    /// let current = Url::parse("https://app.example.com/connect?step=2#top").unwrap();
    /// let cb = Credentials::callback_from_request_url(&current);
    /// assert_eq!(cb.as_str(), "https://app.example.com/connect");
    /// ```
    pub fn callback_from_request_url(current: &Url) -> Url {
        let mut callback = current.clone();
        callback.set_query(None);
        callback.set_fragment(None);
        callback
    }

    /// The consumer key.
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// The consumer secret.
    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    /// The callback URL, if one was configured.
    pub fn callback_url(&self) -> Option<&Url> {
        self.callback.as_ref()
    }

    /// The `oauth_callback` value sent with the request-token call.
    pub fn callback(&self) -> &str {
        self.callback
            .as_ref()
            .map(Url::as_str)
            .unwrap_or(OUT_OF_BAND_CALLBACK)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("callback", &self.callback())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Token pairs
// ---------------------------------------------------------------------------

/// Temporary token issued by the request-token endpoint (handshake step 1).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken {
    /// The `oauth_token` value.
    pub token: String,
    /// The `oauth_token_secret` value.
    pub token_secret: String,
}

/// Long-lived token issued by the access-token endpoint (handshake step 2).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The `oauth_token` value.
    pub token: String,
    /// The `oauth_token_secret` value.
    pub token_secret: String,
}

impl RequestToken {
    /// Creates a request token pair.
    pub fn new(token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }
}

impl AccessToken {
    /// Creates an access token pair.
    pub fn new(token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestToken")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
