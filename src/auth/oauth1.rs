//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! This module builds the `Authorization: OAuth ...` header for a single
//! request following RFC 5849:
//!
//! 1. Collect the protocol parameters (`oauth_consumer_key`, `oauth_nonce`,
//!    `oauth_signature_method`, `oauth_timestamp`, `oauth_version`, plus
//!    `oauth_token`, `oauth_callback` or `oauth_verifier` when present).
//! 2. Normalise them together with the query string and request parameters
//!    into the signature base string.
//! 3. Sign the base string with HMAC-SHA1 keyed by
//!    `encode(consumer_secret)&encode(token_secret)`.
//!
//! HMAC comes from `ring`; this module only does the parameter plumbing.
//!
//! # References
//!
//! - RFC 5849 The OAuth 1.0 Protocol <https://www.rfc-editor.org/rfc/rfc5849>

use base64::Engine as _;
use url::Url;

use crate::auth::token::{AccessToken, Credentials, RequestToken};
use crate::transport::HttpMethod;

/// The only signature method this client emits.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// OAuth protocol version sent with every request.
pub const OAUTH_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// TokenRef
// ---------------------------------------------------------------------------

/// Borrowed token/secret pair used to sign a request.
///
/// The request token signs the access-token exchange; the access token signs
/// every API call afterwards.
#[derive(Debug, Clone, Copy)]
pub struct TokenRef<'a> {
    /// Value sent as `oauth_token`.
    pub token: &'a str,
    /// Secret mixed into the signing key.
    pub secret: &'a str,
}

impl<'a> From<&'a AccessToken> for TokenRef<'a> {
    fn from(token: &'a AccessToken) -> Self {
        Self {
            token: &token.token,
            secret: &token.token_secret,
        }
    }
}

impl<'a> From<&'a RequestToken> for TokenRef<'a> {
    fn from(token: &'a RequestToken) -> Self {
        Self {
            token: &token.token,
            secret: &token.token_secret,
        }
    }
}

// ---------------------------------------------------------------------------
// OAuthSigner
// ---------------------------------------------------------------------------

/// Produces OAuth 1.0a `Authorization` headers for one request.
///
/// # Examples
///
/// ```
/// use mapmyfitness::auth::oauth1::OAuthSigner;
/// use mapmyfitness::auth::token::{AccessToken, Credentials};
/// use mapmyfitness::transport::HttpMethod;
/// use url::Url;
///
/// let creds = Credentials::new("ck", "cs", None).unwrap();
/// let token = AccessToken::new("tok", "secret");
/// let url = Url::parse("https://api.mapmyfitness.com/3.1/users/get_user").unwrap();
///
/// let header = OAuthSigner::new(&creds)
///     .with_token(&token)
///     .authorization_header(HttpMethod::Get, &url, &[("o".to_string(), "json".to_string())]);
///
/// assert!(header.starts_with("OAuth "));
/// assert!(header.contains("oauth_token=\"tok\""));
/// ```
#[derive(Debug, Clone)]
pub struct OAuthSigner<'a> {
    credentials: &'a Credentials,
    token: Option<TokenRef<'a>>,
    extra: Vec<(&'static str, String)>,
}

impl<'a> OAuthSigner<'a> {
    /// Creates a signer that signs with the consumer secret only.
    pub fn new(credentials: &'a Credentials) -> Self {
        Self {
            credentials,
            token: None,
            extra: Vec::new(),
        }
    }

    /// Signs with the given token pair in addition to the consumer secret.
    pub fn with_token(mut self, token: impl Into<TokenRef<'a>>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds `oauth_callback` (request-token step).
    pub fn with_callback(mut self) -> Self {
        self.extra
            .push(("oauth_callback", self.credentials.callback().to_string()));
        self
    }

    /// Adds `oauth_verifier` (access-token step).
    pub fn with_verifier(mut self, verifier: &str) -> Self {
        self.extra.push(("oauth_verifier", verifier.to_string()));
        self
    }

    /// Builds the `Authorization` header value with a fresh nonce and the
    /// current timestamp.
    ///
    /// `params` are the query or form parameters that will be sent with the
    /// request; they take part in the signature but are not copied into the
    /// header.
    pub fn authorization_header(
        &self,
        method: HttpMethod,
        url: &Url,
        params: &[(String, String)],
    ) -> String {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_at(method, url, params, &nonce, &timestamp)
    }

    /// Deterministic variant of [`authorization_header`](Self::authorization_header).
    pub fn authorization_header_at(
        &self,
        method: HttpMethod,
        url: &Url,
        params: &[(String, String)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let mut oauth_params = self.protocol_parameters(nonce, timestamp);
        let signature = self.signature_at(method, url, params, &oauth_params);
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();

        format!("OAuth {}", fields.join(", "))
    }

    fn signature_at(
        &self,
        method: HttpMethod,
        url: &Url,
        params: &[(String, String)],
        oauth_params: &[(String, String)],
    ) -> String {
        let mut all: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        all.extend(params.iter().cloned());
        all.extend(oauth_params.iter().cloned());

        let base = signature_base_string(method, url, &all);
        let token_secret = self.token.map(|t| t.secret).unwrap_or("");
        sign_hmac_sha1(&base, self.credentials.consumer_secret(), token_secret)
    }

    fn protocol_parameters(&self, nonce: &str, timestamp: &str) -> Vec<(String, String)> {
        let mut params = vec![
            (
                "oauth_consumer_key".to_string(),
                self.credentials.consumer_key().to_string(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = self.token {
            params.push(("oauth_token".to_string(), token.token.to_string()));
        }
        for (key, value) in &self.extra {
            params.push((key.to_string(), value.clone()));
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Signature primitives
// ---------------------------------------------------------------------------

/// Percent-encodes a string with the RFC 3986 unreserved set
/// (`A-Z a-z 0-9 - . _ ~` pass through).
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Builds the signature base string from the HTTP method, the request URL
/// (scheme, authority and path only) and every parameter taking part in
/// the signature.
pub fn signature_base_string(method: HttpMethod, url: &Url, params: &[(String, String)]) -> String {
    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(&base_string_uri(url)),
        percent_encode(&normalize_parameters(params))
    )
}

/// Computes `base64(HMAC-SHA1(key, base))` with the OAuth signing key.
pub fn sign_hmac_sha1(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let key = ring::hmac::Key::new(
        ring::hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        signing_key.as_bytes(),
    );
    let tag = ring::hmac::sign(&key, base.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
}

/// `scheme://host[:port]/path`, default ports omitted.
fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Encodes every pair, sorts by encoded key then encoded value, and joins
/// them as `k=v&k=v`.
fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "oauth_signature" && k != "realm")
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// 16 random bytes, base64url without padding.
fn generate_nonce() -> String {
    use rand::RngCore as _;
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // percent_encode
    // -----------------------------------------------------------------------

    #[test]
    fn test_percent_encode_keeps_unreserved_characters() {
        assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn test_percent_encode_escapes_space_and_reserved() {
        assert_eq!(percent_encode("a b+c/d"), "a%20b%2Bc%2Fd");
        assert_eq!(percent_encode("!"), "%21");
    }

    // -----------------------------------------------------------------------
    // Known signature vectors
    // -----------------------------------------------------------------------

    /// OAuth Core 1.0 Appendix A.5 (photos.example.net).
    #[test]
    fn test_signature_matches_oauth_core_appendix_example() {
        let creds = Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44", None).unwrap();
        let token = AccessToken::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00");
        let url = Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original")
            .unwrap();

        let signer = OAuthSigner::new(&creds).with_token(&token);
        let oauth = signer.protocol_parameters("kllo9940pd9333jh", "1191242096");

        let mut all: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        all.extend(oauth.iter().cloned());
        let base = signature_base_string(HttpMethod::Get, &url, &all);
        assert_eq!(
            base,
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg\
             %26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh\
             %26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096\
             %26oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal"
        );

        let signature = signer.signature_at(HttpMethod::Get, &url, &[], &oauth);
        assert_eq!(signature, "tR3+Ty81lMeYAr/Fid0kMTYa/WM=");
    }

    /// Twitter's published "creating a signature" walkthrough.
    #[test]
    fn test_signature_matches_twitter_walkthrough() {
        let creds = Credentials::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            None,
        )
        .unwrap();
        let token = AccessToken::new(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap();
        let params = pairs(&[
            ("include_entities", "true"),
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
        ]);

        let signer = OAuthSigner::new(&creds).with_token(&token);
        let oauth =
            signer.protocol_parameters("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg", "1318622958");
        let signature = signer.signature_at(HttpMethod::Post, &url, &params, &oauth);

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    // -----------------------------------------------------------------------
    // Header construction
    // -----------------------------------------------------------------------

    #[test]
    fn test_header_contains_callback_for_request_token_step() {
        let creds = Credentials::new("ck", "cs", Some("https://app/cb")).unwrap();
        let url = Url::parse("https://provider/request_token").unwrap();
        let header = OAuthSigner::new(&creds).with_callback().authorization_header_at(
            HttpMethod::Post,
            &url,
            &[],
            "nonce",
            "1",
        );

        assert!(header.starts_with("OAuth "), "{header}");
        assert!(
            header.contains("oauth_callback=\"https%3A%2F%2Fapp%2Fcb\""),
            "{header}"
        );
        assert!(header.contains("oauth_signature=\""), "{header}");
        assert!(!header.contains("oauth_token="), "{header}");
    }

    #[test]
    fn test_header_contains_token_and_verifier_for_access_step() {
        let creds = Credentials::new("ck", "cs", None).unwrap();
        let request = RequestToken::new("req", "req-secret");
        let url = Url::parse("https://provider/access_token").unwrap();
        let header = OAuthSigner::new(&creds)
            .with_token(&request)
            .with_verifier("V123")
            .authorization_header_at(HttpMethod::Post, &url, &[], "nonce", "1");

        assert!(header.contains("oauth_token=\"req\""), "{header}");
        assert!(header.contains("oauth_verifier=\"V123\""), "{header}");
        assert!(!header.contains("req-secret"), "{header}");
    }

    #[test]
    fn test_token_secret_changes_signature() {
        let creds = Credentials::new("ck", "cs", None).unwrap();
        let url = Url::parse("https://api.example.com/x").unwrap();
        let a = AccessToken::new("tok", "one");
        let b = AccessToken::new("tok", "two");

        let sig_a = OAuthSigner::new(&creds)
            .with_token(&a)
            .authorization_header_at(HttpMethod::Get, &url, &[], "n", "1");
        let sig_b = OAuthSigner::new(&creds)
            .with_token(&b)
            .authorization_header_at(HttpMethod::Get, &url, &[], "n", "1");
        assert_ne!(sig_a, sig_b);
    }

    #[test]
    fn test_base_string_uri_keeps_non_default_port() {
        let url = Url::parse("http://127.0.0.1:8080/api/3.1/users?x=1").unwrap();
        assert_eq!(base_string_uri(&url), "http://127.0.0.1:8080/api/3.1/users");

        let url = Url::parse("https://EXAMPLE.com:443/a").unwrap();
        assert_eq!(base_string_uri(&url), "https://example.com/a");
    }

    #[test]
    fn test_normalize_parameters_sorts_duplicate_keys_by_value() {
        let normalized = normalize_parameters(&pairs(&[("b", "2"), ("a", "z"), ("a", "y")]));
        assert_eq!(normalized, "a=y&a=z&b=2");
    }

    #[test]
    fn test_generate_nonce_is_unique() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
