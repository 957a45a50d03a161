//! OAuth 1.0a handshake integration tests
//!
//! Drives `ApiClient::init_session` against a `wiremock` provider through the
//! real `HttpTransport`, from the first plain visit to a stored access token.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mapmyfitness::auth::ProviderEndpoints;
use mapmyfitness::storage::MemoryTokenStorage;
use mapmyfitness::transport::HttpTransport;
use mapmyfitness::{
    ApiClient, CallbackParams, ClientOptions, MmfError, SessionOutcome, SessionState,
    TokenStorage,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_client(server: &MockServer, storage: Arc<MemoryTokenStorage>) -> ApiClient {
    let endpoints =
        ProviderEndpoints::rooted_at(&format!("{}/3.1", server.uri())).expect("valid root");
    let options = ClientOptions::new("ck", "cs")
        .with_callback_url("https://app/cb")
        .with_endpoints(endpoints);
    let transport = HttpTransport::new(Duration::from_secs(5), None).expect("transport");
    ApiClient::new(options, storage, Arc::new(transport)).expect("client")
}

async fn mount_request_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/3.1/oauth/request_token"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=T&oauth_token_secret=TS&oauth_callback_confirmed=true",
        ))
        .mount(server)
        .await;
}

fn authorization_of(request: &wiremock::Request) -> String {
    request
        .headers
        .iter()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("authorization"))
        .map(|(_, values)| {
            values
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_plain_visit_redirects_to_authorize_url() {
    let server = MockServer::start().await;
    mount_request_token(&server).await;

    let storage = Arc::new(MemoryTokenStorage::new());
    let mut client = make_client(&server, storage.clone());

    let outcome = client.init_session(None).await.unwrap();
    let url = outcome.redirect_url().expect("redirect").clone();

    assert!(url.as_str().starts_with(&format!("{}/3.1/oauth/authorize/", server.uri())));
    assert_eq!(url.query(), Some("oauth_token=T"));
    assert_eq!(client.session_state(), SessionState::AwaitingCallback);
    assert_eq!(storage.retrieve_request_token().await.unwrap().token, "T");

    let requests = server.received_requests().await.unwrap();
    let header = authorization_of(&requests[0]);
    assert!(header.starts_with("OAuth "));
    assert!(header.contains("oauth_consumer_key=\"ck\""));
    assert!(header.contains("oauth_callback=\"https%3A%2F%2Fapp%2Fcb\""));
    assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
}

#[tokio::test]
async fn test_callback_completes_handshake() {
    let server = MockServer::start().await;
    mount_request_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/3.1/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=A&oauth_token_secret=AS"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryTokenStorage::new());
    let mut client = make_client(&server, storage.clone());

    client.init_session(None).await.unwrap();
    let callback = CallbackParams::from_query("oauth_token=T&oauth_verifier=V123").unwrap();
    let outcome = client.init_session(Some(&callback)).await.unwrap();

    assert_eq!(outcome, SessionOutcome::AccessGranted);
    assert_eq!(client.session_state(), SessionState::Authorized);
    assert!(client.is_authorized().await);

    let token = storage.retrieve_access_token().await.unwrap();
    assert_eq!(token.token, "A");
    assert!(matches!(
        storage.retrieve_request_token().await,
        Err(MmfError::TokenNotFound(_))
    ));

    let requests = server.received_requests().await.unwrap();
    let exchange = authorization_of(&requests[1]);
    assert!(exchange.contains("oauth_token=\"T\""));
    assert!(exchange.contains("oauth_verifier=\"V123\""));

    // A further visit is a no-op
    let again = client.init_session(None).await.unwrap();
    assert_eq!(again, SessionOutcome::AlreadyAuthorized);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_verifier_is_auth_failure() {
    let server = MockServer::start().await;
    mount_request_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/3.1/oauth/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("oauth_problem=verifier_invalid"))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryTokenStorage::new());
    let mut client = make_client(&server, storage.clone());

    client.init_session(None).await.unwrap();
    let callback = CallbackParams::new("T", "WRONG");
    let result = client.init_session(Some(&callback)).await;

    assert!(matches!(result, Err(MmfError::AuthFailure(_))));
    assert!(!client.is_authorized().await);
    assert_ne!(client.session_state(), SessionState::Authorized);
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    // Nothing listens on port 1
    let endpoints = ProviderEndpoints::rooted_at("http://127.0.0.1:1/3.1").unwrap();
    let options = ClientOptions::new("ck", "cs").with_endpoints(endpoints);
    let transport = HttpTransport::new(Duration::from_secs(2), None).unwrap();
    let mut client =
        ApiClient::new(options, Arc::new(MemoryTokenStorage::new()), Arc::new(transport))
            .unwrap();

    let result = client.init_session(None).await;
    assert!(matches!(result, Err(MmfError::Transport(_))));
    assert_eq!(client.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_reset_session_forgets_access() {
    let server = MockServer::start().await;
    mount_request_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/3.1/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=A&oauth_token_secret=AS"),
        )
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryTokenStorage::new());
    let mut client = make_client(&server, storage.clone());
    client.init_session(None).await.unwrap();
    client
        .init_session(Some(&CallbackParams::new("T", "V123")))
        .await
        .unwrap();
    assert!(client.is_authorized().await);

    client.reset_session().await;
    assert!(!client.is_authorized().await);
    assert_eq!(client.session_state(), SessionState::Unauthenticated);
    assert!(!storage.has_access_token().await);
}
