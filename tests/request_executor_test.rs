//! Signed request integration tests
//!
//! Exercises `fetch`, `call_endpoint`, the typed wrappers and `custom_call`
//! end to end: real `HttpTransport`, `wiremock` API server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mapmyfitness::auth::{AccessToken, ProviderEndpoints};
use mapmyfitness::catalog::RouteRef;
use mapmyfitness::storage::MemoryTokenStorage;
use mapmyfitness::transport::{HttpMethod, HttpTransport};
use mapmyfitness::{ApiClient, ClientOptions, Decoded, Endpoint, MmfError, Params};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_client(server: &MockServer, storage: MemoryTokenStorage, format: &str) -> ApiClient {
    let endpoints = ProviderEndpoints::rooted_at(&format!("{}/3.1", server.uri())).unwrap();
    let options = ClientOptions::new("ck", "cs")
        .with_response_format(format)
        .with_endpoints(endpoints);
    let transport = HttpTransport::new(Duration::from_secs(5), None).unwrap();
    ApiClient::new(options, Arc::new(storage), Arc::new(transport)).unwrap()
}

fn authorized(server: &MockServer, format: &str) -> ApiClient {
    let storage = MemoryTokenStorage::with_access_token(AccessToken::new("A", "AS"));
    make_client(server, storage, format)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unauthorized_call_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = make_client(&server, MemoryTokenStorage::new(), "json");
    let result = client.get_user(None, None).await;

    assert!(matches!(result, Err(MmfError::AuthRequired)));
}

#[tokio::test]
async fn test_get_user_is_signed_and_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3.1/users/get_user"))
        .and(query_param("o", "json"))
        .and(query_param("user_id", "42"))
        .and(header_exists("Authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"result":{"output":{"user":{"user_id":"42"}}}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = authorized(&server, "json");
    let decoded = client.get_user(Some("42"), None).await.unwrap();

    assert_eq!(
        decoded.as_json().unwrap()["result"]["output"]["user"]["user_id"],
        "42"
    );
}

#[tokio::test]
async fn test_call_endpoint_uses_catalog_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3.1/routes/get_route_types"))
        .and(query_param("o", "xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<result><output><route_type><id>1</id></route_type></output></result>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = authorized(&server, "xml");
    let decoded = client
        .call_endpoint(Endpoint::GetRouteTypes, Params::new())
        .await
        .unwrap();

    let root = decoded.as_xml().expect("xml body");
    assert_eq!(root.name, "result");
}

#[tokio::test]
async fn test_error_status_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3.1/routes/get_route"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"result":{"errors":["Route not found"]}}"#),
        )
        .mount(&server)
        .await;

    let client = authorized(&server, "json");
    let err = client
        .get_route(&RouteRef::Id(7), &Default::default())
        .await
        .unwrap_err();

    match err {
        MmfError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Route not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = authorized(&server, "json");
    let result = client.get_route_types().await;
    assert!(matches!(result, Err(MmfError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_custom_call_posts_form_without_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/3.1/workouts/create_workout"))
        .and(body_string_contains("workout_description=Easy"))
        .and(header_exists("X-Trace"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = authorized(&server, "json");
    let params = Params::new().set("workout_description", "Easy");
    let headers = vec![("X-Trace".to_string(), "abc".to_string())];
    let response = client
        .custom_call("workouts/create_workout", &params, HttpMethod::Post, &headers)
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.response.as_json().unwrap()["ok"], true);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("o=json"));
}

#[tokio::test]
async fn test_custom_call_keeps_undecodable_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let client = authorized(&server, "json");
    let response = client
        .custom_call("users/get_user", &Params::new(), HttpMethod::Get, &[])
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(
        response.response,
        Decoded::Raw("Service Unavailable".to_string())
    );
}
