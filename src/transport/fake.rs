//! In-process recording transport for unit tests
//!
//! [`FakeTransport`] never touches the network. Every request handed to
//! [`Transport::send`] is recorded, and responses are served from a FIFO
//! queue filled by the test. Sending with an empty queue fails with
//! [`MmfError::Transport`], which doubles as a "no network I/O expected"
//! assertion.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{MmfError, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Recording fake for the [`Transport`] trait.
#[derive(Debug, Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
}

impl FakeTransport {
    /// Creates a fake with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with the given status and body.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("FakeTransport: response queue poisoned")
            .push_back(Ok(HttpResponse {
                status,
                body: body.into(),
            }));
    }

    /// Queues a transport-level failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .expect("FakeTransport: response queue poisoned")
            .push_back(Err(MmfError::Transport(message.into())));
    }

    /// Number of requests sent so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .expect("FakeTransport: request log poisoned")
            .len()
    }

    /// Snapshot of every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("FakeTransport: request log poisoned")
            .clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests().pop()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .expect("FakeTransport: request log poisoned")
            .push(request);

        self.responses
            .lock()
            .expect("FakeTransport: response queue poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(MmfError::Transport(
                    "FakeTransport: no response queued".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpMethod;
    use url::Url;

    fn request(path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: Url::parse(&format!("https://api.example.com/{path}")).unwrap(),
            params: vec![],
            headers: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_records_request_and_serves_queued_response() {
        let transport = FakeTransport::new();
        transport.push_response(200, "hello");

        let response = transport.send(request("a")).await.unwrap();

        assert_eq!(response.body, "hello");
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.last_request().unwrap().url.path(), "/a");
    }

    #[tokio::test]
    async fn test_responses_are_served_in_order() {
        let transport = FakeTransport::new();
        transport.push_response(200, "first");
        transport.push_response(404, "second");

        assert_eq!(transport.send(request("a")).await.unwrap().body, "first");
        assert_eq!(transport.send(request("b")).await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_empty_queue_is_a_transport_error() {
        let transport = FakeTransport::new();
        let err = transport.send(request("a")).await.unwrap_err();
        assert!(matches!(err, MmfError::Transport(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_queued_failure_is_returned() {
        let transport = FakeTransport::new();
        transport.push_failure("connection reset");
        let err = transport.send(request("a")).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_fake_transport_is_object_safe() {
        let _boxed: Box<dyn Transport> = Box::new(FakeTransport::new());
    }
}
