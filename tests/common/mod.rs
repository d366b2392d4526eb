#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};

use storefront_gateway::{Adapter, BackendBase, BackendClient, BackendClientConfig, build_app};

/// One request the mock backend saw.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept_language: Option<String>,
    pub body: Bytes,
}

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
}

/// Stand-in for the real backend: records every call and answers with
/// whatever was configured for the path.
pub struct MockBackend {
    pub base_url: String,
    state: MockState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(record).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Answer `path` (e.g. `/api/cart/update`) with `status` and `body`.
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    /// Hold the answer for `path` back by `delay`.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(path.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.calls.lock().unwrap().push(RecordedCall {
        method,
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        accept_language: header_str(header::ACCEPT_LANGUAGE),
        body,
    });

    let delay = state.delays.lock().unwrap().get(uri.path()).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .get(uri.path())
        .cloned()
        .unwrap_or((200, r#"{"success":true,"data":null}"#.to_string()));

    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// The gateway under test, bound to an ephemeral port.
pub struct TestGateway {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestGateway {
    pub async fn spawn(backend_url: Option<&str>) -> Self {
        Self::spawn_with(backend_url, BackendClientConfig::default()).await
    }

    pub async fn spawn_with(backend_url: Option<&str>, config: BackendClientConfig) -> Self {
        let adapter = Adapter::new(
            BackendBase::resolve(backend_url),
            BackendClient::with_config(config).unwrap(),
            "accessToken",
        );
        let app = build_app(adapter);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Backend and gateway wired together.
pub async fn setup() -> (MockBackend, TestGateway) {
    let backend = MockBackend::spawn().await;
    let gateway = TestGateway::spawn(Some(&backend.base_url)).await;
    (backend, gateway)
}

/// An address nothing listens on.
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
