use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, RawQuery, State, rejection::BytesRejection},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
    routing::{MethodFilter, MethodRouter, get},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adapter::{Adapter, AdapterReply};
use crate::catalog;
use crate::endpoint::{EndpointSpec, InboundRequest};
use crate::error::GatewayError;

/// Uploads (product images, avatars) go through the gateway unbuffered by
/// anything else, so allow more than axum's 2 MiB default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    adapter: Arc<Adapter>,
    metrics: Arc<Metrics>,
}

/// Request counters behind `/api/metrics`.
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            requests_in_flight: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

/// A proxied request in progress; counted as in flight until dropped.
struct InFlight<'a> {
    metrics: &'a Metrics,
}

impl<'a> InFlight<'a> {
    fn start(metrics: &'a Metrics) -> Self {
        metrics.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        Self { metrics }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics
            .requests_in_flight
            .fetch_sub(1, Ordering::Relaxed);
    }
}

/// Build the Axum application: every catalog endpoint plus health and metrics.
pub fn build_app(adapter: Adapter) -> Router {
    build_app_with(adapter, catalog::catalog())
}

/// Same as [`build_app`] with an explicit endpoint list.
pub fn build_app_with(adapter: Adapter, endpoints: Vec<EndpointSpec>) -> Router {
    let state = AppState {
        adapter: Arc::new(adapter),
        metrics: Arc::new(Metrics::new()),
    };

    // One MethodRouter per path; several endpoints can share a path.
    let mut routes: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
    for endpoint in endpoints {
        let route = endpoint.route;
        let method_router = routes
            .remove(route)
            .unwrap_or_else(|| MethodRouter::new().fallback(method_not_allowed));
        routes.insert(route, add_endpoint(method_router, endpoint));
    }

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/metrics", get(get_metrics));

    for (path, method_router) in routes {
        router = router.route(path, method_router);
    }

    router
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

fn add_endpoint(
    method_router: MethodRouter<AppState>,
    endpoint: EndpointSpec,
) -> MethodRouter<AppState> {
    let filter = match MethodFilter::try_from(endpoint.method.clone()) {
        Ok(filter) => filter,
        Err(_) => {
            tracing::warn!("Skipping {}: unsupported method {}", endpoint.name, endpoint.method);
            return method_router;
        }
    };

    let endpoint = Arc::new(endpoint);
    method_router.on(
        filter,
        move |State(state): State<AppState>,
              params: Option<Path<HashMap<String, String>>>,
              RawQuery(query): RawQuery,
              headers: HeaderMap,
              body: Result<Bytes, BytesRejection>| {
            let endpoint = endpoint.clone();
            async move { proxy(state, &endpoint, params, query, headers, body).await }
        },
    )
}

async fn proxy(
    state: AppState,
    endpoint: &EndpointSpec,
    params: Option<Path<HashMap<String, String>>>,
    query: Option<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AdapterReply {
    let _in_flight = InFlight::start(&state.metrics);

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("{}: unreadable body: {}", endpoint.name, rejection);
            return AdapterReply::from(GatewayError::validation(rejection.body_text()));
        }
    };

    let inbound = InboundRequest {
        path_params: params.map(|Path(p)| p).unwrap_or_default(),
        query,
        headers,
        body,
    };

    state.adapter.handle(endpoint, inbound).await
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

async fn not_found() -> Response {
    GatewayError::NotFound.into_response()
}

async fn method_not_allowed() -> Response {
    GatewayError::MethodNotAllowed.into_response()
}
