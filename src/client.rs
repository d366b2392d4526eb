use std::time::Duration;

use anyhow::Result;
use axum::body::Bytes;
use axum::http::{StatusCode, header};
use reqwest::Client;
use url::Url;

use crate::credential::Credential;
use crate::endpoint::{BackendRequestSpec, RequestBody};
use crate::error::TransportError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// What the backend answered.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub type UpstreamResult = Result<UpstreamResponse, TransportError>;

/// Configuration for BackendClient
#[derive(Debug, Clone, Default)]
pub struct BackendClientConfig {
    /// Outbound timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

/// Makes the one outbound call each inbound request is allowed.
///
/// Cheap to clone; clones share the underlying connection pool. No retries
/// are attempted: whatever the first attempt yields is the answer.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: Client,
}

impl BackendClient {
    pub fn new() -> Result<Self> {
        Self::with_config(BackendClientConfig::default())
    }

    pub fn with_config(config: BackendClientConfig) -> Result<Self> {
        let mut http_builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        if let Some(timeout) = config.timeout {
            http_builder = http_builder.timeout(timeout);
        }

        Ok(Self {
            http_client: http_builder.build()?,
        })
    }

    pub async fn forward(
        &self,
        url: Url,
        spec: &BackendRequestSpec,
        credential: Option<&Credential>,
    ) -> UpstreamResult {
        tracing::debug!("Forwarding {} {}", spec.method, url);

        let mut request = self
            .http_client
            .request(spec.method.clone(), url)
            .header(header::ACCEPT, JSON_CONTENT_TYPE);

        for (name, value) in &spec.extra_headers {
            request = request.header(name, value);
        }

        if let Some(credential) = credential {
            request = request.bearer_auth(credential.token());
        }

        request = match &spec.body {
            RequestBody::Empty => request.header(header::CONTENT_TYPE, JSON_CONTENT_TYPE),
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart {
                content_type,
                bytes,
            } => request
                .header(header::CONTENT_TYPE, content_type.as_str())
                .body(bytes.clone()),
        };

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        tracing::debug!("Backend answered {} ({} bytes)", status, body.len());

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
