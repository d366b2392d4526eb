//! The request pipeline every proxied endpoint runs through.
//!
//! ```text
//! Received → CredentialChecked → BodyValidated → Forwarded → Translated
//!               │ 401               │ 400           │ 500 (config)
//! ```
//!
//! Each stage either hands a value to the next one or ends the request with a
//! [`GatewayError`]. At most one upstream call is made per request and nothing
//! is retried.

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::backend_url::BackendBase;
use crate::client::{BackendClient, UpstreamResult};
use crate::config::GatewayConfig;
use crate::credential::{Credential, CredentialPolicy, extract_credential};
use crate::endpoint::{BackendRequestSpec, EndpointSpec, InboundRequest, RequestBody};
use crate::envelope::ResponseShape;
use crate::error::{AuthError, ConfigError, GENERIC_FAILURE_MESSAGE, GatewayError};

const MULTIPART_PREFIX: &str = "multipart/form-data";

/// Final answer for one inbound request: always a JSON envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterReply {
    pub status: StatusCode,
    pub body: Value,
}

impl AdapterReply {
    pub fn is_success(&self) -> bool {
        self.body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl From<GatewayError> for AdapterReply {
    fn from(err: GatewayError) -> Self {
        let (status, envelope) = err.into_envelope();
        Self {
            status,
            body: serde_json::to_value(envelope).unwrap_or(Value::Null),
        }
    }
}

impl IntoResponse for AdapterReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Owns everything a request needs: the resolved backend base, the outbound
/// client and the cookie name credentials fall back to.
#[derive(Debug, Clone)]
pub struct Adapter {
    base: Result<BackendBase, ConfigError>,
    client: BackendClient,
    access_cookie: String,
}

impl Adapter {
    pub fn new(
        base: Result<BackendBase, ConfigError>,
        client: BackendClient,
        access_cookie: impl Into<String>,
    ) -> Self {
        Self {
            base,
            client,
            access_cookie: access_cookie.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = BackendClient::with_config(crate::client::BackendClientConfig {
            timeout: config.backend_timeout,
        })?;
        Ok(Self::new(
            config.resolve_backend_base(),
            client,
            config.access_cookie.clone(),
        ))
    }

    pub fn backend_base(&self) -> Result<&BackendBase, &ConfigError> {
        self.base.as_ref()
    }

    /// Run one inbound request through the pipeline.
    pub async fn handle(&self, endpoint: &EndpointSpec, inbound: InboundRequest) -> AdapterReply {
        match self.run(endpoint, inbound).await {
            Ok(reply) => {
                tracing::info!("{} -> {}", endpoint.name, reply.status);
                reply
            }
            Err(err) => {
                match &err {
                    GatewayError::Config(e) => {
                        tracing::error!("{}: gateway misconfigured: {}", endpoint.name, e)
                    }
                    GatewayError::Transport(e) => {
                        tracing::error!("{}: backend unreachable: {}", endpoint.name, e)
                    }
                    other => tracing::warn!("{} -> {}", endpoint.name, other),
                }
                AdapterReply::from(err)
            }
        }
    }

    async fn run(
        &self,
        endpoint: &EndpointSpec,
        inbound: InboundRequest,
    ) -> Result<AdapterReply, GatewayError> {
        let credential = self.check_credential(endpoint, &inbound)?;
        let body = validate_body(endpoint, &inbound).await?;
        let base = self.base.as_ref().map_err(|e| e.clone())?;

        let spec = BackendRequestSpec {
            method: endpoint.method.clone(),
            path_template: endpoint.backend_path,
            path_params: inbound.path_params.clone(),
            query: endpoint.resolve_query(inbound.query.as_deref()),
            body,
            extra_headers: inbound.forwarded_headers(),
        };
        let url = spec.url(base)?;

        let result = self.client.forward(url, &spec, credential.as_ref()).await;
        translate(result, endpoint.shape)
    }

    /// Returns the credential to forward, if any.
    fn check_credential(
        &self,
        endpoint: &EndpointSpec,
        inbound: &InboundRequest,
    ) -> Result<Option<Credential>, GatewayError> {
        match endpoint.credential {
            CredentialPolicy::Public => Ok(None),
            CredentialPolicy::Optional => {
                Ok(extract_credential(&inbound.headers, &self.access_cookie))
            }
            CredentialPolicy::Required => extract_credential(&inbound.headers, &self.access_cookie)
                .map(Some)
                .ok_or(GatewayError::Auth(AuthError::MissingCredential)),
            CredentialPolicy::BodyField(field) => {
                let present = serde_json::from_slice::<Value>(&inbound.body)
                    .ok()
                    .and_then(|body| Credential::from_body(&body, field))
                    .is_some();
                if present {
                    // Travels in the body; no Authorization header.
                    Ok(None)
                } else {
                    Err(GatewayError::Auth(AuthError::MissingCredential))
                }
            }
        }
    }
}

/// Turn the inbound body into the outbound one, checking required fields.
async fn validate_body(
    endpoint: &EndpointSpec,
    inbound: &InboundRequest,
) -> Result<RequestBody, GatewayError> {
    if !endpoint.has_body() {
        return Ok(RequestBody::Empty);
    }

    if let Some(content_type) = inbound.content_type()
        && content_type.starts_with(MULTIPART_PREFIX)
    {
        if !endpoint.multipart {
            return Err(GatewayError::validation("File uploads are not accepted here"));
        }
        if !endpoint.required_fields.is_empty() {
            let filled = multipart_fields(content_type, inbound.body.clone()).await?;
            let missing: Vec<&str> = endpoint
                .required_fields
                .iter()
                .copied()
                .filter(|field| !filled.iter().any(|name| name == field))
                .collect();
            if !missing.is_empty() {
                return Err(missing_fields_error(&missing));
            }
        }
        return Ok(RequestBody::Multipart {
            content_type: content_type.to_string(),
            bytes: inbound.body.clone(),
        });
    }

    if inbound.body.iter().all(u8::is_ascii_whitespace) {
        return match missing_fields(endpoint, None) {
            missing if missing.is_empty() => Ok(RequestBody::Empty),
            missing => Err(missing_fields_error(&missing)),
        };
    }

    let value: Value = serde_json::from_slice(&inbound.body)
        .map_err(|_| GatewayError::validation("Invalid request body"))?;

    let missing = missing_fields(endpoint, Some(&value));
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    Ok(RequestBody::Json(value))
}

fn missing_fields(endpoint: &EndpointSpec, body: Option<&Value>) -> Vec<&'static str> {
    endpoint
        .required_fields
        .iter()
        .copied()
        .filter(|field| {
            match body.and_then(|b| b.get(*field)) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            }
        })
        .collect()
}

/// Names of the multipart parts that carry something: a file, or non-blank text.
async fn multipart_fields(content_type: &str, bytes: Bytes) -> Result<Vec<String>, GatewayError> {
    let invalid = || GatewayError::validation("Invalid multipart body");

    let request = Request::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .map_err(|_| invalid())?;
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|_| invalid())?;

    let mut filled = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| invalid())? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let present = if field.file_name().is_some() {
            !field.bytes().await.map_err(|_| invalid())?.is_empty()
        } else {
            !field.text().await.map_err(|_| invalid())?.trim().is_empty()
        };
        if present {
            filled.push(name);
        }
    }
    Ok(filled)
}

fn missing_fields_error(missing: &[&str]) -> GatewayError {
    GatewayError::validation(format!("Missing required fields: {}", missing.join(", ")))
}

/// Map what the backend did into the caller's answer.
///
/// - transport failure: 500, generic message
/// - upstream 401: local 401, fixed token message
/// - other non-2xx: mirrored status, upstream `message` or the generic one
/// - 2xx: payload shaped per endpoint
pub fn translate(result: UpstreamResult, shape: ResponseShape) -> Result<AdapterReply, GatewayError> {
    let upstream = result?;

    if upstream.status == StatusCode::UNAUTHORIZED {
        return Err(GatewayError::Auth(AuthError::TokenRejected));
    }

    if !upstream.status.is_success() {
        let message = serde_json::from_slice::<Value>(&upstream.body)
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        return Err(GatewayError::Upstream {
            status: upstream.status,
            message,
        });
    }

    // 204 cannot carry the envelope.
    let status = match upstream.status {
        StatusCode::NO_CONTENT => StatusCode::OK,
        other => other,
    };

    if upstream.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AdapterReply {
            status,
            body: shape.shape(None),
        });
    }

    let payload: Value = serde_json::from_slice(&upstream.body).map_err(|_| {
        tracing::warn!(
            "Backend sent a non-JSON {} body ({})",
            upstream.status,
            upstream.content_type.as_deref().unwrap_or("no content type")
        );
        GatewayError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    })?;

    Ok(AdapterReply {
        status,
        body: shape.shape(Some(payload)),
    })
}
