//! Endpoint definitions and the per-request outbound call description.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use serde_json::Value;
use url::Url;

use crate::backend_url::{BackendBase, build_url};
use crate::credential::CredentialPolicy;
use crate::envelope::ResponseShape;
use crate::error::GatewayError;

/// Inbound headers relayed to the backend unchanged.
static FORWARDED_HEADERS: [HeaderName; 1] = [header::ACCEPT_LANGUAGE];

/// Optional query parameter an endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParam {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

impl QueryParam {
    pub const fn optional(name: &'static str) -> Self {
        Self { name, default: None }
    }

    pub const fn with_default(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }
}

/// One storefront endpoint and the backend resource it maps to.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub method: Method,
    /// Inbound route, axum syntax (`/api/orders/:id`).
    pub route: &'static str,
    /// Backend path below the `/api` prefix (`/orders/{id}`).
    pub backend_path: &'static str,
    pub credential: CredentialPolicy,
    pub shape: ResponseShape,
    pub query: Vec<QueryParam>,
    pub required_fields: Vec<&'static str>,
    pub multipart: bool,
}

impl EndpointSpec {
    pub fn new(
        name: &'static str,
        method: Method,
        route: &'static str,
        backend_path: &'static str,
    ) -> Self {
        Self {
            name,
            method,
            route,
            backend_path,
            credential: CredentialPolicy::Required,
            shape: ResponseShape::Normalized,
            query: Vec::new(),
            required_fields: Vec::new(),
            multipart: false,
        }
    }

    pub fn get(name: &'static str, route: &'static str, backend_path: &'static str) -> Self {
        Self::new(name, Method::GET, route, backend_path)
    }

    pub fn post(name: &'static str, route: &'static str, backend_path: &'static str) -> Self {
        Self::new(name, Method::POST, route, backend_path)
    }

    pub fn put(name: &'static str, route: &'static str, backend_path: &'static str) -> Self {
        Self::new(name, Method::PUT, route, backend_path)
    }

    pub fn patch(name: &'static str, route: &'static str, backend_path: &'static str) -> Self {
        Self::new(name, Method::PATCH, route, backend_path)
    }

    pub fn delete(name: &'static str, route: &'static str, backend_path: &'static str) -> Self {
        Self::new(name, Method::DELETE, route, backend_path)
    }

    pub fn public(mut self) -> Self {
        self.credential = CredentialPolicy::Public;
        self
    }

    pub fn optional_auth(mut self) -> Self {
        self.credential = CredentialPolicy::Optional;
        self
    }

    pub fn body_credential(mut self, field: &'static str) -> Self {
        self.credential = CredentialPolicy::BodyField(field);
        self
    }

    pub fn raw(mut self) -> Self {
        self.shape = ResponseShape::Raw;
        self
    }

    pub fn query(mut self, params: &[QueryParam]) -> Self {
        self.query.extend_from_slice(params);
        self
    }

    pub fn requires(mut self, fields: &[&'static str]) -> Self {
        self.required_fields.extend_from_slice(fields);
        self
    }

    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    /// Whether the inbound method carries a body worth forwarding.
    pub fn has_body(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::DELETE)
    }

    /// Match a concrete path against this endpoint's route, returning the
    /// captured path parameters percent-decoded, the same as axum's `Path`.
    /// Used outside the axum router (CLI, probes).
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let route: Vec<&str> = self.route.split('/').filter(|s| !s.is_empty()).collect();
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if route.len() != actual.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (expected, got) in route.iter().zip(actual.iter()) {
            match expected.strip_prefix(':') {
                Some(name) => {
                    let value = urlencoding::decode(got).ok()?;
                    params.insert(name.to_string(), value.into_owned());
                }
                None if expected == got => {}
                None => return None,
            }
        }
        Some(params)
    }

    /// Pick declared query parameters out of a raw inbound query string.
    ///
    /// Undeclared parameters are dropped. A declared parameter that is absent
    /// or empty falls back to its default, or stays absent.
    pub fn resolve_query(&self, raw: Option<&str>) -> Vec<(String, Option<String>)> {
        let inbound: Vec<(String, String)> = raw
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        self.query
            .iter()
            .map(|param| {
                let value = inbound
                    .iter()
                    .find(|(k, v)| k == param.name && !v.is_empty())
                    .map(|(_, v)| v.clone())
                    .or_else(|| param.default.map(str::to_string));
                (param.name.to_string(), value)
            })
            .collect()
    }
}

/// Body of an outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Passed through byte for byte with the caller's content type.
    Multipart { content_type: String, bytes: Bytes },
}

/// Everything needed to make the single outbound call for one request.
#[derive(Debug, Clone)]
pub struct BackendRequestSpec {
    pub method: Method,
    pub path_template: &'static str,
    pub path_params: HashMap<String, String>,
    pub query: Vec<(String, Option<String>)>,
    pub body: RequestBody,
    pub extra_headers: Vec<(HeaderName, HeaderValue)>,
}

impl BackendRequestSpec {
    pub fn url(&self, base: &BackendBase) -> Result<Url, GatewayError> {
        build_url(base, self.path_template, &self.path_params, &self.query)
    }
}

/// The parts of an inbound request the adapter looks at.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub path_params: HashMap<String, String>,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn forwarded_headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        FORWARDED_HEADERS
            .iter()
            .filter_map(|name| {
                self.headers
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }
}
