//! Caller credentials.
//!
//! A credential is the bearer token the storefront holds for the signed-in
//! user. It is looked up the same way for every endpoint: the
//! `Authorization: Bearer` header first, then the access-token cookie.

use std::fmt;

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token, rejecting blank ones.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Token carried in a JSON body field, e.g. `refreshToken`.
    pub fn from_body(body: &Value, field: &str) -> Option<Self> {
        body.get(field)
            .and_then(Value::as_str)
            .and_then(Self::new)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// How an endpoint treats the caller's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// Never consulted and never forwarded.
    Public,
    /// Missing credential is a 401 before anything is sent upstream.
    Required,
    /// Forwarded when present; without one the `Authorization` header is omitted.
    Optional,
    /// Token travels in the named JSON body field instead of a header.
    BodyField(&'static str),
}

/// Look up the caller's bearer token: header first, then cookie.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<Credential> {
    bearer_from_header(headers).or_else(|| {
        CookieJar::from_headers(headers)
            .get(cookie_name)
            .and_then(|c| Credential::new(c.value()))
    })
}

fn bearer_from_header(headers: &HeaderMap) -> Option<Credential> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(Credential::new)
}
