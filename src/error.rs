//! Gateway error taxonomy.
//!
//! Every failure a route can produce is one of these variants, and every
//! variant renders as an [`ApiEnvelope`](crate::envelope::ApiEnvelope) with
//! `success: false`. Nothing escapes a route as a bare error body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::envelope::ApiEnvelope;

/// Message shown when the backend cannot be reached or answered nonsense.
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to reach the server, please try again later";
/// Message used when an endpoint needs a credential and none was sent.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required, please sign in";
/// Message used for every upstream 401, whatever the backend said.
pub const TOKEN_EXPIRED_MESSAGE: &str = "Token is invalid or has expired";
/// Message used when the backend base URL is unusable.
pub const INVALID_CONFIG_MESSAGE: &str = "Invalid API configuration";

/// Backend base URL could not be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("backend URL is not set")]
    MissingBackendUrl,

    #[error("backend URL is malformed: {0}")]
    MalformedBackendUrl(String),
}

/// Caller is not (or no longer) authenticated.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential supplied")]
    MissingCredential,

    #[error("backend rejected the credential")]
    TokenRejected,
}

/// The outbound call never produced an HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("backend request timed out")]
    Timeout,

    #[error("could not connect to backend: {0}")]
    Connect(String),

    #[error("backend request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("unauthorized: {0}")]
    Auth(#[from] AuthError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("upstream responded {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no such endpoint")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// The user-facing message. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Config(_) => INVALID_CONFIG_MESSAGE.to_string(),
            GatewayError::Auth(AuthError::MissingCredential) => AUTH_REQUIRED_MESSAGE.to_string(),
            GatewayError::Auth(AuthError::TokenRejected) => TOKEN_EXPIRED_MESSAGE.to_string(),
            GatewayError::Validation(msg) => msg.clone(),
            GatewayError::Upstream { message, .. } => message.clone(),
            GatewayError::Transport(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            GatewayError::NotFound => "Endpoint not found".to_string(),
            GatewayError::MethodNotAllowed => "Method not allowed".to_string(),
        }
    }

    pub fn into_envelope(self) -> (StatusCode, ApiEnvelope) {
        (self.status(), ApiEnvelope::failure(self.public_message()))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Config(e) => tracing::error!("Gateway misconfigured: {}", e),
            GatewayError::Transport(e) => tracing::error!("Backend unreachable: {}", e),
            _ => {}
        }

        let (status, envelope) = self.into_envelope();
        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::Config(ConfigError::MissingBackendUrl).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Auth(AuthError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::validation("missing sku").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Upstream {
                status: StatusCode::CONFLICT,
                message: "out of stock".to_string(),
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::Transport(TransportError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = GatewayError::Transport(TransportError::Connect(
            "tcp connect error: 10.0.0.3:4000".to_string(),
        ));
        assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);

        let err = GatewayError::Config(ConfigError::MalformedBackendUrl("::".to_string()));
        assert_eq!(err.public_message(), INVALID_CONFIG_MESSAGE);
    }

    #[test]
    fn test_envelope_is_failure() {
        let (status, envelope) = GatewayError::Auth(AuthError::TokenRejected).into_envelope();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!envelope.success);
        assert_eq!(envelope.message, TOKEN_EXPIRED_MESSAGE);
        assert!(envelope.data.is_none());
    }
}
