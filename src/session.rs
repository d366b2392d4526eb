//! Caller-owned session check with a cooldown.
//!
//! The storefront re-validates the signed-in user's token now and then. The
//! probe remembers when it last asked; whoever owns the probe decides its
//! lifetime, so two probes never share a timestamp.

use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderValue, header};

use crate::adapter::{Adapter, AdapterReply};
use crate::catalog;
use crate::credential::Credential;
use crate::endpoint::InboundRequest;
use crate::error::GatewayError;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AuthProbe {
    cooldown: Duration,
    last_checked: Option<Instant>,
}

impl AuthProbe {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_checked: None,
        }
    }

    pub fn last_checked(&self) -> Option<Instant> {
        self.last_checked
    }

    /// True when never checked, or when the cooldown has run out at `now`.
    pub fn needs_check(&self, now: Instant) -> bool {
        match self.last_checked {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.cooldown,
        }
    }

    /// Ask the backend who `credential` belongs to.
    pub async fn verify(&mut self, adapter: &Adapter, credential: &Credential) -> AdapterReply {
        self.last_checked = Some(Instant::now());

        let Some(endpoint) = catalog::find("auth.me") else {
            return AdapterReply::from(GatewayError::NotFound);
        };

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&format!("Bearer {}", credential.token())) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => {
                return AdapterReply::from(GatewayError::validation("Malformed token"));
            }
        }

        adapter
            .handle(
                &endpoint,
                InboundRequest {
                    headers,
                    ..Default::default()
                },
            )
            .await
    }
}

impl Default for AuthProbe {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
