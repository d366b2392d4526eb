//! Gateway configuration, read from the environment.
//!
//! A missing or broken `BACKEND_URL` does not stop the gateway from starting.
//! It is resolved once here and every proxied request then answers 500 with
//! the invalid-configuration envelope until the variable is fixed.

use std::env;
use std::time::Duration;

use crate::backend_url::BackendBase;
use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ACCESS_COOKIE: &str = "accessToken";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub backend_url: Option<String>,
    pub access_cookie: String,
    pub backend_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Read configuration from the process environment, loading `.env` first
    /// when one exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            backend_url: lookup("BACKEND_URL"),
            access_cookie: lookup("ACCESS_TOKEN_COOKIE")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ACCESS_COOKIE.to_string()),
            backend_timeout: lookup("BACKEND_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    pub fn resolve_backend_base(&self) -> Result<BackendBase, ConfigError> {
        BackendBase::resolve(self.backend_url.as_deref())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
