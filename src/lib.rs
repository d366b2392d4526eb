pub mod adapter;
pub mod backend_url;
pub mod catalog;
pub mod client;
pub mod config;
pub mod credential;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod server;
pub mod session;

pub use adapter::{Adapter, AdapterReply, translate};
pub use backend_url::{BackendBase, build_url};
pub use client::{BackendClient, BackendClientConfig, UpstreamResponse, UpstreamResult};
pub use config::GatewayConfig;
pub use credential::{Credential, CredentialPolicy, extract_credential};
pub use endpoint::{BackendRequestSpec, EndpointSpec, InboundRequest, QueryParam, RequestBody};
pub use envelope::{ApiEnvelope, ResponseShape};
pub use error::{AuthError, ConfigError, GatewayError, TransportError};
pub use server::build_app;
pub use session::AuthProbe;
