//! Plant access portal.
//!
//! Server side: proxy routes that attach workflow secrets (`api`, `proxy`,
//! `vault`). Client side: session handling, the portal HTTP client and the
//! dashboard state machine (`session`, `client`, `dashboard`).

pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod proxy;
pub mod session;
pub mod vault;

use std::sync::Arc;

/// Shared application state passed to handlers.
pub struct AppState {
    pub config: config::Config,
    pub credentials: Arc<dyn vault::CredentialResolver>,
    pub upstream: proxy::upstream::UpstreamClient,
}

impl AppState {
    pub fn new(config: config::Config) -> anyhow::Result<Self> {
        let upstream = proxy::upstream::UpstreamClient::new(config.upstream_timeout)?;
        let credentials = Arc::new(config.workflows.clone());
        Ok(Self {
            config,
            credentials,
            upstream,
        })
    }
}
