//! Development gateway for the BBS front end.
//!
//! This crate provides a native Rust HTTP server using axum, serving:
//! - Page navigations, checked by the navigation gate before `index.html`
//!   is returned
//! - Static files from the compiled SPA bundle
//! - A reverse proxy forwarding `/api` and `/client` to the remote backend
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use bbs_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         port: 8080,
//!         dist_dir: PathBuf::from("dist"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum gateway (bbs-server)
//!                        │
//!                        ├─► Host check (allow-list)
//!                        │
//!                        ├─► /api, /client ──► Forwarder ──ureq──► https://bbs.zhiyuhub.top
//!                        │
//!                        ├─► *.js, *.css, … ──► bundle directory
//!                        │
//!                        └─► page paths ──► NavigationGate ──► 302 /ui-select
//!                                                  │
//!                                                  └─► index.html (route resolved)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod proxy;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use bbs_config::{ProxyRuleConfig, default_proxy_rules};
use bbs_router::{DEFAULT_PREFERENCE_KEY, DEFAULT_SELECTION_PATH, Page, Revision};
pub use error::ServerError;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Extra accepted `Host` header names.
    pub allowed_hosts: Vec<String>,
    /// Compiled SPA bundle directory.
    pub dist_dir: PathBuf,
    /// Route table revision.
    pub revision: Revision,
    /// Gate page navigations.
    pub gate_enabled: bool,
    /// Page first-time visitors are sent to.
    pub selection_path: String,
    /// Cookie name of the UI preference flag.
    pub preference_key: String,
    /// Reverse-proxy rules.
    pub proxy: Vec<ProxyRuleConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            allowed_hosts: vec!["newui.bbs.zhiyuhub.top".to_owned()],
            dist_dir: PathBuf::from("dist"),
            revision: Revision::default(),
            gate_enabled: true,
            selection_path: DEFAULT_SELECTION_PATH.to_owned(),
            preference_key: DEFAULT_PREFERENCE_KEY.to_owned(),
            proxy: default_proxy_rules(),
        }
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if a proxy rule is invalid or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(&config)?);
    log_startup_warnings(&state, &config.dist_dir);

    for rule in state.proxy.iter() {
        tracing::info!(prefix = rule.prefix(), target = rule.target(), "Proxy rule");
    }

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Warn about configurations that serve but likely misbehave.
fn log_startup_warnings(state: &AppState, dist_dir: &Path) {
    if !state.assets.has_index() {
        tracing::warn!(dist_dir = %dist_dir.display(), "index.html not found, build the front end first");
    }

    if let Some(gate) = &state.gate
        && state
            .routes
            .resolve(gate.selection_path())
            .is_none_or(|m| m.page != Page::UiSelect)
    {
        tracing::warn!(
            selection_path = gate.selection_path(),
            revision = ?state.revision,
            "Selection page is not in the route table; the SPA will render its not-found view there"
        );
    }
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the loaded config file.
#[must_use]
pub fn server_config_from_bbs_config(config: &bbs_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        allowed_hosts: config.server.allowed_hosts.clone(),
        dist_dir: config.frontend_resolved.dist_dir.clone(),
        revision: config.router.revision,
        gate_enabled: config.gate.enabled,
        selection_path: config.gate.selection_path.clone(),
        preference_key: config.gate.preference_key.clone(),
        proxy: config.proxy.clone(),
    }
}
