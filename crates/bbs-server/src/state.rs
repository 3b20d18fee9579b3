//! Application state.
//!
//! Shared state for all request handlers. Built once at startup and never
//! mutated afterwards.

use bbs_assets::AssetDir;
use bbs_router::{NavigationGate, Revision, RouteTable};

use crate::ServerConfig;
use crate::error::ServerError;
use crate::middleware::host::HostPolicy;
use crate::proxy::{Forwarder, ProxyRules};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Route table revision in use.
    pub(crate) revision: Revision,
    /// Page routes.
    pub(crate) routes: RouteTable,
    /// Navigation gate (`None` when disabled).
    pub(crate) gate: Option<NavigationGate>,
    /// Cookie name carrying the UI preference flag.
    pub(crate) preference_key: String,
    /// Compiled SPA bundle.
    pub(crate) assets: AssetDir,
    /// Reverse-proxy rules.
    pub(crate) proxy: ProxyRules,
    /// Upstream HTTP client.
    pub(crate) forwarder: Forwarder,
    /// Accepted `Host` header values.
    pub(crate) hosts: HostPolicy,
}

impl AppState {
    /// Build state from server configuration.
    pub(crate) fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            revision: config.revision,
            routes: RouteTable::for_revision(config.revision),
            gate: config
                .gate_enabled
                .then(|| NavigationGate::new(&config.selection_path)),
            preference_key: config.preference_key.clone(),
            assets: AssetDir::new(&config.dist_dir),
            proxy: ProxyRules::from_config(&config.proxy)?,
            forwarder: Forwarder::new(),
            hosts: HostPolicy::new(&config.host, &config.allowed_hosts),
        })
    }
}
