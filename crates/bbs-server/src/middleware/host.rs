//! `Host` header check.
//!
//! A dev server reachable under a public name must not answer for arbitrary
//! hosts (DNS rebinding). Localhost, IP literals and the bind host are always
//! accepted; other names must be on the allow-list.

use std::net::IpAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Allow-list entry that disables the check.
const ALLOW_ALL: &str = "all";

/// Accepted host names.
#[derive(Debug)]
pub(crate) struct HostPolicy {
    allow_all: bool,
    bind_host: String,
    allowed: Vec<String>,
}

impl HostPolicy {
    pub(crate) fn new(bind_host: &str, allowed: &[String]) -> Self {
        Self {
            allow_all: allowed.iter().any(|h| h == ALLOW_ALL),
            bind_host: bind_host.to_ascii_lowercase(),
            allowed: allowed.iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// Whether a request with this `Host` value is served.
    pub(crate) fn allows(&self, host: Option<&str>) -> bool {
        if self.allow_all {
            return true;
        }
        let Some(host) = host else {
            return false;
        };
        let name = strip_port(host).to_ascii_lowercase();

        if name.parse::<IpAddr>().is_ok()
            || name == "localhost"
            || name.ends_with(".localhost")
            || name == self.bind_host
        {
            return true;
        }

        self.allowed.iter().any(|entry| match entry.strip_prefix('.') {
            Some(domain) => name == domain || name.ends_with(entry.as_str()),
            None => name == *entry,
        })
    }
}

/// Drop an optional `:port` suffix, unwrapping bracketed IPv6 literals.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

/// Reject requests whose `Host` is not accepted.
pub(crate) async fn check_host(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()));

    if !state.hosts.allows(host) {
        tracing::warn!(host = ?host, "Rejected request with invalid Host header");
        return (StatusCode::FORBIDDEN, "Invalid Host header").into_response();
    }

    next.run(request).await
}
