//! Request forwarding to the upstream origin.
//!
//! Upstream calls go through a blocking `ureq` agent on the tokio blocking
//! pool. Redirects and error statuses are relayed to the client as-is.

use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, Method, Response, Uri};
use ureq::Agent;
use ureq::tls::TlsConfig;

use super::rules::{ProxyRule, response_headers};
use crate::error::ServerError;

/// Default upstream timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Largest request or response body relayed, in bytes.
pub(crate) const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Create an agent that relays responses verbatim.
fn create_agent(verify_tls: bool) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
        .http_status_as_error(false)
        .max_redirects(0)
        .max_redirects_will_error(false)
        .tls_config(TlsConfig::builder().disable_verification(!verify_tls).build())
        .build()
        .into()
}

/// Forwards proxied requests upstream.
pub(crate) struct Forwarder {
    verifying: Agent,
    insecure: Agent,
}

impl Forwarder {
    pub(crate) fn new() -> Self {
        Self {
            verifying: create_agent(true),
            insecure: create_agent(false),
        }
    }

    fn agent_for(&self, rule: &ProxyRule) -> Agent {
        if rule.secure() {
            self.verifying.clone()
        } else {
            self.insecure.clone()
        }
    }

    /// Forward `request` according to `rule` and relay the upstream response.
    pub(crate) async fn forward(
        &self,
        rule: &ProxyRule,
        request: Request,
    ) -> Result<Response<Body>, ServerError> {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| ServerError::BodyTooLarge)?;

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        let url = rule.upstream_url(path_and_query);
        let uri: Uri = url
            .parse()
            .map_err(|_| ServerError::InvalidUpstreamUri(url.clone()))?;
        let headers = rule.request_headers(&parts.headers);
        let agent = self.agent_for(rule);
        let method = parts.method;

        tracing::debug!(method = %method, url = %url, "Forwarding request");

        let result = tokio::task::spawn_blocking(move || {
            send(&agent, method, uri, headers, body.to_vec())
        })
        .await?;

        if let Err(err) = &result {
            tracing::warn!(url = %url, error = %err, "Proxy request failed");
        }
        result
    }
}

/// Perform the upstream call and buffer the response.
fn send(
    agent: &Agent,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Vec<u8>,
) -> Result<Response<Body>, ServerError> {
    let mut request = ureq::http::Request::new(());
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;

    let response = if body.is_empty() {
        agent.run(request)?
    } else {
        agent.run(request.map(|()| body))?
    };

    let (parts, mut upstream_body) = response.into_parts();
    let bytes = upstream_body
        .with_config()
        .limit(MAX_BODY_BYTES as u64)
        .read_to_vec()
        .map_err(|err| match err {
            ureq::Error::BodyExceedsLimit(_) => ServerError::ResponseTooLarge,
            other => ServerError::Upstream(other),
        })?;

    let mut relayed = Response::new(Body::from(bytes));
    *relayed.status_mut() = parts.status;
    *relayed.headers_mut() = response_headers(&parts.headers);
    Ok(relayed)
}
