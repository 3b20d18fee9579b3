//! Gateway introspection endpoints.
//!
//! `GET /__gateway/routes` lists the route table, gate and proxy settings;
//! `GET /__gateway/resolve?path=…` shows what a navigation would do.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use bbs_router::{GateDecision, Page, Revision, RouteMatch};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::handlers::cookie_value;
use crate::state::AppState;

/// Response for GET /__gateway/routes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoutesResponse {
    revision: Revision,
    routes: Vec<RouteEntry>,
    gate: GateInfo,
    proxy: Vec<ProxyEntry>,
}

#[derive(Serialize)]
struct RouteEntry {
    pattern: String,
    page: Page,
    #[serde(skip_serializing_if = "Option::is_none")]
    param: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GateInfo {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection_path: Option<String>,
    preference_key: String,
}

#[derive(Serialize)]
struct ProxyEntry {
    prefix: String,
    target: String,
}

/// Handle GET /__gateway/routes.
pub(crate) async fn get_routes(State(state): State<Arc<AppState>>) -> Json<RoutesResponse> {
    let routes = state
        .routes
        .routes()
        .map(|r| RouteEntry {
            pattern: r.pattern().to_owned(),
            page: r.page(),
            param: r.param_name().map(str::to_owned),
        })
        .collect();

    let proxy = state
        .proxy
        .iter()
        .map(|rule| ProxyEntry {
            prefix: rule.prefix().to_owned(),
            target: rule.target().to_owned(),
        })
        .collect();

    Json(RoutesResponse {
        revision: state.revision,
        routes,
        gate: GateInfo {
            enabled: state.gate.is_some(),
            selection_path: state.gate.as_ref().map(|g| g.selection_path().to_owned()),
            preference_key: state.preference_key.clone(),
        },
        proxy,
    })
}

/// Query for GET /__gateway/resolve.
#[derive(Deserialize)]
pub(crate) struct ResolveQuery {
    path: String,
}

/// Response for GET /__gateway/resolve.
#[derive(Serialize)]
pub(crate) struct ResolveResponse {
    #[serde(flatten)]
    matched: RouteMatch,
    /// Where the gate would send the caller instead, given their cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

/// Handle GET /__gateway/resolve.
pub(crate) async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
    headers: HeaderMap,
) -> Result<Json<ResolveResponse>, ServerError> {
    let matched = state
        .routes
        .resolve(&query.path)
        .ok_or_else(|| ServerError::RouteNotFound(query.path.clone()))?;

    let redirect = state.gate.as_ref().and_then(|gate| {
        match gate.check(cookie_value(&headers, &state.preference_key), &query.path) {
            GateDecision::Redirect(target) => Some(target),
            GateDecision::Proceed => None,
        }
    });

    Ok(Json(ResolveResponse { matched, redirect }))
}
