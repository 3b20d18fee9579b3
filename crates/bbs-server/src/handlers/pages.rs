//! Page navigations.
//!
//! Every request that is not proxied and does not name a bundle file is a
//! navigation inside the SPA. The navigation gate runs first; allowed
//! navigations get `index.html` and the client-side router takes over.

use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bbs_router::GateDecision;

use crate::error::ServerError;
use crate::handlers::cookie_value;
use crate::state::AppState;

/// Response header naming the page the route table resolved.
pub(crate) const PAGE_HEADER: &str = "x-bbs-page";

/// Page name reported when no route matches.
const NOT_FOUND_PAGE: &str = "NotFound";

/// Serve a page navigation to `path`.
pub(crate) fn serve_page(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ServerError::MethodNotAllowed);
    }

    if let Some(gate) = &state.gate {
        let preference = cookie_value(headers, &state.preference_key);
        if let GateDecision::Redirect(target) = gate.check(preference, path) {
            tracing::debug!(path, target = %target, "Redirecting to UI selection");
            return Ok(redirect(&target));
        }
    }

    let page = state
        .routes
        .resolve(path)
        .map_or(NOT_FOUND_PAGE, |m| m.page.name());

    let index = state
        .assets
        .index()
        .ok_or_else(|| ServerError::BundleMissing(state.assets.root().to_path_buf()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static(PAGE_HEADER), page),
        ],
        index,
    )
        .into_response())
}

/// Temporary redirect that browsers must not cache, since the outcome
/// depends on the preference cookie.
fn redirect(target: &str) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, target),
            (header::CACHE_CONTROL, "no-store"),
        ],
    )
        .into_response()
}
