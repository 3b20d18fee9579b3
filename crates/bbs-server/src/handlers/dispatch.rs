//! Fallback dispatch: proxy, bundle asset, or page navigation.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};

use crate::handlers::pages;
use crate::state::AppState;
use crate::static_files;

/// Handle any request not claimed by an explicit route.
pub(crate) async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if let Some(rule) = state.proxy.find(request.uri().path()) {
        return state
            .forwarder
            .forward(rule, request)
            .await
            .into_response();
    }

    let path = request.uri().path();
    let result = if static_files::is_asset_path(path) {
        static_files::serve_asset(&state, request.method(), path)
    } else {
        pages::serve_page(&state, request.method(), path, request.headers())
    };
    result.into_response()
}
