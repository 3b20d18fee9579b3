//! Static file serving.
//!
//! Serves hashed JS/CSS/image files from the compiled SPA bundle. Paths
//! without a file extension are page navigations and never reach here.

use axum::http::{Method, header};
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::state::AppState;

/// Whether the last path segment names a file (has an extension).
pub(crate) fn is_asset_path(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|name| name.contains('.'))
}

/// Serve a bundle file.
pub(crate) fn serve_asset(
    state: &AppState,
    method: &Method,
    path: &str,
) -> Result<Response, ServerError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ServerError::MethodNotAllowed);
    }

    let file_path = path.trim_start_matches('/');
    let content = state
        .assets
        .get(file_path)
        .ok_or_else(|| ServerError::AssetNotFound(path.to_owned()))?;

    Ok(([(header::CONTENT_TYPE, bbs_assets::mime_for(file_path))], content).into_response())
}
