//! Error types for the HTTP server.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Upstream request failed (connection, TLS, timeout).
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] ureq::Error),

    /// Proxy target or rewritten URL is not a valid URI.
    #[error("Invalid upstream URI: {0}")]
    InvalidUpstreamUri(String),

    /// Proxy rewrite pattern does not compile.
    #[error("Invalid rewrite pattern: {0}")]
    InvalidRewrite(#[from] regex::Error),

    /// Request body exceeds the relay limit.
    #[error("Request body too large")]
    BodyTooLarge,

    /// Upstream response body exceeds the relay limit.
    #[error("Upstream response too large")]
    ResponseTooLarge,

    /// Blocking proxy task panicked or was cancelled.
    #[error("Proxy task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// No route matches the path.
    #[error("No route matches {0}")]
    RouteNotFound(String),

    /// Bundle file not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// `index.html` missing from the bundle directory.
    #[error("Frontend bundle not found in {}", .0.display())]
    BundleMissing(PathBuf),

    /// Method not supported for the path.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Upstream(e) => (
                StatusCode::BAD_GATEWAY,
                json!({"error": "Upstream request failed", "detail": e.to_string()}),
            ),
            Self::InvalidUpstreamUri(uri) => (
                StatusCode::BAD_GATEWAY,
                json!({"error": "Invalid upstream URI", "uri": uri}),
            ),
            Self::BodyTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({"error": self.to_string()}),
            ),
            Self::ResponseTooLarge => (
                StatusCode::BAD_GATEWAY,
                json!({"error": self.to_string()}),
            ),
            Self::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                json!({"error": "No route matches", "path": path}),
            ),
            Self::AssetNotFound(path) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Asset not found", "path": path}),
            ),
            Self::BundleMissing(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": self.to_string()}),
            ),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({"error": self.to_string()}),
            ),
            Self::InvalidRewrite(_) | Self::Join(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": self.to_string()}),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
