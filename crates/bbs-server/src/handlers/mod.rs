//! HTTP request handlers.

pub(crate) mod dispatch;
pub(crate) mod gateway;
pub(crate) mod pages;

use axum::http::{HeaderMap, header};

/// Read a cookie value by name from all `Cookie` headers.
///
/// Unparseable headers are skipped, so a broken cookie reads as absent.
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}
