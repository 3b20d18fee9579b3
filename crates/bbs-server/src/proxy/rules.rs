//! Proxy rule matching, path rewriting and header preparation.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Uri;
use bbs_config::ProxyRuleConfig;
use regex::Regex;

use crate::error::ServerError;

/// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Whether `name` is hop-by-hop, either by definition or because the
/// `Connection` header lists it.
fn is_hop_by_hop(name: &HeaderName, connection_listed: &[String]) -> bool {
    let name = name.as_str();
    HOP_BY_HOP.contains(&name) || connection_listed.iter().any(|listed| listed == name)
}

/// Header names listed in `Connection` (e.g. `Connection: close, x-trace`).
fn connection_listed(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Copy end-to-end headers, dropping hop-by-hop ones and anything in `skip`.
fn end_to_end(headers: &HeaderMap, skip: &[HeaderName]) -> HeaderMap {
    let listed = connection_listed(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name, &listed) || skip.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Headers relayed from the upstream response to the client.
///
/// `Content-Length` is dropped because the body is re-framed locally.
pub(crate) fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    end_to_end(upstream, &[header::CONTENT_LENGTH])
}

/// A compiled proxy rule.
#[derive(Debug)]
pub(crate) struct ProxyRule {
    prefix: String,
    target: String,
    authority: String,
    origin: String,
    change_origin: bool,
    secure: bool,
    rewrite: Option<(Regex, String)>,
}

impl ProxyRule {
    /// Compile a rule from configuration.
    pub(crate) fn from_config(config: &ProxyRuleConfig) -> Result<Self, ServerError> {
        let target = config.target.trim_end_matches('/').to_owned();
        let uri: Uri = target
            .parse()
            .map_err(|_| ServerError::InvalidUpstreamUri(config.target.clone()))?;
        let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) else {
            return Err(ServerError::InvalidUpstreamUri(config.target.clone()));
        };
        let origin = format!("{scheme}://{authority}");
        let authority = authority.to_string();

        let rewrite = match &config.rewrite {
            Some(rewrite) => Some((Regex::new(&rewrite.from)?, rewrite.to.clone())),
            None => None,
        };

        Ok(Self {
            prefix: config.prefix.clone(),
            target,
            authority,
            origin,
            change_origin: config.change_origin,
            secure: config.secure,
            rewrite,
        })
    }

    /// Path prefix that selects this rule.
    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Upstream target without trailing slash.
    pub(crate) fn target(&self) -> &str {
        &self.target
    }

    /// Whether upstream TLS certificates are verified.
    pub(crate) fn secure(&self) -> bool {
        self.secure
    }

    /// Plain string prefix match, so `/api` also selects `/apis`.
    pub(crate) fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Build the upstream URL for a request path (with optional query).
    pub(crate) fn upstream_url(&self, path_and_query: &str) -> String {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };

        let path = match &self.rewrite {
            Some((from, to)) => from.replace(path, to.as_str()),
            None => path.into(),
        };

        match query {
            Some(query) => format!("{}{path}?{query}", self.target),
            None => format!("{}{path}", self.target),
        }
    }

    /// Headers sent upstream for an incoming request.
    ///
    /// With `change_origin`, `Host` is the upstream authority and a present
    /// `Origin` is replaced with the upstream origin. Otherwise the client's
    /// `Host` is kept.
    pub(crate) fn request_headers(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = end_to_end(incoming, &[header::HOST, header::CONTENT_LENGTH]);

        if self.change_origin {
            if let Ok(host) = HeaderValue::from_str(&self.authority) {
                headers.insert(header::HOST, host);
            }
            if headers.contains_key(header::ORIGIN)
                && let Ok(origin) = HeaderValue::from_str(&self.origin)
            {
                headers.insert(header::ORIGIN, origin);
            }
        } else if let Some(host) = incoming.get(header::HOST) {
            headers.insert(header::HOST, host.clone());
        }

        headers
    }
}

/// Ordered proxy rules; the first matching prefix wins.
#[derive(Debug, Default)]
pub(crate) struct ProxyRules {
    rules: Vec<ProxyRule>,
}

impl ProxyRules {
    /// Compile all configured rules.
    pub(crate) fn from_config(configs: &[ProxyRuleConfig]) -> Result<Self, ServerError> {
        let rules = configs
            .iter()
            .map(ProxyRule::from_config)
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    /// Find the rule responsible for `path`.
    pub(crate) fn find(&self, path: &str) -> Option<&ProxyRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    /// Iterate rules in order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &ProxyRule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use bbs_config::{RewriteConfig, default_proxy_rules};
    use pretty_assertions::assert_eq;

    use super::*;

    fn default_rules() -> ProxyRules {
        ProxyRules::from_config(&default_proxy_rules()).unwrap()
    }

    fn rule(target: &str, change_origin: bool) -> ProxyRule {
        ProxyRule::from_config(&ProxyRuleConfig {
            prefix: "/api".to_owned(),
            target: target.to_owned(),
            change_origin,
            secure: false,
            rewrite: None,
        })
        .unwrap()
    }

    #[test]
    fn test_api_forwarded_unchanged() {
        let rules = default_rules();
        let rule = rules.find("/api/x").unwrap();

        assert_eq!(rule.prefix(), "/api");
        assert_eq!(rule.upstream_url("/api/x"), "https://bbs.zhiyuhub.top/api/x");
    }

    #[test]
    fn test_client_forwarded_unchanged() {
        let rules = default_rules();
        let rule = rules.find("/client/y").unwrap();

        assert_eq!(rule.prefix(), "/client");
        assert_eq!(
            rule.upstream_url("/client/y"),
            "https://bbs.zhiyuhub.top/client/y"
        );
    }

    #[test]
    fn test_query_string_preserved() {
        let rules = default_rules();
        let rule = rules.find("/api/posts").unwrap();

        assert_eq!(
            rule.upstream_url("/api/posts?page=2&size=20"),
            "https://bbs.zhiyuhub.top/api/posts?page=2&size=20"
        );
    }

    #[test]
    fn test_api_rewrite_only_touches_leading_prefix() {
        let rules = default_rules();
        let rule = rules.find("/api/api").unwrap();

        assert_eq!(
            rule.upstream_url("/api/api"),
            "https://bbs.zhiyuhub.top/api/api"
        );
    }

    #[test]
    fn test_non_proxied_paths() {
        let rules = default_rules();
        assert!(rules.find("/").is_none());
        assert!(rules.find("/post/42").is_none());
        assert!(rules.find("/ui-select").is_none());
        assert!(rules.find("/js/app.js").is_none());
    }

    #[test]
    fn test_plain_prefix_match() {
        let rules = default_rules();
        assert_eq!(rules.find("/api").unwrap().prefix(), "/api");
        assert_eq!(rules.find("/apis").unwrap().prefix(), "/api");
    }

    #[test]
    fn test_rewrite_strips_prefix() {
        let rule = ProxyRule::from_config(&ProxyRuleConfig {
            prefix: "/api".to_owned(),
            target: "http://localhost:3000/".to_owned(),
            change_origin: true,
            secure: false,
            rewrite: Some(RewriteConfig {
                from: "^/api".to_owned(),
                to: String::new(),
            }),
        })
        .unwrap();

        assert_eq!(
            rule.upstream_url("/api/users?id=1"),
            "http://localhost:3000/users?id=1"
        );
    }

    #[test]
    fn test_invalid_target_rejected() {
        let result = ProxyRule::from_config(&ProxyRuleConfig {
            prefix: "/api".to_owned(),
            target: "not a url".to_owned(),
            change_origin: true,
            secure: false,
            rewrite: None,
        });
        assert!(matches!(result, Err(ServerError::InvalidUpstreamUri(_))));
    }

    #[test]
    fn test_change_origin_rewrites_host_and_origin() {
        let rule = rule("https://bbs.zhiyuhub.top", true);
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("localhost:8080"));
        incoming.insert(
            header::ORIGIN,
            HeaderValue::from_static("http://localhost:8080"),
        );
        incoming.insert(header::COOKIE, HeaderValue::from_static("uiVersion=new"));

        let headers = rule.request_headers(&incoming);

        assert_eq!(headers[header::HOST], "bbs.zhiyuhub.top");
        assert_eq!(headers[header::ORIGIN], "https://bbs.zhiyuhub.top");
        assert_eq!(headers[header::COOKIE], "uiVersion=new");
    }

    #[test]
    fn test_without_change_origin_host_kept() {
        let rule = rule("https://bbs.zhiyuhub.top", false);
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("localhost:8080"));

        let headers = rule.request_headers(&incoming);

        assert_eq!(headers[header::HOST], "localhost:8080");
        assert!(headers.get(header::ORIGIN).is_none());
    }

    #[test]
    fn test_hop_by_hop_headers_stripped() {
        let rule = rule("https://bbs.zhiyuhub.top", true);
        let mut incoming = HeaderMap::new();
        incoming.insert(
            header::CONNECTION,
            HeaderValue::from_static("keep-alive, x-debug"),
        );
        incoming.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        incoming.insert("x-debug", HeaderValue::from_static("1"));
        incoming.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        incoming.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let headers = rule.request_headers(&incoming);

        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get("x-debug").is_none());
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(headers[header::ACCEPT], "application/json");
    }

    #[test]
    fn test_response_headers_keep_every_set_cookie() {
        let mut upstream = HeaderMap::new();
        upstream.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        upstream.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("5"));

        let headers = response_headers(&upstream);

        assert_eq!(headers.get_all(header::SET_COOKIE).iter().count(), 2);
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
    }
}
