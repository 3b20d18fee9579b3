//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{host, security};
use crate::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let gateway_routes = Router::new()
        .route("/__gateway/routes", get(handlers::gateway::get_routes))
        .route("/__gateway/resolve", get(handlers::gateway::resolve));

    // Proxy, assets and page navigations
    let router = gateway_routes.fallback(handlers::dispatch::dispatch);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    Arc::clone(&state),
                    host::check_host,
                ))
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(security::referrer_policy_layer()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::Path;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use axum::response::Response;
    use bbs_config::{ProxyRuleConfig, default_proxy_rules};
    use bbs_router::Revision;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::ServerConfig;

    const INDEX: &str = "<!doctype html><div id=\"app\"></div>";

    fn bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), INDEX).unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/app.css"), "body{}").unwrap();
        dir
    }

    fn config(dist_dir: &Path) -> ServerConfig {
        ServerConfig {
            dist_dir: dist_dir.to_path_buf(),
            ..ServerConfig::default()
        }
    }

    fn app(config: &ServerConfig) -> Router {
        create_router(Arc::new(AppState::from_config(config).unwrap()))
    }

    async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder()
            .uri(uri)
            .header(header::HOST, "localhost:8080");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn page_header(response: &Response) -> &str {
        response.headers()["x-bbs-page"].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_first_visit_redirects_to_selection() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        for path in ["/", "/post/42", "/login", "/create-post", "/no-such-page"] {
            let response = get(app.clone(), path, None).await;
            assert_eq!(response.status(), StatusCode::FOUND, "{path}");
            assert_eq!(response.headers()[header::LOCATION], "/ui-select");
            assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        }
    }

    #[tokio::test]
    async fn test_selection_page_served_without_preference() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app, "/ui-select", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page_header(&response), "UiSelect");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, INDEX.as_bytes());
    }

    #[tokio::test]
    async fn test_preference_cookie_lets_navigation_through() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app, "/post/42", Some("uiVersion=new")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page_header(&response), "PostDetail");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_empty_preference_cookie_redirects() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app, "/", Some("uiVersion=")).await;

        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_serves_spa_with_not_found_page() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app, "/settings", Some("uiVersion=old")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page_header(&response), "NotFound");
    }

    #[tokio::test]
    async fn test_gate_disabled() {
        let dist = bundle();
        let app = app(&ServerConfig {
            gate_enabled: false,
            ..config(dist.path())
        });

        let response = get(app, "/", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page_header(&response), "Home");
    }

    #[tokio::test]
    async fn test_legacy_revision_still_exempts_selection_page() {
        let dist = bundle();
        let app = app(&ServerConfig {
            revision: Revision::Legacy,
            ..config(dist.path())
        });

        let response = get(app.clone(), "/ui-select", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page_header(&response), "NotFound");

        let response = get(app, "/login", Some("uiVersion=new")).await;
        assert_eq!(page_header(&response), "NotFound");
    }

    #[tokio::test]
    async fn test_asset_served_without_gate() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app.clone(), "/css/app.css", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

        let response = get(app, "/css/missing.css", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_bundle_is_unavailable() {
        let app = app(&config(Path::new("/nonexistent/dist")));

        let response = get(app, "/", Some("uiVersion=new")).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_page_rejects_post() {
        let dist = bundle();
        let app = app(&config(dist.path()));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/ui-select")
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_invalid_host_rejected() {
        let dist = bundle();
        let app = app(&config(dist.path()));
        let request = Request::builder()
            .uri("/ui-select")
            .header(header::HOST, "attacker.example.com")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_allowed_public_host_accepted() {
        let dist = bundle();
        let app = app(&config(dist.path()));
        let request = Request::builder()
            .uri("/ui-select")
            .header(header::HOST, "newui.bbs.zhiyuhub.top")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app, "/ui-select", None).await;

        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["referrer-policy"], "same-origin");
    }

    #[tokio::test]
    async fn test_routes_endpoint() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let body = json(get(app, "/__gateway/routes", None).await).await;

        assert_eq!(body["revision"], "current");
        assert_eq!(body["routes"].as_array().unwrap().len(), 5);
        assert_eq!(body["routes"][1]["pattern"], "/post/:id");
        assert_eq!(body["routes"][1]["page"], "PostDetail");
        assert_eq!(body["routes"][1]["param"], "id");
        assert!(body["routes"][0].get("param").is_none());
        assert_eq!(body["gate"]["selectionPath"], "/ui-select");
        assert_eq!(body["gate"]["preferenceKey"], "uiVersion");
        assert_eq!(body["proxy"][0]["prefix"], "/api");
        assert_eq!(body["proxy"][1]["target"], "https://bbs.zhiyuhub.top");
    }

    #[tokio::test]
    async fn test_resolve_endpoint() {
        let dist = bundle();
        let app = app(&config(dist.path()));

        let response = get(app.clone(), "/__gateway/resolve?path=/post/42", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["page"], "PostDetail");
        assert_eq!(body["params"]["id"], "42");
        assert_eq!(body["redirect"], "/ui-select");

        let response = get(
            app.clone(),
            "/__gateway/resolve?path=/post/42",
            Some("uiVersion=new"),
        )
        .await;
        let body = json(response).await;
        assert!(body.get("redirect").is_none());

        let response = get(app, "/__gateway/resolve?path=/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn spawn_upstream() -> SocketAddr {
        let upstream = Router::new()
            .route(
                "/api/posts",
                axum::routing::get(|| async { axum::Json(serde_json::json!({"posts": []})) }),
            )
            .route(
                "/client/bootstrap",
                axum::routing::get(|| async { "client" }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });
        addr
    }

    fn proxied_config(dist_dir: &Path, addr: SocketAddr) -> ServerConfig {
        let proxy = default_proxy_rules()
            .into_iter()
            .map(|rule| ProxyRuleConfig {
                target: format!("http://{addr}"),
                ..rule
            })
            .collect();
        ServerConfig {
            proxy,
            ..config(dist_dir)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_api_proxied_without_gate() {
        let dist = bundle();
        let addr = spawn_upstream().await;
        let app = app(&proxied_config(dist.path(), addr));

        let response = get(app, "/api/posts", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["posts"], serde_json::json!([]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_proxied() {
        let dist = bundle();
        let addr = spawn_upstream().await;
        let app = app(&proxied_config(dist.path(), addr));

        let response = get(app, "/client/bootstrap", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "client".as_bytes());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let dist = bundle();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let app = app(&proxied_config(dist.path(), addr));

        let response = get(app, "/api/posts", None).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
