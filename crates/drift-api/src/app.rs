use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use drift_hub::DiscoveryHub;
use tower_http::trace::TraceLayer;

use crate::auth::require_token;
use crate::handlers;
use crate::state::AppState;

pub fn build_app(hub: Arc<DiscoveryHub>, auth_token: Arc<String>) -> Router {
    let state = AppState { hub, auth_token };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/discovery", post(handlers::post_discovery))
        .route("/discovery/jobs", get(handlers::list_discovery_jobs))
        .route("/discovery/:job_id", get(handlers::get_discovery_job))
        .route("/cache", get(handlers::get_cache))
        .route("/cache/:key", get(handlers::get_cache_key).delete(handlers::delete_cache_key))
        .route("/drift/analyze", post(handlers::post_drift_analyze))
        .route("/drift", get(handlers::list_drift))
        .route("/graph", get(handlers::get_graph))
        .route("/ws", get(crate::ws::ws_handler))
        // Auth middleware applies to all routes above.
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::Utc;
    use drift_cache::{GlobalCache, HubCache};
    use drift_hub::{EventBus, HubConfig, JobRegistry};
    use drift_provider::{LocalProvider, ProviderRegistry};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    const TEST_TOKEN: &str = "test-token";

    pub(crate) fn test_hub() -> DiscoveryHub {
        let now = Utc::now();
        let mut providers = ProviderRegistry::new();
        providers.register(drift_domain::Provider::Local, Arc::new(LocalProvider::new(2)));
        DiscoveryHub::new(
            Arc::new(providers),
            HubCache::new(std::env::temp_dir().join(format!("drift-api-test-{}.json", Uuid::new_v4())), 300, now),
            GlobalCache::new(),
            JobRegistry::new(),
            EventBus::new(),
            HubConfig::default(),
        )
    }

    fn test_app() -> Router {
        build_app(Arc::new(test_hub()), Arc::new(TEST_TOKEN.to_string()))
    }

    fn authed(req: axum::http::request::Builder) -> axum::http::request::Builder {
        req.header("Authorization", format!("Bearer {}", TEST_TOKEN))
    }

    #[tokio::test]
    async fn unauthenticated_request_returns_401() {
        let app = test_app();
        let resp = app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app();
        let resp = app.oneshot(authed(Request::builder().uri("/health")).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_returns_200() {
        let app = test_app();
        let resp = app.oneshot(authed(Request::builder().uri("/ready")).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn discovery_jobs_empty_list() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/discovery/jobs")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn discovery_job_not_found_returns_404() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/discovery/nonexistent")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn start_discovery_returns_job_id() {
        let app = test_app();
        let body = serde_json::json!({"provider": "local", "regions": ["local"]});
        let resp = app
            .oneshot(
                authed(Request::builder().method(Method::POST).uri("/discovery").header("content-type", "application/json"))
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn graph_returns_no_content_before_any_analysis() {
        let app = test_app();
        let resp = app.oneshot(authed(Request::builder().uri("/graph")).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn drift_analyze_missing_state_file_returns_bad_request() {
        let app = test_app();
        let body = serde_json::json!({"provider": "aws", "state_path": "/no/such/file.tfstate"});
        let resp = app
            .oneshot(
                authed(Request::builder().method(Method::POST).uri("/drift/analyze").header("content-type", "application/json"))
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cache_key_not_found_returns_404() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/cache/nonexistent")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn basic_auth_with_token_as_password_returns_200() {
        use base64::Engine as _;
        let app = test_app();
        let credentials = base64::engine::general_purpose::STANDARD.encode(format!("driftmgr:{}", TEST_TOKEN));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("Authorization", format!("Basic {}", credentials))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
