use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine as _;

use crate::state::AppState;

/// Axum middleware requiring a valid `Authorization` header, either
/// `Bearer <token>` or HTTP Basic with the token as the password (any
/// username). Terraform's HTTP state backend authenticates with `curl -u
/// driftmgr:$TOKEN`-style Basic credentials, so both forms must work.
///
/// Returns 401 for missing, malformed, or incorrect credentials. Applied to
/// every route below — there are no public endpoints.
pub async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let authorized = match header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token == state.auth_token.as_str(),
            None => value
                .strip_prefix("Basic ")
                .and_then(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded).ok())
                .and_then(|raw| String::from_utf8(raw).ok())
                .and_then(|decoded| decoded.split_once(':').map(|(_, password)| password.to_string()))
                .map(|password| password == state.auth_token.as_str())
                .unwrap_or(false),
        },
        None => false,
    };

    if authorized {
        next.run(request).await
    } else {
        (StatusCode::UNAUTHORIZED, "Unauthorized\n").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use chrono::Utc;
    use drift_cache::{GlobalCache, HubCache};
    use drift_hub::{DiscoveryHub, EventBus, HubConfig, JobRegistry};
    use drift_provider::ProviderRegistry;
    use std::sync::Arc;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn test_app(token: &str) -> Router {
        let now = Utc::now();
        let hub = DiscoveryHub::new(
            Arc::new(ProviderRegistry::new()),
            HubCache::new(std::env::temp_dir().join(format!("drift-api-auth-test-{}.json", Uuid::new_v4())), 300, now),
            GlobalCache::new(),
            JobRegistry::new(),
            EventBus::new(),
            HubConfig::default(),
        );
        let state = AppState { hub: Arc::new(hub), auth_token: Arc::new(token.to_string()) };
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_token))
            .with_state(state)
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let app = test_app("secret");
        let resp = app.oneshot(axum::http::Request::builder().uri("/ok").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn correct_bearer_token_is_authorized() {
        let app = test_app("secret");
        let resp = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ok")
                    .header("Authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_bearer_token_is_unauthorized() {
        let app = test_app("secret");
        let resp = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ok")
                    .header("Authorization", "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn basic_auth_with_token_as_password_is_authorized() {
        let app = test_app("secret");
        let credentials = base64::engine::general_purpose::STANDARD.encode("driftmgr:secret");
        let resp = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ok")
                    .header("Authorization", format!("Basic {}", credentials))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn basic_auth_with_wrong_password_is_unauthorized() {
        let app = test_app("secret");
        let credentials = base64::engine::general_purpose::STANDARD.encode("driftmgr:wrong");
        let resp = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ok")
                    .header("Authorization", format!("Basic {}", credentials))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
