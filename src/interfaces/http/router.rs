//! Application router
//!
//! One listener serves the signaling socket, the inspection endpoints and
//! the OpenAPI document.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    http::Method,
    middleware,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::application::SharedSessionRouter;
use crate::domain::LiveSession;
use crate::interfaces::ws::{ws_signaling_handler, SignalingState};
use crate::shared::shutdown::ShutdownSignal;

use super::handlers::{health, info, live_sessions, metrics};
use super::middleware::{http_metrics_middleware, request_id_middleware};

/// Unified state for all routes.
/// Axum extracts the specific handler state via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub router: SharedSessionRouter,
    pub shutdown: ShutdownSignal,
    pub started_at: Arc<Instant>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(router: SharedSessionRouter, shutdown: ShutdownSignal) -> Self {
        Self {
            router,
            shutdown,
            started_at: Arc::new(Instant::now()),
            metrics: metrics::prometheus_handle(),
        }
    }
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<AppState> for SharedSessionRouter {
    fn from_ref(s: &AppState) -> Self {
        s.router.clone()
    }
}

impl FromRef<AppState> for SignalingState {
    fn from_ref(s: &AppState) -> Self {
        SignalingState {
            router: s.router.clone(),
            shutdown: s.shutdown.clone(),
        }
    }
}

impl FromRef<AppState> for health::HealthState {
    fn from_ref(s: &AppState) -> Self {
        health::HealthState {
            router: s.router.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<AppState> for metrics::MetricsState {
    fn from_ref(s: &AppState) -> Self {
        metrics::MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        info::welcome,
        live_sessions::list_live_sessions,
        health::health_check,
    ),
    components(schemas(
        info::WelcomeResponse,
        live_sessions::LiveSessionsResponse,
        LiveSession,
        health::HealthResponse,
    )),
    tags(
        (name = "Info", description = "Service information"),
        (name = "Sessions", description = "Live session inspection"),
        (name = "Health", description = "Liveness and load"),
    ),
    info(
        title = "Live Signal",
        description = "Signaling relay for peer-to-peer live sessions. \
                       Clients connect to `/socket?callerId=<id>` for the WebSocket protocol."
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the router serving both HTTP endpoints and the signaling socket
pub fn create_app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(info::welcome))
        .route("/live-sessions", get(live_sessions::list_live_sessions))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/socket", get(ws_signaling_handler))
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ConnectionRegistry, SessionRouter};
    use crate::domain::Identity;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let router = SessionRouter::shared(ConnectionRegistry::shared());
        AppState::new(router, ShutdownSignal::new())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn root_returns_welcome() {
        let (status, body) = get_json(create_app_router(test_state()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Welcome to the live streaming API!" }));
    }

    #[tokio::test]
    async fn live_sessions_lists_registry_in_order() {
        let state = test_state();
        let (tx, _rx) = mpsc::unbounded_channel();
        let host = Identity::from("A");
        state.router.connect(host.clone(), tx).await;
        for name in ["first", "second"] {
            let frame = json!({ "event": "start-live", "data": { "sessionName": name } });
            state
                .router
                .handle_frame(&host, &frame.to_string())
                .await
                .unwrap();
        }

        let (status, body) = get_json(create_app_router(state), "/live-sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "liveSessions": [
                { "hostId": "A", "sessionName": "first" },
                { "hostId": "A", "sessionName": "second" }
            ] })
        );
    }

    #[tokio::test]
    async fn live_sessions_empty() {
        let (_, body) = get_json(create_app_router(test_state()), "/live-sessions").await;
        assert_eq!(body, json!({ "liveSessions": [] }));
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let state = test_state();
        let (tx, _rx) = mpsc::unbounded_channel();
        state.router.connect(Identity::from("A"), tx).await;

        let (status, body) = get_json(create_app_router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connectedIdentities"], 1);
        assert_eq!(body["activeConnections"], 1);
        assert_eq!(body["liveSessions"], 0);
    }

    #[tokio::test]
    async fn openapi_document_lists_paths() {
        let (status, body) =
            get_json(create_app_router(test_state()), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/live-sessions"].is_object());
        assert!(body["paths"]["/health"].is_object());
    }

    #[tokio::test]
    async fn response_carries_request_id() {
        let resp = create_app_router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn socket_without_upgrade_is_rejected() {
        let resp = create_app_router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/socket?callerId=A")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }
}
