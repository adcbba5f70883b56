// =============================================================================
// HTTP Endpoints: Axum 0.7
// =============================================================================
//
//   GET  /                   rendered dashboard (cache-backed)
//   HEAD /                   empty 200, computes nothing
//   GET  /api/v1/snapshot    dashboard snapshot as JSON (cache-backed)
//   GET  /api/v1/health      liveness, cache state, fetch statistics
//
// CORS is permissive; the dashboard is read-only.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::html::render_dashboard;
use crate::app_state::{AppState, ErrorRecord};
use crate::cache::CacheStatus;
use crate::config::DashboardConfig;
use crate::market_data::FetchStatsSnapshot;

// =============================================================================
// Router construction
// =============================================================================

/// Build the router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard).head(dashboard_head))
        .route("/api/v1/snapshot", get(snapshot))
        .route("/api/v1/health", get(health))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Dashboard
// =============================================================================

async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    match state.snapshot().await {
        Ok(snapshot) => Html(render_dashboard(&snapshot, state.config.cache_ttl_secs)).into_response(),
        Err(e) => refresh_failed(e),
    }
}

/// Uptime probes hit HEAD; answer without touching the cache or provider.
async fn dashboard_head() -> StatusCode {
    debug!("HEAD / answered without computing metrics");
    StatusCode::OK
}

// =============================================================================
// JSON snapshot
// =============================================================================

async fn snapshot(State(state): State<Arc<AppState>>) -> Response {
    match state.snapshot().await {
        Ok(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        Err(e) => refresh_failed(e),
    }
}

fn refresh_failed(e: anyhow::Error) -> Response {
    error!(error = %format!("{e:#}"), "snapshot unavailable");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": format!("{e:#}") })),
    )
        .into_response()
}

// =============================================================================
// Health
// =============================================================================

/// The snapshot currently held by the cache, as seen without refreshing.
#[derive(Serialize)]
struct HeldSnapshot {
    id: Uuid,
    computed_at: chrono::DateTime<chrono::Utc>,
    age_secs: u64,
    unavailable: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    server_time: i64,
    refreshes: u64,
    cache: CacheStatus,
    snapshot: Option<HeldSnapshot>,
    fetch: FetchStatsSnapshot,
    recent_errors: Vec<ErrorRecord>,
    config: DashboardConfig,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
        refreshes: state.refreshes(),
        cache: state.cache.status(),
        snapshot: state.cached_snapshot().map(|(snap, age)| HeldSnapshot {
            id: snap.id,
            computed_at: snap.computed_at,
            age_secs: age.as_secs(),
            unavailable: snap.unavailable().len(),
        }),
        fetch: state.fetch_stats(),
        recent_errors: state.recent_errors(),
        config: state.config.as_ref().clone(),
    };
    Json(resp)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{closes, MockSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app(source: Arc<MockSource>) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(Arc::new(DashboardConfig::default()), source));
        (router(Arc::clone(&state)), state)
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn head_returns_empty_ok_without_fetching() {
        let source = Arc::new(MockSource::new());
        let (app, state) = app(Arc::clone(&source));

        let resp = app.oneshot(request(Method::HEAD, "/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(source.calls(), 0);
        assert_eq!(state.refreshes(), 0);
    }

    #[tokio::test]
    async fn dashboard_renders_and_caches() {
        let source = Arc::new(MockSource::new().with_series("^DJI", "1h", closes(&[100.0, 105.0])));
        let (app, state) = app(Arc::clone(&source));

        let resp = app
            .clone()
            .oneshot(request(Method::GET, "/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("Market Pulse"));
        assert!(page.contains("+5.00%"));
        assert!(page.contains("class=\"stale\""));

        let calls = source.calls();
        let resp = app.oneshot(request(Method::GET, "/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(source.calls(), calls);
        assert_eq!(state.refreshes(), 1);
    }

    #[tokio::test]
    async fn snapshot_endpoint_returns_json() {
        let (app, _state) = app(Arc::new(MockSource::new()));

        let resp = app
            .oneshot(request(Method::GET, "/api/v1/snapshot"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["assets"].as_array().map(Vec::len), Some(6));
        assert_eq!(json["assets"][0]["label"], "US30");
        assert_eq!(json["overnight"]["status"], "unavailable");
        assert_eq!(json["breadth"]["positive"], 0);
    }

    #[tokio::test]
    async fn health_reports_cache_and_stats() {
        let (app, _state) = app(Arc::new(MockSource::new()));

        let resp = app
            .oneshot(request(Method::GET, "/api/v1/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["cache"]["state"], "empty");
        assert!(json["snapshot"].is_null());
        assert_eq!(json["fetch"]["requests"], 0);
        assert_eq!(json["config"]["cache_ttl_secs"], 300);
    }

    #[tokio::test]
    async fn health_describes_held_snapshot_without_refreshing() {
        let source = Arc::new(MockSource::new());
        let (app, state) = app(Arc::clone(&source));
        let built = state.snapshot().await.unwrap();
        let calls = source.calls();

        let resp = app
            .oneshot(request(Method::GET, "/api/v1/health"))
            .await
            .unwrap();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["cache"]["state"], "ready");
        assert_eq!(json["snapshot"]["id"], built.id.to_string());
        assert_eq!(json["snapshot"]["unavailable"], built.unavailable().len());
        assert_eq!(json["refreshes"], 1);
        assert_eq!(source.calls(), calls);
    }
}
