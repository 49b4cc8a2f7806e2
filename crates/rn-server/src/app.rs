//! HTTP surface: router, handlers, and error → status mapping.
//!
//! | Route               | Handler   | Success                       |
//! |---------------------|-----------|-------------------------------|
//! | `GET /route`        | `route`   | 200 GeoJSON FeatureCollection |
//! | `GET /health`       | `health`  | 200 healthy / 503 empty       |
//! | `POST /admin/reload`| `reload`  | 200 build summary             |
//!
//! | `RouteError`                            | Status |
//! |-----------------------------------------|--------|
//! | `MissingParameter`, `InvalidCoordinate` | 400    |
//! | `PointUnroutable`                       | 422    |
//! | `NoRouteFound`                          | 404    |
//! | `RouteTimeout`                          | 503    |
//! | `Internal`                              | 500    |

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use rn_graph::load_segments;
use rn_route::{RawRouteQuery, Rebuilt, RouteError, RouteRequest, RouteResponse, RouteService};

/// Shared by every handler.
pub struct AppState {
    pub service:  RouteService,
    /// Segment file re-read by `POST /admin/reload`.
    pub segments: Option<PathBuf>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/route", get(route))
        .route("/health", get(health))
        .route("/admin/reload", post(reload))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A route failure rendered as an [`ErrorBody`](rn_route::ErrorBody).
pub struct ApiError(pub RouteError);

impl From<RouteError> for ApiError {
    fn from(e: RouteError) -> Self {
        Self(e)
    }
}

pub fn status_of(e: &RouteError) -> StatusCode {
    match e {
        RouteError::MissingParameter { .. } | RouteError::InvalidCoordinate { .. } => {
            StatusCode::BAD_REQUEST
        }
        RouteError::PointUnroutable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RouteError::NoRouteFound { .. } => StatusCode::NOT_FOUND,
        RouteError::RouteTimeout => StatusCode::SERVICE_UNAVAILABLE,
        RouteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let RouteError::Internal(detail) = &self.0 {
            error!("route query failed: {detail}");
        }
        (status_of(&self.0), Json(self.0.body())).into_response()
    }
}

// ── GET /route ────────────────────────────────────────────────────────────────

/// Sets the cancellation flag when dropped while armed, e.g. when the client
/// disconnects and axum drops the handler future.
struct CancelOnDrop {
    flag:  Arc<AtomicBool>,
    armed: bool,
}

impl CancelOnDrop {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::Relaxed);
        }
    }
}

async fn route(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Query(pairs) = query.map_err(|rejection| RouteError::InvalidCoordinate {
        name:  "query",
        value: rejection.body_text(),
    })?;
    let request = RouteRequest::try_from(RawRouteQuery::from_pairs(pairs))?;

    let flag = Arc::new(AtomicBool::new(false));
    let guard = CancelOnDrop { flag: flag.clone(), armed: true };

    let result = tokio::task::spawn_blocking(move || state.service.route(&request, Some(flag)))
        .await
        .map_err(|e| RouteError::Internal(e.to_string()))?;
    guard.disarm();

    Ok(Json(result?))
}

// ── GET /health ───────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Response {
    let report = state.service.health();
    let status = if report.is_healthy() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(report)).into_response()
}

// ── POST /admin/reload ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub generation: u64,
    pub accepted:   usize,
    pub repaired:   usize,
    pub oneway:     usize,
    pub dropped:    usize,
}

async fn reload(State(state): State<Arc<AppState>>) -> Response {
    let Some(path) = state.segments.clone() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "no segment file configured", "code": "NO_SEGMENT_SOURCE" })),
        )
            .into_response();
    };

    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let segments = load_segments(&path)?;
        worker.service.rebuild(segments)
    })
    .await;

    match outcome {
        Ok(Ok(Rebuilt { generation, report })) => {
            let summary = ReloadSummary {
                generation,
                accepted: report.accepted,
                repaired: report.repaired,
                oneway:   report.oneway,
                dropped:  report.dropped.len(),
            };
            info!(?summary, "reload complete");
            (StatusCode::OK, Json(summary)).into_response()
        }
        Ok(Err(e)) => {
            warn!("reload failed, keeping current graph: {e}");
            reload_failed()
        }
        Err(e) => {
            error!("reload task panicked: {e}");
            reload_failed()
        }
    }
}

fn reload_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "reload failed", "code": "RELOAD_FAILED" })),
    )
        .into_response()
}
