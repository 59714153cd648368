//! Liveness and metrics endpoints

use crate::{metrics, state::AppState, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let Some(pool) = &state.db_pool else {
        return Json(json!({ "status": "ok", "storage": "memory" })).into_response();
    };

    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Json(json!({ "status": "ok", "storage": "postgres" })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed to reach the database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "storage": "postgres" })),
            )
                .into_response()
        }
    }
}

/// GET /metrics
pub async fn prometheus_metrics() -> Result<Response> {
    let body = metrics::render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
