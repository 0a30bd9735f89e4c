use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::db::{check_connection, DbPool};

/// Pool is `None` when running on the in-memory store
pub type HealthState = Option<Arc<DbPool>>;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(pool): State<HealthState>) -> impl IntoResponse {
    let Some(pool) = pool else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "in-memory"
            })),
        );
    };

    match check_connection(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "connected"
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "database": "disconnected"
                })),
            )
        }
    }
}
