use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::warn;

use super::{ApiError, ApiResponse, AppState, SystemStatusDto};

/// GET /health
/// Unauthenticated liveness check for load balancers.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "database unavailable"),
    }
}

/// GET /system/status
/// Dashboard status panel. The embedding section is best effort; an AI
/// service outage leaves it null rather than failing the whole response.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatusDto>>, ApiError> {
    let now = chrono::Utc::now().to_rfc3339();

    let active_sessions = state.store().count_active_sessions(&now).await?;
    let villages = state.store().village_count().await?;

    let embedding = match state.shared.ai.embedding_status().await {
        Ok(status) => Some(status),
        Err(err) => {
            warn!(error = %err, "AI status unavailable");
            None
        }
    };

    Ok(Json(ApiResponse::success(SystemStatusDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_sessions,
        villages,
        embedding,
    })))
}
