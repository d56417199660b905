//! Service-to-service API under /internal. Callers are other backend
//! services (AI pipeline, channel workers) authenticating with a flat
//! shared secret, never admin tokens.

use axum::{
    Json,
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::{ApiError, ApiResponse, AppState, GapDto};

// ============================================================================
// Middleware
// ============================================================================

/// Shared-secret check for every /internal route. When no key is
/// configured the whole surface is disabled rather than open.
pub async fn internal_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let configured = state.config().read().await.internal.api_key.clone();

    if configured.is_empty() {
        warn!("Internal API request rejected: no key configured");
        return Err(ApiError::Unauthorized("Internal API disabled".to_string()));
    }

    let presented = headers
        .get("x-internal-api-key")
        .and_then(|v| v.to_str().ok())
        .map(normalize_internal_key);

    match presented {
        Some(key) if key == configured => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized("Invalid internal API key".to_string())),
    }
}

/// Callers have historically sent the key as-is, with a Bearer prefix, or
/// wrapped in quotes by an over-eager env templating layer. Accept all
/// three.
fn normalize_internal_key(raw: &str) -> String {
    let key = raw.trim();
    let key = key.strip_prefix("Bearer ").unwrap_or(key).trim();

    let key = if key.len() >= 2
        && ((key.starts_with('"') && key.ends_with('"'))
            || (key.starts_with('\'') && key.ends_with('\'')))
    {
        &key[1..key.len() - 1]
    } else {
        key
    };

    key.to_string()
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
pub struct RecordGapRequest {
    pub village_id: Option<i32>,
    pub question: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordConflictRequest {
    pub village_id: Option<i32>,
    pub question: Option<String>,
    pub answers: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct VillageQuery {
    pub village_id: i32,
}

/// POST /internal/knowledge/gaps
/// Idempotent by question content: repeats bump hit_count instead of
/// creating duplicates.
pub async fn record_gap(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecordGapRequest>,
) -> Result<Json<ApiResponse<GapDto>>, ApiError> {
    let village_id = payload
        .village_id
        .ok_or_else(|| ApiError::validation("village_id is required"))?;
    let question = payload
        .question
        .ok_or_else(|| ApiError::validation("question is required"))?;

    if question.trim().is_empty() {
        return Err(ApiError::validation("question must not be empty"));
    }

    let gap = state
        .store()
        .upsert_knowledge_gap(village_id, &question)
        .await?;

    Ok(Json(ApiResponse::success(GapDto::from(gap))))
}

/// GET /internal/knowledge/gaps?village_id=N
pub async fn list_gaps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VillageQuery>,
) -> Result<Json<ApiResponse<Vec<GapDto>>>, ApiError> {
    let gaps = state
        .store()
        .list_knowledge_gaps(query.village_id)
        .await?
        .into_iter()
        .map(GapDto::from)
        .collect();

    Ok(Json(ApiResponse::success(gaps)))
}

/// POST /internal/knowledge/conflicts
pub async fn record_conflict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecordConflictRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let village_id = payload
        .village_id
        .ok_or_else(|| ApiError::validation("village_id is required"))?;
    let question = payload
        .question
        .ok_or_else(|| ApiError::validation("question is required"))?;
    let answers = payload
        .answers
        .ok_or_else(|| ApiError::validation("answers are required"))?;

    if question.trim().is_empty() {
        return Err(ApiError::validation("question must not be empty"));
    }
    if answers.len() < 2 {
        return Err(ApiError::validation(
            "A conflict needs at least two answers",
        ));
    }

    let conflict = state
        .store()
        .upsert_knowledge_conflict(village_id, &question, &answers)
        .await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": conflict.id,
        "village_id": conflict.village_id,
        "question": conflict.question,
        "hit_count": conflict.hit_count,
    }))))
}
