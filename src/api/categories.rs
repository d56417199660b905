use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CategoryDto};
use crate::services::ResolvedSession;

/// GET /categories
/// Knowledge categories for the caller's own village.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ResolvedSession>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let village_id = session
        .village_id
        .ok_or_else(|| ApiError::Forbidden("No village associated with this account".to_string()))?;

    let categories = state
        .store()
        .list_categories(village_id)
        .await?
        .into_iter()
        .map(CategoryDto::from)
        .collect();

    Ok(Json(ApiResponse::success(categories)))
}
