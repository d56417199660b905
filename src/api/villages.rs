use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, VillageDto};

/// GET /villages
pub async fn list_villages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<VillageDto>>>, ApiError> {
    let villages = state
        .store()
        .list_villages()
        .await?
        .into_iter()
        .map(VillageDto::from)
        .collect();

    Ok(Json(ApiResponse::success(villages)))
}

/// GET /villages/{id}
pub async fn get_village(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VillageDto>>, ApiError> {
    let village = state
        .store()
        .get_village(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Village", id))?;

    Ok(Json(ApiResponse::success(VillageDto::from(village))))
}
