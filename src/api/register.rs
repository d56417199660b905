use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{client_ip, extract_token};
use super::{ApiError, AppState, RegisterResponse, VillageDto};
use crate::services::{AdminInfo, RegisterVillageRequest};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub village_name: Option<String>,
    pub village_slug: Option<String>,
    pub short_name: Option<String>,
}

/// POST /auth/register
/// Onboard a new village with its founding admin. Superadmin only; the
/// check is done here rather than in the guard because the route is not
/// part of the protected router (a missing token must yield 403, not 401,
/// so that the dashboard treats it as a permissions problem).
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let caller = match extract_token(&headers) {
        Some(token) => state
            .shared
            .auth
            .resolve(&token)
            .await
            .map_err(|_| ApiError::Forbidden("Superadmin access required".to_string()))?,
        None => {
            return Err(ApiError::Forbidden("Superadmin access required".to_string()));
        }
    };

    if !caller.role.is_superadmin() {
        return Err(ApiError::Forbidden("Superadmin access required".to_string()));
    }

    let request = RegisterVillageRequest {
        village_name: payload
            .village_name
            .ok_or_else(|| ApiError::validation("Village name is required"))?,
        slug: payload
            .village_slug
            .ok_or_else(|| ApiError::validation("Village slug is required"))?,
        short_name: payload.short_name,
        admin_username: payload
            .username
            .ok_or_else(|| ApiError::validation("Admin username is required"))?,
        admin_name: payload
            .name
            .ok_or_else(|| ApiError::validation("Admin name is required"))?,
        admin_password: payload
            .password
            .ok_or_else(|| ApiError::validation("Admin password is required"))?,
    };

    let registered = state.shared.provisioning.register_village(request).await?;

    // The new admin gets a working token right away, but only in the body.
    // The superadmin's own cookie must stay untouched.
    let token = state
        .shared
        .auth
        .issue_session(&registered.admin, &client_ip(&headers))
        .await?;

    Ok(Json(RegisterResponse {
        success: true,
        token,
        user: AdminInfo::from(&registered.admin),
        village: VillageDto::from(registered.village),
    }))
}
