use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AuditEntryDto, LoginResponse, MessageResponse};
use crate::services::{AdminInfo, ResolvedSession, Role};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

// ============================================================================
// Route matrix
// ============================================================================

/// Route prefixes (relative to /api) only a superadmin may touch.
const SUPERADMIN_ONLY: &[&str] = &["/villages", "/admins"];

/// Route prefixes that belong to village-scoped dashboards. Superadmins do
/// not own a village and have nothing to see there.
const TENANT_ONLY: &[&str] = &["/categories"];

fn role_allows(role: Role, path: &str) -> bool {
    // Robust to whether the nest prefix was already stripped.
    let path = path.strip_prefix("/api").unwrap_or(path);

    if SUPERADMIN_ONLY.iter().any(|p| path.starts_with(p)) {
        return role.is_superadmin();
    }
    if TENANT_ONLY.iter().any(|p| path.starts_with(p)) {
        return !role.is_superadmin();
    }
    true
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware for the protected router. Resolves the token
/// through the session store, enforces the role matrix for the requested
/// path, and attaches the resolved identity as a request extension.
pub async fn auth_guard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&headers) else {
        return Err(ApiError::Unauthorized("Authentication required".to_string()));
    };

    let resolved = state.shared.auth.resolve(&token).await?;

    if !role_allows(resolved.role, request.uri().path()) {
        return Err(ApiError::Forbidden(
            "Insufficient permissions for this resource".to_string(),
        ));
    }

    tracing::Span::current().record("user_id", resolved.username.as_str());
    request.extensions_mut().insert(resolved);

    Ok(next.run(request).await)
}

/// Token extraction order: `token` cookie first (browser dashboard), then
/// `Authorization: Bearer` (scripted clients).
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(header::COOKIE)
        && let Ok(cookies) = cookie_header.to_str()
    {
        for cookie in cookies.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=')
                && name == "token"
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }

    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && !token.trim().is_empty()
    {
        return Some(token.trim().to_string());
    }

    None
}

/// First x-forwarded-for entry, then x-real-ip, then "unknown". The proxy
/// in front is trusted to set these.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && !value.trim().is_empty()
    {
        return value.trim().to_string();
    }

    "unknown".to_string()
}

fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("token={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password. On success the token is
/// returned both in the body and as an HttpOnly cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let username = payload
        .username
        .ok_or_else(|| ApiError::validation("Username is required"))?;
    let password = payload
        .password
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    let ip = client_ip(&headers);

    let outcome = state.shared.auth.login(&username, &password, &ip).await?;

    let (max_age, secure) = {
        let config = state.config().read().await;
        (
            config.security.token_ttl_hours * 3600,
            config.server.secure_cookies,
        )
    };

    let body = LoginResponse {
        success: true,
        token: outcome.token.clone(),
        user: AdminInfo::from(&outcome.admin),
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    if let Ok(value) = session_cookie(&outcome.token, max_age, secure).parse() {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// POST /auth/logout
/// Revoke the session server-side and clear the cookie. Safe to call with
/// a stale or missing token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(&headers) {
        state.shared.auth.logout(&token).await?;
    }

    let secure = state.config().read().await.server.secure_cookies;

    let body = ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    });

    let mut response = (StatusCode::OK, Json(body)).into_response();
    if let Ok(value) = session_cookie("", 0, secure).parse() {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// GET /auth/me
pub async fn whoami(
    axum::Extension(session): axum::Extension<ResolvedSession>,
) -> Json<ApiResponse<AdminInfo>> {
    Json(ApiResponse::success(AdminInfo {
        id: session.admin_id,
        username: session.username,
        name: session.name,
        role: session.role.as_str().to_string(),
    }))
}

/// GET /auth/activity
/// Recent audit trail for the caller's own account.
pub async fn activity(
    State(state): State<Arc<AppState>>,
    axum::Extension(session): axum::Extension<ResolvedSession>,
) -> Result<Json<ApiResponse<Vec<AuditEntryDto>>>, ApiError> {
    let entries = state
        .store()
        .recent_audit_entries(session.admin_id, 20)
        .await?
        .into_iter()
        .map(AuditEntryDto::from)
        .collect();

    Ok(Json(ApiResponse::success(entries)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(session): axum::Extension<ResolvedSession>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let current = payload
        .current_password
        .ok_or_else(|| ApiError::validation("Current password is required"))?;
    let new = payload
        .new_password
        .ok_or_else(|| ApiError::validation("New password is required"))?;

    if current == new {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    state
        .shared
        .auth
        .change_password(&session.username, &current, &new)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matrix_superadmin_routes() {
        assert!(role_allows(Role::Superadmin, "/api/villages"));
        assert!(role_allows(Role::Superadmin, "/villages/3"));
        assert!(!role_allows(Role::VillageAdmin, "/api/villages"));
        assert!(!role_allows(Role::Admin, "/admins"));
    }

    #[test]
    fn role_matrix_tenant_routes() {
        assert!(role_allows(Role::VillageAdmin, "/api/categories"));
        assert!(!role_allows(Role::Superadmin, "/categories"));
    }

    #[test]
    fn role_matrix_shared_routes() {
        assert!(role_allows(Role::Superadmin, "/auth/me"));
        assert!(role_allows(Role::VillageAdmin, "/system/status"));
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.0.0.2");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn token_extraction_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; token=abc".parse().unwrap());
        headers.insert(header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn token_extraction_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("xyz".to_string()));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
