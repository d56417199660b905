use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Admin;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately generic; unknown username, wrong password, and a
    /// deactivated account all surface as this one variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("too many login attempts")]
    RateLimited,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    VillageAdmin,
    Admin,
    Superadmin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VillageAdmin => "village_admin",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    #[must_use]
    pub const fn is_superadmin(self) -> bool {
        matches!(self, Self::Superadmin)
    }
}

impl std::str::FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "village_admin" => Ok(Self::VillageAdmin),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(AuthError::Validation(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public identity shape returned to clients after login.
#[derive(Debug, Clone, Serialize)]
pub struct AdminInfo {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub role: String,
}

impl From<&Admin> for AdminInfo {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            name: admin.name.clone(),
            role: admin.role.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub admin: Admin,
}

/// Identity attached to a request after the full resolution chain
/// (token signature, live session row, expiry, account active).
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session_id: i32,
    pub admin_id: i32,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub village_id: Option<i32>,
    pub token: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Full login flow: throttle check, attempt recording, credential
    /// verification, token issuance, session creation, audit entry.
    async fn login(
        &self,
        username: &str,
        password: &str,
        ip: &str,
    ) -> Result<LoginOutcome, AuthError>;

    /// Resolve a presented token to a live admin identity, failing closed
    /// at every step.
    async fn resolve(&self, token: &str) -> Result<ResolvedSession, AuthError>;

    /// Issue a fresh token plus session row for an already-authenticated
    /// admin (used right after registration).
    async fn issue_session(&self, admin: &Admin, ip: &str) -> Result<String, AuthError>;

    /// Revoke the session behind a token. Idempotent; unknown tokens are
    /// not an error.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
