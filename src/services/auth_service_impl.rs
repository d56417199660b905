use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::services::auth_service::{
    AuthError, AuthService, LoginOutcome, ResolvedSession, Role,
};
use crate::services::rate_limit::RateLimiter;
use crate::services::token::TokenCodec;

pub struct SeaOrmAuthService {
    store: Store,
    codec: Arc<TokenCodec>,
    limiter: Arc<RateLimiter>,
}

impl SeaOrmAuthService {
    pub fn new(store: Store, codec: Arc<TokenCodec>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            store,
            codec,
            limiter,
        }
    }

    fn session_expiry(&self) -> String {
        (Utc::now() + self.codec.ttl()).to_rfc3339()
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        username: &str,
        password: &str,
        ip: &str,
    ) -> Result<LoginOutcome, AuthError> {
        // Check before record: the attempt that finds the window already
        // full is not itself counted.
        if !self.limiter.check(ip) {
            warn!(ip = %ip, "Login throttled");
            return Err(AuthError::RateLimited);
        }
        self.limiter.record(ip);

        // Usernames get trimmed, passwords never do.
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let admin = self
            .store
            .verify_admin_credentials(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self
            .codec
            .issue(&admin)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.store
            .create_session(admin.id, &token, &self.session_expiry())
            .await?;

        self.store.add_audit_entry(admin.id, "login", ip).await?;

        info!(admin_id = admin.id, username = %admin.username, ip = %ip, "Admin logged in");

        Ok(LoginOutcome { token, admin })
    }

    async fn resolve(&self, token: &str) -> Result<ResolvedSession, AuthError> {
        // Signature first; a forged token never touches the database.
        self.codec
            .verify(token)
            .map_err(|_| AuthError::Unauthorized)?;

        let (session, admin) = self
            .store
            .find_session_with_admin(token)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let expires_at = DateTime::parse_from_rfc3339(&session.expires_at)
            .map_err(|_| AuthError::Unauthorized)?;
        if expires_at < Utc::now() {
            debug!(session_id = session.id, "Session expired");
            return Err(AuthError::Unauthorized);
        }

        // Deactivation takes effect on the next request, not at next login.
        if !admin.is_active {
            debug!(admin_id = admin.id, "Account deactivated");
            return Err(AuthError::Unauthorized);
        }

        let role = Role::from_str(&admin.role).map_err(|_| AuthError::Unauthorized)?;

        Ok(ResolvedSession {
            session_id: session.id,
            admin_id: admin.id,
            username: admin.username,
            name: admin.name,
            role,
            village_id: admin.village_id,
            token: token.to_string(),
        })
    }

    async fn issue_session(&self, admin: &crate::db::Admin, ip: &str) -> Result<String, AuthError> {
        let token = self
            .codec
            .issue(admin)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.store
            .create_session(admin.id, &token, &self.session_expiry())
            .await?;

        self.store
            .add_audit_entry(admin.id, "session_issued", ip)
            .await?;

        Ok(token)
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let deleted = self.store.delete_session(token).await?;

        if deleted && let Ok(claims) = self.codec.verify(token) {
            self.store
                .add_audit_entry(claims.sub, "logout", "-")
                .await?;
            info!(admin_id = claims.sub, "Admin logged out");
        }

        Ok(())
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        self.store
            .verify_admin_credentials(username, current_password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.store
            .update_admin_password(username, new_password)
            .await?;

        info!(username = %username, "Password changed");
        Ok(())
    }
}
