//! Village onboarding: village row, default knowledge categories, channel
//! account, and the founding admin, in that order.

use std::sync::Arc;

use sea_orm::SqlErr;
use tracing::{info, warn};

use crate::clients::channel::ChannelClient;
use crate::config::SecurityConfig;
use crate::db::{Admin, NewAdmin, Store};
use crate::entities::villages;
use crate::services::auth_service::{AuthError, Role};

pub struct RegisterVillageRequest {
    pub village_name: String,
    pub slug: String,
    pub short_name: Option<String>,
    pub admin_username: String,
    pub admin_name: String,
    pub admin_password: String,
}

pub struct RegisteredVillage {
    pub village: villages::Model,
    pub admin: Admin,
}

pub struct ProvisioningService {
    store: Store,
    channel: Arc<ChannelClient>,
    security: SecurityConfig,
}

impl ProvisioningService {
    pub fn new(store: Store, channel: Arc<ChannelClient>, security: SecurityConfig) -> Self {
        Self {
            store,
            channel,
            security,
        }
    }

    fn validate(req: &RegisterVillageRequest) -> Result<(), AuthError> {
        if req.village_name.trim().is_empty() {
            return Err(AuthError::Validation("Village name is required".to_string()));
        }
        if req.slug.trim().is_empty() {
            return Err(AuthError::Validation("Village slug is required".to_string()));
        }

        // A username of only whitespace would trim to empty at login and
        // leave the account unreachable forever; one with embedded
        // whitespace would never round-trip through the login trim.
        let username = req.admin_username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation(
                "Admin username is required".to_string(),
            ));
        }
        if username.contains(char::is_whitespace) {
            return Err(AuthError::Validation(
                "Admin username must not contain whitespace".to_string(),
            ));
        }
        if req.admin_name.trim().is_empty() {
            return Err(AuthError::Validation("Admin name is required".to_string()));
        }
        if req.admin_password.len() < 8 {
            return Err(AuthError::Validation(
                "Admin password must be at least 8 characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Superadmin-only entry point; the caller is responsible for having
    /// checked the role already.
    pub async fn register_village(
        &self,
        req: RegisterVillageRequest,
    ) -> Result<RegisteredVillage, AuthError> {
        Self::validate(&req)?;

        let slug = req.slug.trim().to_lowercase();

        // Uniqueness is enforced by the slug's unique index, not a
        // precheck; concurrent registrations race safely.
        let village = self
            .store
            .create_village(req.village_name.trim(), &slug, req.short_name.as_deref())
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AuthError::Conflict(format!("Village slug already in use: {slug}"))
                }
                _ => AuthError::Database(err.to_string()),
            })?;

        self.store.create_default_categories(village.id).await?;

        // Best effort: a channel outage must not block onboarding. The
        // account can be provisioned again from the channel service side.
        if let Err(err) = self.channel.provision_account(village.id, &slug).await {
            warn!(village_id = village.id, error = %err, "Channel account provisioning failed, continuing");
        }

        let username = req.admin_username.trim().to_string();
        let admin = self
            .store
            .create_admin(
                NewAdmin {
                    username: username.clone(),
                    name: req.admin_name.trim().to_string(),
                    password: req.admin_password,
                    role: Role::VillageAdmin.as_str().to_string(),
                    village_id: Some(village.id),
                },
                &self.security,
            )
            .await
            .map_err(|err| {
                // Same translation as the slug path: a taken username is
                // user-correctable input, not a server fault.
                match err
                    .downcast_ref::<sea_orm::DbErr>()
                    .and_then(sea_orm::DbErr::sql_err)
                {
                    Some(SqlErr::UniqueConstraintViolation(_)) => {
                        AuthError::Conflict(format!("Admin username already taken: {username}"))
                    }
                    _ => AuthError::Database(err.to_string()),
                }
            })?;

        info!(
            village_id = village.id,
            slug = %village.slug,
            admin_id = admin.id,
            "Village registered"
        );

        Ok(RegisteredVillage { village, admin })
    }
}
