use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::admins;

/// Admin data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub role: String,
    pub village_id: Option<i32>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            name: model.name,
            role: model.role,
            village_id: model.village_id,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Fields for a new admin account. The password arrives in plain text and
/// is hashed before it touches the database.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub village_id: Option<i32>,
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin by username")?;

        Ok(admin.map(Admin::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Admin>> {
        let admin = admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin by ID")?;

        Ok(admin.map(Admin::from))
    }

    /// Verify credentials, returning the admin only on an exact match.
    ///
    /// Returns None for an unknown username, a deactivated account, and a
    /// password mismatch alike; callers must not distinguish the three.
    /// Argon2 verification runs in `spawn_blocking` because it is
    /// CPU-intensive and would stall the async runtime.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin for credential verification")?;

        let Some(admin) = admin else {
            return Ok(None);
        };

        if !admin.is_active {
            return Ok(None);
        }

        let password_hash = admin.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| Admin::from(admin)))
    }

    pub async fn create(&self, new: NewAdmin, config: &SecurityConfig) -> Result<Admin> {
        let password = new.password;
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = admins::ActiveModel {
            username: Set(new.username),
            name: Set(new.name),
            password_hash: Set(password_hash),
            role: Set(new.role),
            village_id: Set(new.village_id),
            is_active: Set(true),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert admin")?;

        Ok(Admin::from(model))
    }

    pub async fn update_password(&self, username: &str, new_password: &str) -> Result<()> {
        let admin = admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin for password update")?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {username}"))?;

        let password = new_password.to_string();
        let new_hash = task::spawn_blocking(move || hash_password(&password, None))
            .await
            .context("Password hashing task panicked")??;

        let mut active: admins::ActiveModel = admin.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Toggle the active flag. Accounts are deactivated, never hard-deleted.
    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<()> {
        let admin = admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for activation toggle")?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {id}"))?;

        let mut active: admins::ActiveModel = admin.into();
        active.is_active = Set(is_active);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
