use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{admins, sessions};

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persist a new session for an issued token.
    pub async fn create(
        &self,
        admin_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<sessions::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = sessions::ActiveModel {
            admin_id: Set(admin_id),
            token: Set(token.to_string()),
            expires_at: Set(expires_at.to_string()),
            created_at: Set(now),
            ..Default::default()
        };

        let model = sea_orm::ActiveModelTrait::insert(active, &self.conn)
            .await
            .context("Failed to insert session")?;

        Ok(model)
    }

    /// Look up a session by exact token match, joined with its owning admin.
    pub async fn find_with_admin(
        &self,
        token: &str,
    ) -> Result<Option<(sessions::Model, admins::Model)>> {
        let row = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .find_also_related(admins::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query session by token")?;

        Ok(row.and_then(|(session, admin)| admin.map(|a| (session, a))))
    }

    /// Server-side revocation: remove the session row for a token.
    /// Returns true when a row was actually deleted.
    pub async fn delete_by_token(&self, token: &str) -> Result<bool> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected > 0)
    }

    /// Delete all sessions whose expiry is before the given RFC 3339 instant.
    pub async fn purge_expired(&self, now: &str) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired sessions")?;

        Ok(result.rows_affected)
    }

    pub async fn count_active(&self, now: &str) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        let count = sessions::Entity::find()
            .filter(sessions::Column::ExpiresAt.gte(now))
            .count(&self.conn)
            .await
            .context("Failed to count active sessions")?;

        Ok(count)
    }

    /// Overwrite a session's expiry. Used by operational tooling and tests
    /// to force-expire a session independently of its token.
    pub async fn set_expires_at(&self, token: &str, expires_at: &str) -> Result<()> {
        let session = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session for expiry update")?
            .ok_or_else(|| anyhow::anyhow!("Session not found"))?;

        let mut active: sessions::ActiveModel = session.into();
        active.expires_at = Set(expires_at.to_string());
        sea_orm::ActiveModelTrait::update(active, &self.conn).await?;

        Ok(())
    }
}
