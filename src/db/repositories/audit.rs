use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::audit_logs;

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, admin_id: i32, action: &str, ip: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = audit_logs::ActiveModel {
            admin_id: Set(admin_id),
            action: Set(action.to_string()),
            ip: Set(ip.to_string()),
            created_at: Set(now),
            ..Default::default()
        };

        audit_logs::Entity::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert audit log entry")?;

        Ok(())
    }

    pub async fn recent_for_admin(
        &self,
        admin_id: i32,
        limit: u64,
    ) -> Result<Vec<audit_logs::Model>> {
        use sea_orm::QuerySelect;

        audit_logs::Entity::find()
            .filter(audit_logs::Column::AdminId.eq(admin_id))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query audit log")
    }
}
