use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::villages;

pub struct VillageRepository {
    conn: DatabaseConnection,
}

impl VillageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a village. Slug uniqueness is enforced by the database
    /// constraint, not a pre-check, so concurrent registrations with the
    /// same slug cannot race past each other. The raw `DbErr` is returned
    /// so callers can translate a unique violation into a conflict.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        short_name: Option<&str>,
    ) -> Result<villages::Model, DbErr> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = villages::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            short_name: Set(short_name.map(ToString::to_string)),
            created_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<villages::Model>> {
        villages::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query village by ID")
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<villages::Model>> {
        villages::Entity::find()
            .filter(villages::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query village by slug")
    }

    pub async fn list_all(&self) -> Result<Vec<villages::Model>> {
        villages::Entity::find()
            .order_by_asc(villages::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list villages")
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        villages::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count villages")
    }
}
