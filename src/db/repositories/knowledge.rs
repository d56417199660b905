use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use sha2::{Digest, Sha256};

use crate::entities::{knowledge_categories, knowledge_conflicts, knowledge_gaps};

/// Knowledge categories every new village starts with.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Administrasi Kependudukan",
    "Layanan Surat",
    "Bantuan Sosial",
    "Pengaduan Umum",
];

pub struct KnowledgeRepository {
    conn: DatabaseConnection,
}

impl KnowledgeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create_default_categories(&self, village_id: i32) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let rows: Vec<knowledge_categories::ActiveModel> = DEFAULT_CATEGORIES
            .iter()
            .map(|name| knowledge_categories::ActiveModel {
                village_id: Set(village_id),
                name: Set((*name).to_string()),
                created_at: Set(now.clone()),
                ..Default::default()
            })
            .collect();

        knowledge_categories::Entity::insert_many(rows)
            .exec(&self.conn)
            .await
            .context("Failed to insert default categories")?;

        Ok(())
    }

    pub async fn list_categories(
        &self,
        village_id: i32,
    ) -> Result<Vec<knowledge_categories::Model>> {
        knowledge_categories::Entity::find()
            .filter(knowledge_categories::Column::VillageId.eq(village_id))
            .order_by_asc(knowledge_categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list categories")
    }

    /// Idempotent gap upsert: one row per (village, normalized question),
    /// repeats increment hit_count.
    pub async fn upsert_gap(
        &self,
        village_id: i32,
        question: &str,
    ) -> Result<knowledge_gaps::Model> {
        let hash = question_hash(question);
        let now = chrono::Utc::now().to_rfc3339();

        let existing = knowledge_gaps::Entity::find()
            .filter(knowledge_gaps::Column::VillageId.eq(village_id))
            .filter(knowledge_gaps::Column::QuestionHash.eq(hash.clone()))
            .one(&self.conn)
            .await
            .context("Failed to query knowledge gap")?;

        if let Some(gap) = existing {
            let hit_count = gap.hit_count + 1;
            let mut active: knowledge_gaps::ActiveModel = gap.into();
            active.hit_count = Set(hit_count);
            active.updated_at = Set(now);
            let updated = active
                .update(&self.conn)
                .await
                .context("Failed to bump knowledge gap hit count")?;
            return Ok(updated);
        }

        let active = knowledge_gaps::ActiveModel {
            village_id: Set(village_id),
            question: Set(question.to_string()),
            question_hash: Set(hash),
            hit_count: Set(1),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert knowledge gap")
    }

    pub async fn list_gaps(&self, village_id: i32) -> Result<Vec<knowledge_gaps::Model>> {
        knowledge_gaps::Entity::find()
            .filter(knowledge_gaps::Column::VillageId.eq(village_id))
            .order_by_desc(knowledge_gaps::Column::HitCount)
            .all(&self.conn)
            .await
            .context("Failed to list knowledge gaps")
    }

    /// Same dedup scheme as gaps; the latest answer set wins.
    pub async fn upsert_conflict(
        &self,
        village_id: i32,
        question: &str,
        answers: &[String],
    ) -> Result<knowledge_conflicts::Model> {
        let hash = question_hash(question);
        let now = chrono::Utc::now().to_rfc3339();
        let answers_json =
            serde_json::to_string(answers).context("Failed to serialize conflict answers")?;

        let existing = knowledge_conflicts::Entity::find()
            .filter(knowledge_conflicts::Column::VillageId.eq(village_id))
            .filter(knowledge_conflicts::Column::QuestionHash.eq(hash.clone()))
            .one(&self.conn)
            .await
            .context("Failed to query knowledge conflict")?;

        if let Some(conflict) = existing {
            let hit_count = conflict.hit_count + 1;
            let mut active: knowledge_conflicts::ActiveModel = conflict.into();
            active.hit_count = Set(hit_count);
            active.answers = Set(answers_json);
            active.updated_at = Set(now);
            let updated = active
                .update(&self.conn)
                .await
                .context("Failed to bump knowledge conflict hit count")?;
            return Ok(updated);
        }

        let active = knowledge_conflicts::ActiveModel {
            village_id: Set(village_id),
            question: Set(question.to_string()),
            question_hash: Set(hash),
            answers: Set(answers_json),
            hit_count: Set(1),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert knowledge conflict")
    }
}

/// Dedup key: SHA-256 over the trimmed, lowercased question.
#[must_use]
pub fn question_hash(question: &str) -> String {
    let normalized = question.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());

    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
