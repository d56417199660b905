use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A question the chatbot could not answer for a tenant.
///
/// Deduplicated by (village_id, question_hash); repeats bump hit_count.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "knowledge_gaps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub village_id: i32,

    pub question: String,

    /// SHA-256 of the normalized question text.
    pub question_hash: String,

    pub hit_count: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
