use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A question for which the knowledge base holds contradictory answers.
///
/// Same dedup scheme as knowledge_gaps: keyed by (village_id, question_hash).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "knowledge_conflicts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub village_id: i32,

    pub question: String,

    pub question_hash: String,

    /// JSON array of the conflicting answer texts.
    pub answers: String,

    pub hit_count: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
