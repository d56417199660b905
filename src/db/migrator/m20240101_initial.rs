use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap superadmin username. Password must be rotated after first login.
const BOOTSTRAP_USERNAME: &str = "superadmin";

/// Hash the bootstrap password using Argon2id
fn hash_bootstrap_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash bootstrap password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Villages)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Admins)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Sessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AuditLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(KnowledgeCategories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(KnowledgeGaps)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(KnowledgeConflicts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Dedup keys for the idempotent knowledge upserts.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_knowledge_gaps_village_hash")
                    .table(KnowledgeGaps)
                    .col(crate::entities::knowledge_gaps::Column::VillageId)
                    .col(crate::entities::knowledge_gaps::Column::QuestionHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_knowledge_conflicts_village_hash")
                    .table(KnowledgeConflicts)
                    .col(crate::entities::knowledge_conflicts::Column::VillageId)
                    .col(crate::entities::knowledge_conflicts::Column::QuestionHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Seed the bootstrap superadmin with a hashed password
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_bootstrap_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Admins)
            .columns([
                crate::entities::admins::Column::Username,
                crate::entities::admins::Column::Name,
                crate::entities::admins::Column::PasswordHash,
                crate::entities::admins::Column::Role,
                crate::entities::admins::Column::IsActive,
                crate::entities::admins::Column::CreatedAt,
            ])
            .values_panic([
                BOOTSTRAP_USERNAME.into(),
                "Platform Superadmin".into(),
                password_hash.into(),
                "superadmin".into(),
                true.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KnowledgeConflicts).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(KnowledgeGaps).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(KnowledgeCategories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Villages).to_owned())
            .await?;

        Ok(())
    }
}
