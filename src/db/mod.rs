use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{audit_logs, knowledge_categories, knowledge_conflicts, knowledge_gaps, villages};

pub mod migrator;
pub mod repositories;

pub use repositories::admin::{Admin, NewAdmin};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn village_repo(&self) -> repositories::village::VillageRepository {
        repositories::village::VillageRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    fn knowledge_repo(&self) -> repositories::knowledge::KnowledgeRepository {
        repositories::knowledge::KnowledgeRepository::new(self.conn.clone())
    }

    // ========== Admin ==========

    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        self.admin_repo().get_by_username(username).await
    }

    pub async fn get_admin_by_id(&self, id: i32) -> Result<Option<Admin>> {
        self.admin_repo().get_by_id(id).await
    }

    pub async fn verify_admin_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>> {
        self.admin_repo().verify_credentials(username, password).await
    }

    pub async fn create_admin(&self, new: NewAdmin, config: &SecurityConfig) -> Result<Admin> {
        self.admin_repo().create(new, config).await
    }

    pub async fn update_admin_password(&self, username: &str, new_password: &str) -> Result<()> {
        self.admin_repo().update_password(username, new_password).await
    }

    pub async fn set_admin_active(&self, id: i32, is_active: bool) -> Result<()> {
        self.admin_repo().set_active(id, is_active).await
    }

    // ========== Sessions ==========

    pub async fn create_session(
        &self,
        admin_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<crate::entities::sessions::Model> {
        self.session_repo().create(admin_id, token, expires_at).await
    }

    pub async fn find_session_with_admin(
        &self,
        token: &str,
    ) -> Result<Option<(crate::entities::sessions::Model, crate::entities::admins::Model)>> {
        self.session_repo().find_with_admin(token).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        self.session_repo().delete_by_token(token).await
    }

    pub async fn purge_expired_sessions(&self, now: &str) -> Result<u64> {
        self.session_repo().purge_expired(now).await
    }

    pub async fn count_active_sessions(&self, now: &str) -> Result<u64> {
        self.session_repo().count_active(now).await
    }

    pub async fn set_session_expiry(&self, token: &str, expires_at: &str) -> Result<()> {
        self.session_repo().set_expires_at(token, expires_at).await
    }

    // ========== Villages ==========

    pub async fn create_village(
        &self,
        name: &str,
        slug: &str,
        short_name: Option<&str>,
    ) -> Result<villages::Model, sea_orm::DbErr> {
        self.village_repo().create(name, slug, short_name).await
    }

    pub async fn get_village(&self, id: i32) -> Result<Option<villages::Model>> {
        self.village_repo().get_by_id(id).await
    }

    pub async fn get_village_by_slug(&self, slug: &str) -> Result<Option<villages::Model>> {
        self.village_repo().get_by_slug(slug).await
    }

    pub async fn list_villages(&self) -> Result<Vec<villages::Model>> {
        self.village_repo().list_all().await
    }

    pub async fn village_count(&self) -> Result<u64> {
        self.village_repo().count().await
    }

    // ========== Audit ==========

    pub async fn add_audit_entry(&self, admin_id: i32, action: &str, ip: &str) -> Result<()> {
        self.audit_repo().add(admin_id, action, ip).await
    }

    pub async fn recent_audit_entries(
        &self,
        admin_id: i32,
        limit: u64,
    ) -> Result<Vec<audit_logs::Model>> {
        self.audit_repo().recent_for_admin(admin_id, limit).await
    }

    // ========== Knowledge ==========

    pub async fn create_default_categories(&self, village_id: i32) -> Result<()> {
        self.knowledge_repo().create_default_categories(village_id).await
    }

    pub async fn list_categories(
        &self,
        village_id: i32,
    ) -> Result<Vec<knowledge_categories::Model>> {
        self.knowledge_repo().list_categories(village_id).await
    }

    pub async fn upsert_knowledge_gap(
        &self,
        village_id: i32,
        question: &str,
    ) -> Result<knowledge_gaps::Model> {
        self.knowledge_repo().upsert_gap(village_id, question).await
    }

    pub async fn list_knowledge_gaps(&self, village_id: i32) -> Result<Vec<knowledge_gaps::Model>> {
        self.knowledge_repo().list_gaps(village_id).await
    }

    pub async fn upsert_knowledge_conflict(
        &self,
        village_id: i32,
        question: &str,
        answers: &[String],
    ) -> Result<knowledge_conflicts::Model> {
        self.knowledge_repo().upsert_conflict(village_id, question, answers).await
    }
}
