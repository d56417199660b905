pub use super::admins::Entity as Admins;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::knowledge_categories::Entity as KnowledgeCategories;
pub use super::knowledge_conflicts::Entity as KnowledgeConflicts;
pub use super::knowledge_gaps::Entity as KnowledgeGaps;
pub use super::sessions::Entity as Sessions;
pub use super::villages::Entity as Villages;
