pub mod prelude;

pub mod admins;
pub mod audit_logs;
pub mod knowledge_categories;
pub mod knowledge_conflicts;
pub mod knowledge_gaps;
pub mod sessions;
pub mod villages;
