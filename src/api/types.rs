use serde::Serialize;

use crate::clients::ai::EmbeddingStatus;
use crate::db::Admin;
use crate::entities::{audit_logs, knowledge_categories, knowledge_gaps, villages};
use crate::services::AdminInfo;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Login and registration responses keep token and user at the top level,
/// which is the shape the dashboard frontend expects.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: AdminInfo,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub token: String,
    pub user: AdminInfo,
    pub village: VillageDto,
}

#[derive(Debug, Serialize)]
pub struct AdminDto {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub role: String,
    pub village_id: Option<i32>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&Admin> for AdminDto {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            name: admin.name.clone(),
            role: admin.role.clone(),
            village_id: admin.village_id,
            is_active: admin.is_active,
            created_at: admin.created_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VillageDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub short_name: Option<String>,
    pub created_at: String,
}

impl From<villages::Model> for VillageDto {
    fn from(model: villages::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            short_name: model.short_name,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub village_id: i32,
    pub name: String,
}

impl From<knowledge_categories::Model> for CategoryDto {
    fn from(model: knowledge_categories::Model) -> Self {
        Self {
            id: model.id,
            village_id: model.village_id,
            name: model.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GapDto {
    pub id: i32,
    pub village_id: i32,
    pub question: String,
    pub hit_count: i32,
    pub updated_at: String,
}

impl From<knowledge_gaps::Model> for GapDto {
    fn from(model: knowledge_gaps::Model) -> Self {
        Self {
            id: model.id,
            village_id: model.village_id,
            question: model.question,
            hit_count: model.hit_count,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditEntryDto {
    pub action: String,
    pub ip: String,
    pub created_at: String,
}

impl From<audit_logs::Model> for AuditEntryDto {
    fn from(model: audit_logs::Model) -> Self {
        Self {
            action: model.action,
            ip: model.ip,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatusDto {
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: u64,
    pub villages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingStatus>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
