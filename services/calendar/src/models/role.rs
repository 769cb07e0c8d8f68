//! Role model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the role that unlocks administrative endpoints
pub const ADMIN_ROLE: &str = "admin";

/// Role given to every newly registered user
pub const DEFAULT_ROLE: &str = "user";

/// Role entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub role_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// New role creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Response for role creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleResponse {
    pub role_id: i64,
}

/// Role update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Assignment or revocation of a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignmentRequest {
    pub user_id: i64,
    pub role_id: i64,
}
