//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Role;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub lastname: String,
    pub firstname: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A live user joined to their live password row
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Authenticated user together with the roles they hold
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub roles: Vec<Role>,
}

/// User registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub lastname: String,
    pub firstname: String,
    pub email: String,
    pub password: String,
}

/// Response for user registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user_id: i64,
}

/// User update payload, every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub lastname: Option<String>,
    pub firstname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated user ready to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub lastname: String,
    pub firstname: String,
    pub email: String,
    pub password_hash: String,
}

/// Validated user changes; the password is already hashed
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub lastname: Option<String>,
    pub firstname: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}
