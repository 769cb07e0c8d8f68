//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{Role, User};

/// Value shown instead of the session token when sessions are listed
pub const MASKED_TOKEN: &str = "********";

/// Session entity
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub user_session_id: i64,
    pub user_id: i64,
    pub session_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Session as exposed to its owner: token masked, refresh token omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub user_session_id: i64,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            user_session_id: session.user_session_id,
            session_token: MASKED_TOKEN.to_string(),
            expires_at: session.expires_at,
            device_info: session.device_info,
            ip_address: session.ip_address,
            location: session.location,
            is_active: session.is_active,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// New session creation payload
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub session_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
}

/// Request for user login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for user login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub session_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

/// Request for session refresh
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response for session refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_view_masks_tokens() {
        let session = Session {
            user_session_id: 7,
            user_id: 1,
            session_token: "a".repeat(64),
            refresh_token: Some("b".repeat(64)),
            expires_at: Utc::now(),
            device_info: Some("curl/8.0".to_string()),
            ip_address: Some("203.0.113.9".to_string()),
            location: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let view = serde_json::to_value(SessionView::from(session)).unwrap();

        assert_eq!(view["session_token"], MASKED_TOKEN);
        assert!(view.get("refresh_token").is_none());
        assert_eq!(view["user_session_id"], 7);
    }
}
