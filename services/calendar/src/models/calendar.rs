//! Calendar model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Calendar entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Calendar {
    pub calendar_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Calendar creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCalendarRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
}

/// Response for calendar creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCalendarResponse {
    pub calendar_id: i64,
    pub user_id: i64,
}

/// Partial calendar update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}
