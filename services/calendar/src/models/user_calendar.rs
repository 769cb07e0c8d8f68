//! User to calendar sharing link

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Live link granting a user access to a calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserCalendar {
    pub user_calendar_id: i64,
    pub user_id: i64,
    pub calendar_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Link creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserCalendarRequest {
    pub user_id: i64,
    pub calendar_id: i64,
}
