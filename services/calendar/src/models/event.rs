//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Event entity; `duration` is in minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub event_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub duration: i32,
    pub canceled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Event creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub duration: i32,
    pub canceled: Option<bool>,
    /// Must match the calendar of the path when given
    pub calendar_id: Option<i64>,
}

/// Validated event ready to be inserted
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub duration: i32,
    pub canceled: bool,
}

/// Response for event creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub event_id: i64,
    pub calendar_id: i64,
}

/// Partial event update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub canceled: Option<bool>,
}
