//! User to calendar link repository

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;

use crate::models::UserCalendar;

/// User calendar link repository
#[derive(Clone)]
pub struct UserCalendarRepository {
    pool: PgPool,
}

impl UserCalendarRepository {
    /// Create a new link repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The live link between a user and a calendar
    pub async fn find(&self, user_id: i64, calendar_id: i64) -> DatabaseResult<UserCalendar> {
        let link = sqlx::query_as::<_, UserCalendar>(
            r#"
            SELECT user_calendar_id, user_id, calendar_id, created_at, updated_at
            FROM user_calendar
            WHERE user_id = $1 AND calendar_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(link)
    }

    /// Whether a live link exists
    pub async fn exists(&self, user_id: i64, calendar_id: i64) -> DatabaseResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_calendar
                WHERE user_id = $1 AND calendar_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a live link
    pub async fn create(
        &self,
        user_id: i64,
        calendar_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<UserCalendar> {
        info!("Sharing calendar {} with user {}", calendar_id, user_id);

        let link = sqlx::query_as::<_, UserCalendar>(
            r#"
            INSERT INTO user_calendar (user_id, calendar_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING user_calendar_id, user_id, calendar_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(link)
    }

    /// Advance `updated_at` of a live link
    pub async fn touch(
        &self,
        user_id: i64,
        calendar_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<UserCalendar> {
        let link = sqlx::query_as::<_, UserCalendar>(
            r#"
            UPDATE user_calendar SET updated_at = $3
            WHERE user_id = $1 AND calendar_id = $2 AND deleted_at IS NULL
            RETURNING user_calendar_id, user_id, calendar_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(link)
    }

    /// Logically delete a live link
    pub async fn delete(
        &self,
        user_id: i64,
        calendar_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        info!("Unsharing calendar {} from user {}", calendar_id, user_id);

        let result = sqlx::query(
            r#"
            UPDATE user_calendar SET deleted_at = $3
            WHERE user_id = $1 AND calendar_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        super::expect_row(result)
    }

    /// Live links of a user whose calendar is live too
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<UserCalendar>> {
        let links = sqlx::query_as::<_, UserCalendar>(
            r#"
            SELECT uc.user_calendar_id, uc.user_id, uc.calendar_id, uc.created_at, uc.updated_at
            FROM user_calendar uc
            JOIN calendar c ON c.calendar_id = uc.calendar_id
            WHERE uc.user_id = $1 AND uc.deleted_at IS NULL AND c.deleted_at IS NULL
            ORDER BY uc.calendar_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }
}
