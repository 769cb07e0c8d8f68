//! Calendar repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{begin, commit, expect_row};
use crate::models::{Calendar, CalendarChanges};

/// Calendar repository
#[derive(Clone)]
pub struct CalendarRepository {
    pool: PgPool,
}

impl CalendarRepository {
    /// Create a new calendar repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a live calendar by ID
    pub async fn find_by_id(&self, calendar_id: i64) -> DatabaseResult<Calendar> {
        let calendar = sqlx::query_as::<_, Calendar>(
            r#"
            SELECT calendar_id, title, description, created_at, updated_at
            FROM calendar
            WHERE calendar_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(calendar_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(calendar)
    }

    /// Live calendars shared with a user
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Calendar>> {
        let calendars = sqlx::query_as::<_, Calendar>(
            r#"
            SELECT c.calendar_id, c.title, c.description, c.created_at, c.updated_at
            FROM calendar c
            JOIN user_calendar uc ON uc.calendar_id = c.calendar_id
            WHERE uc.user_id = $1 AND uc.deleted_at IS NULL AND c.deleted_at IS NULL
            ORDER BY c.calendar_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(calendars)
    }

    /// Insert a calendar and share it with its creator
    pub async fn create_for_user(
        &self,
        user_id: i64,
        title: &str,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        info!("Creating calendar '{}' for user {}", title, user_id);

        let mut tx = begin(&self.pool).await?;

        let calendar_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO calendar (title, description, created_at)
            VALUES ($1, $2, $3)
            RETURNING calendar_id
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_calendar (user_id, calendar_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        commit(tx).await?;

        Ok(calendar_id)
    }

    /// Update the supplied columns of a live calendar; `updated_at` always advances
    pub async fn update(
        &self,
        calendar_id: i64,
        changes: &CalendarChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Calendar> {
        info!("Updating calendar: {}", calendar_id);

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE calendar SET updated_at = ");
        query.push_bind(now);
        if let Some(title) = &changes.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description);
        }
        query
            .push(" WHERE calendar_id = ")
            .push_bind(calendar_id)
            .push(
                " AND deleted_at IS NULL \
                 RETURNING calendar_id, title, description, created_at, updated_at",
            );

        let calendar = query
            .build_query_as::<Calendar>()
            .fetch_one(&self.pool)
            .await?;

        Ok(calendar)
    }

    /// Logically delete a calendar together with its events and every live
    /// link to it, all stamped with the same instant
    pub async fn delete(&self, calendar_id: i64, now: DateTime<Utc>) -> DatabaseResult<()> {
        info!("Deleting calendar: {}", calendar_id);

        let mut tx = begin(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE calendar SET deleted_at = $2
            WHERE calendar_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(calendar_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        expect_row(result)?;

        // Events are reached through their links, so they go first
        for statement in [
            "UPDATE event e SET deleted_at = $2 \
             FROM calendar_event ce \
             WHERE ce.event_id = e.event_id AND ce.calendar_id = $1 \
               AND ce.deleted_at IS NULL AND e.deleted_at IS NULL",
            "UPDATE user_calendar SET deleted_at = $2 \
             WHERE calendar_id = $1 AND deleted_at IS NULL",
            "UPDATE calendar_event SET deleted_at = $2 \
             WHERE calendar_id = $1 AND deleted_at IS NULL",
        ] {
            sqlx::query(statement)
                .bind(calendar_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        commit(tx).await?;

        Ok(())
    }

    /// Succeeds when the user is linked to the calendar, `RowNotFound` otherwise
    pub async fn user_has_access(&self, user_id: i64, calendar_id: i64) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            SELECT 1 FROM user_calendar
            WHERE user_id = $1 AND calendar_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(calendar_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(())
    }
}
