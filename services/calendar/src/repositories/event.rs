//! Event repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{begin, commit, expect_row};
use crate::{
    date_range::DateRange,
    models::{Event, EventChanges, NewEvent},
};

/// Event repository
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a live event linked to a calendar by a live link
    pub async fn find_in_calendar(&self, calendar_id: i64, event_id: i64) -> DatabaseResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.event_id, e.title, e.description, e.start, e.duration, e.canceled,
                   e.created_at, e.updated_at
            FROM event e
            JOIN calendar_event ce ON ce.event_id = e.event_id
            WHERE e.event_id = $2 AND ce.calendar_id = $1
              AND e.deleted_at IS NULL AND ce.deleted_at IS NULL
            "#,
        )
        .bind(calendar_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Insert an event and link it to a calendar
    pub async fn create_in_calendar(
        &self,
        calendar_id: i64,
        event: &NewEvent,
        now: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        info!("Creating event '{}' in calendar {}", event.title, calendar_id);

        let mut tx = begin(&self.pool).await?;

        let event_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO event (title, description, start, duration, canceled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING event_id
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start)
        .bind(event.duration)
        .bind(event.canceled)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO calendar_event (calendar_id, event_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(calendar_id)
        .bind(event_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        commit(tx).await?;

        Ok(event_id)
    }

    /// Update the supplied columns of a live event; `updated_at` always advances
    pub async fn update(
        &self,
        event_id: i64,
        changes: &EventChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Event> {
        info!("Updating event: {}", event_id);

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE event SET updated_at = ");
        query.push_bind(now);
        if let Some(title) = &changes.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(start) = changes.start {
            query.push(", start = ").push_bind(start);
        }
        if let Some(duration) = changes.duration {
            query.push(", duration = ").push_bind(duration);
        }
        if let Some(canceled) = changes.canceled {
            query.push(", canceled = ").push_bind(canceled);
        }
        query
            .push(" WHERE event_id = ")
            .push_bind(event_id)
            .push(
                " AND deleted_at IS NULL \
                 RETURNING event_id, title, description, start, duration, canceled, \
                 created_at, updated_at",
            );

        let event = query
            .build_query_as::<Event>()
            .fetch_one(&self.pool)
            .await?;

        Ok(event)
    }

    /// Logically delete an event and its calendar links
    pub async fn delete(&self, event_id: i64, now: DateTime<Utc>) -> DatabaseResult<()> {
        info!("Deleting event: {}", event_id);

        let mut tx = begin(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE event SET deleted_at = $2
            WHERE event_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(event_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        expect_row(result)?;

        sqlx::query(
            r#"
            UPDATE calendar_event SET deleted_at = $2
            WHERE event_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(event_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        commit(tx).await?;

        Ok(())
    }

    /// Every live event of a calendar ordered by start
    pub async fn list_for_calendar(&self, calendar_id: i64) -> DatabaseResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.event_id, e.title, e.description, e.start, e.duration, e.canceled,
                   e.created_at, e.updated_at
            FROM event e
            JOIN calendar_event ce ON ce.event_id = e.event_id
            WHERE ce.calendar_id = $1 AND e.deleted_at IS NULL AND ce.deleted_at IS NULL
            ORDER BY e.start ASC, e.event_id ASC
            "#,
        )
        .bind(calendar_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Live events of a calendar starting inside `range`, ordered by start
    pub async fn list_in_range(
        &self,
        calendar_id: i64,
        range: &DateRange,
    ) -> DatabaseResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.event_id, e.title, e.description, e.start, e.duration, e.canceled,
                   e.created_at, e.updated_at
            FROM event e
            JOIN calendar_event ce ON ce.event_id = e.event_id
            WHERE ce.calendar_id = $1
              AND e.deleted_at IS NULL AND ce.deleted_at IS NULL
              AND e.start >= $2 AND e.start < $3
            ORDER BY e.start ASC, e.event_id ASC
            "#,
        )
        .bind(calendar_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
