//! Session repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{FromRow, PgPool};
use tracing::info;

use super::expect_row;
use crate::models::{NewSession, Session, User};

/// Owner of an active session together with its expiry
#[derive(Debug, Clone, FromRow)]
pub struct ValidatedSession {
    #[sqlx(flatten)]
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new active session
    pub async fn create(&self, session: &NewSession, now: DateTime<Utc>) -> DatabaseResult<Session> {
        info!("Creating session for user: {}", session.user_id);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO user_session
                (user_id, session_token, refresh_token, expires_at,
                 device_info, ip_address, location, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
            RETURNING user_session_id, user_id, session_token, refresh_token, expires_at,
                      device_info, ip_address, location, is_active, created_at, updated_at
            "#,
        )
        .bind(session.user_id)
        .bind(&session.session_token)
        .bind(&session.refresh_token)
        .bind(session.expires_at)
        .bind(&session.device_info)
        .bind(&session.ip_address)
        .bind(&session.location)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Active, live session for `token` and its live owner
    ///
    /// Expiry is left to the caller so that an expired session can be told
    /// apart from an unknown one.
    pub async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<ValidatedSession>> {
        let session = sqlx::query_as::<_, ValidatedSession>(
            r#"
            SELECT u.user_id, u.lastname, u.firstname, u.email, u.created_at, u.updated_at,
                   s.expires_at
            FROM user_session s
            JOIN "user" u ON u.user_id = s.user_id
            WHERE s.session_token = $1
              AND s.is_active = TRUE
              AND s.deleted_at IS NULL
              AND u.deleted_at IS NULL
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Deactivate the active session holding `token`, returning how many rows changed
    pub async fn deactivate_by_token(&self, token: &str, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_session SET is_active = FALSE, updated_at = $2
            WHERE session_token = $1 AND is_active = TRUE AND deleted_at IS NULL
            "#,
        )
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Active, live session owning `refresh_token`
    pub async fn find_active_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> DatabaseResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT s.user_session_id, s.user_id, s.session_token, s.refresh_token, s.expires_at,
                   s.device_info, s.ip_address, s.location, s.is_active, s.created_at, s.updated_at
            FROM user_session s
            JOIN "user" u ON u.user_id = s.user_id
            WHERE s.refresh_token = $1
              AND s.is_active = TRUE
              AND s.deleted_at IS NULL
              AND u.deleted_at IS NULL
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Replace the session token and expiry of a session
    pub async fn rotate(
        &self,
        user_session_id: i64,
        session_token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        info!("Refreshing session: {}", user_session_id);

        let result = sqlx::query(
            r#"
            UPDATE user_session SET session_token = $2, expires_at = $3, updated_at = $4
            WHERE user_session_id = $1 AND is_active = TRUE AND deleted_at IS NULL
            "#,
        )
        .bind(user_session_id)
        .bind(session_token)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result)
    }

    /// Every live session of a user, newest first
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT user_session_id, user_id, session_token, refresh_token, expires_at,
                   device_info, ip_address, location, is_active, created_at, updated_at
            FROM user_session
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, user_session_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Logically delete a live session belonging to `user_id`
    pub async fn soft_delete_for_user(
        &self,
        user_session_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        info!("Deleting session {} of user {}", user_session_id, user_id);

        let result = sqlx::query(
            r#"
            UPDATE user_session SET is_active = FALSE, updated_at = $3, deleted_at = $3
            WHERE user_session_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_session_id)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result)
    }
}
