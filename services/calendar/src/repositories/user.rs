//! User repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{begin, commit, expect_row};
use crate::models::{NewUser, User, UserChanges, UserCredentials};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a live user by ID
    pub async fn find_by_id(&self, user_id: i64) -> DatabaseResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, lastname, firstname, email, created_at, updated_at
            FROM "user"
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a live user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, lastname, firstname, email, created_at, updated_at
            FROM "user"
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a live user by email together with their live password hash
    pub async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> DatabaseResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.user_id, u.lastname, u.firstname, u.email, u.created_at, u.updated_at,
                   p.password_hash
            FROM "user" u
            JOIN user_password p ON p.user_id = u.user_id
            WHERE u.email = $1 AND u.deleted_at IS NULL AND p.deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    /// Whether a live user other than `except` already uses `email`
    pub async fn email_taken(&self, email: &str, except: Option<i64>) -> DatabaseResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM "user"
                WHERE email = $1 AND deleted_at IS NULL
                  AND ($2::BIGINT IS NULL OR user_id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert a user, their password and the `default_role` assignment
    pub async fn create(
        &self,
        new_user: &NewUser,
        default_role: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        info!("Creating new user: {}", new_user.email);

        let mut tx = begin(&self.pool).await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO "user" (lastname, firstname, email, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id
            "#,
        )
        .bind(&new_user.lastname)
        .bind(&new_user.firstname)
        .bind(&new_user.email)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_password (user_id, password_hash, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&new_user.password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Nothing is inserted when the default role has been deleted
        sqlx::query(
            r#"
            INSERT INTO user_role (user_id, role_id, created_at)
            SELECT $1, role_id, $2 FROM role
            WHERE name = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(default_role)
        .execute(&mut *tx)
        .await?;

        commit(tx).await?;

        Ok(user_id)
    }

    /// Apply `changes` to a live user, rotating the password row when a new
    /// hash is given. `updated_at` always advances.
    pub async fn update(
        &self,
        user_id: i64,
        changes: &UserChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<User> {
        info!("Updating user: {}", user_id);

        let mut tx = begin(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(r#"UPDATE "user" SET updated_at = "#);
        query.push_bind(now);
        if let Some(lastname) = &changes.lastname {
            query.push(", lastname = ").push_bind(lastname);
        }
        if let Some(firstname) = &changes.firstname {
            query.push(", firstname = ").push_bind(firstname);
        }
        if let Some(email) = &changes.email {
            query.push(", email = ").push_bind(email);
        }
        query
            .push(" WHERE user_id = ")
            .push_bind(user_id)
            .push(
                " AND deleted_at IS NULL \
                 RETURNING user_id, lastname, firstname, email, created_at, updated_at",
            );

        let user = query
            .build_query_as::<User>()
            .fetch_one(&mut *tx)
            .await?;

        if let Some(password_hash) = &changes.password_hash {
            sqlx::query(
                r#"
                UPDATE user_password SET deleted_at = $2, updated_at = $2
                WHERE user_id = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO user_password (user_id, password_hash, created_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(user_id)
            .bind(password_hash)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        commit(tx).await?;

        Ok(user)
    }

    /// Logically delete a user along with their password, role assignments,
    /// calendar links and sessions
    pub async fn delete(&self, user_id: i64, now: DateTime<Utc>) -> DatabaseResult<()> {
        info!("Deleting user: {}", user_id);

        let mut tx = begin(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE "user" SET deleted_at = $2
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        expect_row(result)?;

        for statement in [
            "UPDATE user_password SET deleted_at = $2 WHERE user_id = $1 AND deleted_at IS NULL",
            "UPDATE user_role SET deleted_at = $2 WHERE user_id = $1 AND deleted_at IS NULL",
            "UPDATE user_calendar SET deleted_at = $2 WHERE user_id = $1 AND deleted_at IS NULL",
            "UPDATE user_session SET is_active = FALSE, updated_at = $2, deleted_at = $2 \
             WHERE user_id = $1 AND deleted_at IS NULL",
        ] {
            sqlx::query(statement)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        commit(tx).await?;

        Ok(())
    }
}
