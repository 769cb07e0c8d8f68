//! Role repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::expect_row;
use crate::models::{Role, RoleChanges};

/// Role repository
#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All live roles ordered by name
    pub async fn list(&self) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT role_id, name, description, created_at, updated_at
            FROM role
            WHERE deleted_at IS NULL
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Find a live role by ID
    pub async fn find_by_id(&self, role_id: i64) -> DatabaseResult<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT role_id, name, description, created_at, updated_at
            FROM role
            WHERE role_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    /// Find a live role by name
    pub async fn find_by_name(&self, name: &str) -> DatabaseResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT role_id, name, description, created_at, updated_at
            FROM role
            WHERE name = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Whether a live role other than `except` is called `name`
    pub async fn name_taken(&self, name: &str, except: Option<i64>) -> DatabaseResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM role
                WHERE name = $1 AND deleted_at IS NULL
                  AND ($2::BIGINT IS NULL OR role_id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert a role and return its ID
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        info!("Creating role: {}", name);

        let role_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO role (name, description, created_at)
            VALUES ($1, $2, $3)
            RETURNING role_id
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(role_id)
    }

    /// Update the supplied columns of a live role; `updated_at` always advances
    pub async fn update(
        &self,
        role_id: i64,
        changes: &RoleChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Role> {
        info!("Updating role: {}", role_id);

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE role SET updated_at = ");
        query.push_bind(now);
        if let Some(name) = &changes.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description);
        }
        query
            .push(" WHERE role_id = ")
            .push_bind(role_id)
            .push(
                " AND deleted_at IS NULL \
                 RETURNING role_id, name, description, created_at, updated_at",
            );

        let role = query
            .build_query_as::<Role>()
            .fetch_one(&self.pool)
            .await?;

        Ok(role)
    }

    /// Logically delete a live role
    pub async fn soft_delete(&self, role_id: i64, now: DateTime<Utc>) -> DatabaseResult<()> {
        info!("Deleting role: {}", role_id);

        let result = sqlx::query(
            r#"
            UPDATE role SET deleted_at = $2
            WHERE role_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result)
    }

    /// Logically delete every live assignment of a role
    pub async fn delete_assignments(&self, role_id: i64, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_role SET deleted_at = $2
            WHERE role_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Whether the user holds the role through a live assignment
    pub async fn assignment_exists(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_role
                WHERE user_id = $1 AND role_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Assign a role to a user
    pub async fn assign(&self, user_id: i64, role_id: i64, now: DateTime<Utc>) -> DatabaseResult<i64> {
        info!("Assigning role {} to user {}", role_id, user_id);

        let user_roles_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO user_role (user_id, role_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING user_roles_id
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_roles_id)
    }

    /// Logically delete a live assignment
    pub async fn revoke(&self, user_id: i64, role_id: i64, now: DateTime<Utc>) -> DatabaseResult<()> {
        info!("Revoking role {} from user {}", role_id, user_id);

        let result = sqlx::query(
            r#"
            UPDATE user_role SET deleted_at = $3
            WHERE user_id = $1 AND role_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result)
    }

    /// Live roles held by a user, ordered by name
    pub async fn roles_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.role_id, r.name, r.description, r.created_at, r.updated_at
            FROM role r
            JOIN user_role ur ON ur.role_id = r.role_id
            WHERE ur.user_id = $1 AND ur.deleted_at IS NULL AND r.deleted_at IS NULL
            ORDER BY r.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Whether any live user holds the role called `name`
    pub async fn any_user_has_role(&self, name: &str) -> DatabaseResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_role ur
                JOIN role r ON r.role_id = ur.role_id
                JOIN "user" u ON u.user_id = ur.user_id
                WHERE r.name = $1
                  AND ur.deleted_at IS NULL AND r.deleted_at IS NULL AND u.deleted_at IS NULL
            )
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
