//! Database module for handling PostgreSQL connections and operations
//!
//! This module provides connection pooling, configuration, schema migrations
//! and health checks for the PostgreSQL database.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{
    PgPool,
    migrate::Migrator,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{env, time::Duration};
use tracing::{error, info};

/// Default PostgreSQL port used when `DB_PORT` is not set
pub const DEFAULT_PORT: u16 = 5432;

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Explicit connection URL, takes precedence over the individual fields
    pub database_url: Option<String>,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database name
    pub database: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: Full connection URL (optional, overrides the `DB_*` values)
    /// - `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_NAME`: Connection parameters
    /// - `DB_PORT`: Port (default: 5432)
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 10)
    /// - `DATABASE_MIN_CONNECTIONS`: Minimum number of connections (default: 1)
    /// - `DATABASE_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 30)
    pub fn from_env() -> DatabaseResult<Self> {
        Self::from_prefixed_env("DB", env::var("DATABASE_URL").ok())
    }

    /// Create a DatabaseConfig for the test database from the `TEST_DB_*` variables
    pub fn from_test_env() -> DatabaseResult<Self> {
        Self::from_prefixed_env("TEST_DB", env::var("TEST_DATABASE_URL").ok())
    }

    fn from_prefixed_env(prefix: &str, database_url: Option<String>) -> DatabaseResult<Self> {
        let var = |name: &str| env::var(format!("{prefix}_{name}")).ok();

        let port = match var("PORT") {
            Some(port) => port.parse().map_err(|e| {
                DatabaseError::Configuration(format!("Invalid {prefix}_PORT: {e}"))
            })?,
            None => DEFAULT_PORT,
        };

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let min_connections = env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let connection_timeout = env::var("DATABASE_CONNECTION_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url,
            user: var("USER").unwrap_or_else(|| "postgres".to_string()),
            password: var("PASSWORD").unwrap_or_default(),
            host: var("HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            database: var("NAME").unwrap_or_else(|| "calendar".to_string()),
            max_connections,
            min_connections,
            connection_timeout,
        })
    }

    /// Build the connection options described by this configuration
    pub fn connect_options(&self) -> DatabaseResult<PgConnectOptions> {
        let options = match &self.database_url {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?,
            None => PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.database),
        };

        // Timestamps are stored and compared as UTC
        Ok(options.options([("timezone", "UTC"), ("client_encoding", "UTF8")]))
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connection_timeout))
    }
}

/// Initialize a PostgreSQL connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<PgPool>` - PostgreSQL connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    info!(
        "Initializing database connection pool for {}:{}/{}",
        config.host, config.port, config.database
    );

    let pool = config
        .pool_options()
        .connect_with(config.connect_options()?)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Create a pool that only connects when first used
///
/// Useful for wiring an application together before the database is reachable.
pub fn init_lazy_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    Ok(config.pool_options().connect_lazy_with(config.connect_options()?))
}

/// Apply every pending migration of `migrator`
pub async fn run_migrations(pool: &PgPool, migrator: &Migrator) -> DatabaseResult<()> {
    info!("Applying database migrations");
    migrator.run(pool).await.map_err(DatabaseError::Migration)?;
    info!("Database migrations applied");
    Ok(())
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - PostgreSQL connection pool
///
/// # Returns
///
/// * `bool` - True if the database answered, false otherwise
pub async fn health_check(pool: &PgPool) -> bool {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            error!("Database health check failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "DATABASE_URL",
        "DB_USER",
        "DB_PASSWORD",
        "DB_HOST",
        "DB_PORT",
        "DB_NAME",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_MIN_CONNECTIONS",
        "DATABASE_CONNECTION_TIMEOUT",
        "TEST_DB_NAME",
    ];

    fn clear_env() {
        for var in VARS.iter().copied() {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_database_config_defaults() {
        clear_env();

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database, "calendar");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connection_timeout, 30);
    }

    #[test]
    #[serial]
    fn test_database_config_from_db_variables() {
        clear_env();
        unsafe {
            env::set_var("DB_USER", "cal");
            env::set_var("DB_PASSWORD", "secret");
            env::set_var("DB_HOST", "db.internal");
            env::set_var("DB_PORT", "6543");
            env::set_var("DB_NAME", "agenda");
            env::set_var("DATABASE_MAX_CONNECTIONS", "20");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.user, "cal");
        assert_eq!(config.password, "secret");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.database, "agenda");
        assert_eq!(config.max_connections, 20);
        assert!(config.connect_options().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_a_configuration_error() {
        clear_env();
        unsafe {
            env::set_var("DB_PORT", "not-a-port");
        }

        let result = DatabaseConfig::from_env();
        assert!(matches!(result, Err(DatabaseError::Configuration(_))));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_test_database_config_uses_test_prefix() {
        clear_env();
        unsafe {
            env::set_var("DB_NAME", "agenda");
            env::set_var("TEST_DB_NAME", "agenda_test");
        }

        let config = DatabaseConfig::from_test_env().unwrap();
        assert_eq!(config.database, "agenda_test");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_database_url_is_rejected() {
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "not a url");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert!(matches!(
            config.connect_options(),
            Err(DatabaseError::Configuration(_))
        ));

        clear_env();
    }
}
