//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL test database is reachable with the
//! `TEST_DB_*` configuration. Run them with `cargo test -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_test_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await, "Database health check failed");

    let row = sqlx::query("SELECT 1 AS result, current_setting('TimeZone') AS tz")
        .fetch_one(&pool)
        .await?;

    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    let timezone: String = row.get("tz");
    assert_eq!(timezone, "UTC", "Connections must run in UTC");

    Ok(())
}
