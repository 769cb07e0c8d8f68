//! Common library for the calendar application
//!
//! This crate provides shared functionality used by the calendar service,
//! including database configuration, connection pooling, migrations and
//! error handling.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     println!("Database health check: {}", health_check(&pool).await);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
