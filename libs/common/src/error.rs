//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::{Error as SqlxError, migrate::MigrateError};
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[from] SqlxError),

    /// A transaction could not be opened
    #[error("Database transaction start error: {0}")]
    TransactionStart(#[source] SqlxError),

    /// A transaction could not be committed
    #[error("Database transaction commit error: {0}")]
    TransactionCommit(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// The query matched no row
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Query(SqlxError::RowNotFound))
    }

    /// The statement was rejected by a unique index
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Query(SqlxError::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_not_found() {
        let error = DatabaseError::from(SqlxError::RowNotFound);
        assert!(error.is_not_found());
        assert!(!error.is_unique_violation());
    }

    #[test]
    fn test_transaction_errors_are_not_not_found() {
        let error = DatabaseError::TransactionStart(SqlxError::PoolTimedOut);
        assert!(!error.is_not_found());
        assert!(!error.is_unique_violation());
    }
}
