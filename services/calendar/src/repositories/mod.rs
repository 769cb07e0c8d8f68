//! Repositories for database operations
//!
//! Every read filters out logically deleted rows on every joined table.
//! Writes touching more than one row run in a transaction that rolls back
//! when dropped, which also covers a request being cancelled mid-flight.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, Transaction, postgres::PgQueryResult};

pub mod calendar;
pub mod event;
pub mod role;
pub mod session;
pub mod user;
pub mod user_calendar;

pub use calendar::CalendarRepository;
pub use event::EventRepository;
pub use role::RoleRepository;
pub use session::{SessionRepository, ValidatedSession};
pub use user::UserRepository;
pub use user_calendar::UserCalendarRepository;

/// Open a transaction on `pool`
pub(crate) async fn begin(pool: &PgPool) -> DatabaseResult<Transaction<'static, Postgres>> {
    pool.begin().await.map_err(DatabaseError::TransactionStart)
}

/// Commit `tx`
pub(crate) async fn commit(tx: Transaction<'_, Postgres>) -> DatabaseResult<()> {
    tx.commit().await.map_err(DatabaseError::TransactionCommit)
}

/// Treat an UPDATE that matched nothing as a missing row
pub(crate) fn expect_row(result: PgQueryResult) -> DatabaseResult<()> {
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound.into());
    }
    Ok(())
}
