//! Multi-tenant calendaring service
//!
//! Users authenticate with opaque session tokens, calendars are shared through
//! user/calendar links and every record is soft deleted.

use sqlx::migrate::Migrator;

pub mod bootstrap;
pub mod config;
pub mod date_range;
pub mod error;
pub mod extract;
pub mod geolocation;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod response;
pub mod role;
pub mod routes;
pub mod session;
pub mod state;
pub mod token;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;

/// Schema migrations of the service
pub static MIGRATOR: Migrator = sqlx::migrate!();
