//! Palm Cove Resort booking engine.
//!
//! Serves the mobile app's booking screens over HTTP/JSON: the
//! accommodation catalog, per-room availability calendars, price quotes,
//! reservation submission, and reservation history, backed by PostgreSQL.

pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod session;

use sqlx::PgPool;

pub use cache::AppCache;
pub use config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
}
