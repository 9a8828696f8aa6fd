//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over an async SQLite connection. Both raw tables are written with
//! full-replace semantics: every pipeline run rewrites the complete
//! table contents, which keeps re-runs idempotent without upserts.

pub mod detection;
pub mod message;
pub mod migrations;
pub mod models;
pub mod pool;

pub use detection::DetectionRepository;
pub use message::MessageRepository;
pub use migrations::run_migrations;
pub use pool::{AsyncSqlitePool, DieselError};

use chrono::{DateTime, Utc};

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
