//! Database layer for daystreak
//!
//! The local tier is a single SQLite key/value table:
//! - Schema migrations tracked by `PRAGMA user_version`
//! - Repository operations for get/set/remove by key

pub mod repo;
pub mod schema;

pub use repo::Database;
