//! # daystreak-core
//!
//! Core library for daystreak - a daily task-completion tracker.
//!
//! This library provides:
//! - The activity log and its 30-day retention window
//! - Streak tracking and time-of-day tallies
//! - Derived weekly metrics with epoch-based memoization
//! - Local/remote reconciliation of the statistics snapshot
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! State flows through two tiers:
//! - **Local:** a SQLite key/value store, always available
//! - **Remote:** the statistics API, authoritative whenever it is reachable
//!
//! A [`Tracker`] owns all mutable state. Hosts construct one at startup and
//! call into it; there is no global state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use daystreak_core::{Config, Database, FixedTasks, StaticSession, StatisticsClient, Tracker};
//!
//! # async fn run() -> daystreak_core::Result<()> {
//! let config = Config::load()?;
//! let db = Database::open(&Config::database_path())?;
//! db.migrate()?;
//!
//! let remote = StatisticsClient::from_config(&config.remote)?;
//! let session = StaticSession::new(config.remote.is_ready());
//! let tasks = FixedTasks::default();
//!
//! let mut tracker = Tracker::new(db, remote, session, tasks, config.sync.clone());
//! tracker.initialize().await;
//! println!("current streak: {}", tracker.streak().current_streak);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use remote::{MemoryRemote, RemoteTier, StatisticsClient};
pub use stats::{ActivityLog, DerivedMetrics, MetricsSummary, StreakState, TimeOfDayTally};
pub use sync::{
    DrainOutcome, LocalTier, MemoryTier, PersistOutcome, Reconciler, Session, SnapshotSource,
    StaticSession, SyncQueue, SyncState,
};
pub use tracker::{FixedTasks, Recorded, TaskSource, Tracker};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod remote;
pub mod stats;
pub mod sync;
pub mod tracker;
pub mod types;
