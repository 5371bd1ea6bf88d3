//! Statistics engine
//!
//! Pure, in-memory state derived from daily activity:
//! - [`ActivityLog`]: per-day completion counts, bounded to 30 days
//! - [`StreakState`]: current and longest consecutive-day streak
//! - [`TimeOfDayTally`]: completions per day part
//! - [`DerivedMetrics`]: memoized weekly series and week-over-week figures
//!
//! Nothing here performs I/O; persistence lives in [`crate::sync`].

pub mod log;
pub mod metrics;
pub mod streak;
pub mod time_of_day;

pub use log::{ActivityLog, RETENTION_DAYS};
pub use metrics::{CacheStats, DerivedMetrics, MetricsSummary, NO_PRODUCTIVE_DAY};
pub use streak::{StreakState, StreakUpdate};
pub use time_of_day::TimeOfDayTally;
