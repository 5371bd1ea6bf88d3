//! Local statistics tier
//!
//! The local tier stores the snapshot as five string values. Loading is best
//! effort: a missing key keeps its default and a malformed value is replaced
//! by its default with a warning, so a corrupt store never blocks startup.
//!
//! Pending remote writes are kept under a sixth key so they survive a
//! restart.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use super::queue::{SyncQueue, SyncToken};
use crate::error::Result;
use crate::types::{ActivityRecord, StatisticsSnapshot, TimeOfDayEntry};

/// Keys used in the local tier.
pub mod keys {
    pub const CURRENT_STREAK: &str = "currentStreak";
    pub const LONGEST_STREAK: &str = "longestStreak";
    pub const LAST_ACTIVE_DATE: &str = "lastActiveDate";
    pub const ACTIVITY_LOGS: &str = "activityLogs";
    pub const TIME_OF_DAY_STATS: &str = "timeOfDayStats";

    /// Pending sync tokens. Not part of the snapshot.
    pub const SYNC_QUEUE: &str = "syncQueue";

    /// Every snapshot key the local tier owns.
    pub const ALL: [&str; 5] = [
        CURRENT_STREAK,
        LONGEST_STREAK,
        LAST_ACTIVE_DATE,
        ACTIVITY_LOGS,
        TIME_OF_DAY_STATS,
    ];
}

/// Synchronous string key/value storage that is always available.
pub trait LocalTier: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory [`LocalTier`], for tests and hosts without a data directory.
#[derive(Debug, Default)]
pub struct MemoryTier {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored value.
    pub fn dump(&self) -> BTreeMap<String, String> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LocalTier for MemoryTier {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// Read one key, treating a storage error as an absent value.
fn read_key<L: LocalTier + ?Sized>(tier: &L, key: &str) -> Option<String> {
    match tier.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read local statistics value");
            None
        }
    }
}

fn parse_or_default<T: Default>(key: &str, raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> T {
    match parse(raw) {
        Some(value) => value,
        None => {
            tracing::warn!(key, raw, "Malformed local statistics value, using default");
            T::default()
        }
    }
}

/// Load the snapshot from the local tier, substituting defaults for missing
/// or malformed values.
pub fn load_snapshot<L: LocalTier + ?Sized>(tier: &L) -> StatisticsSnapshot {
    let mut snapshot = StatisticsSnapshot::default();

    if let Some(raw) = read_key(tier, keys::CURRENT_STREAK) {
        snapshot.current_streak =
            parse_or_default(keys::CURRENT_STREAK, &raw, |s| s.trim().parse().ok());
    }
    if let Some(raw) = read_key(tier, keys::LONGEST_STREAK) {
        snapshot.longest_streak =
            parse_or_default(keys::LONGEST_STREAK, &raw, |s| s.trim().parse().ok());
    }
    if let Some(raw) = read_key(tier, keys::LAST_ACTIVE_DATE) {
        snapshot.last_active_date = parse_or_default(keys::LAST_ACTIVE_DATE, &raw, |s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok().map(Some)
        });
    }
    if let Some(raw) = read_key(tier, keys::ACTIVITY_LOGS) {
        snapshot.activity_logs = parse_or_default(keys::ACTIVITY_LOGS, &raw, |s| {
            serde_json::from_str::<Vec<ActivityRecord>>(s).ok()
        });
    }
    if let Some(raw) = read_key(tier, keys::TIME_OF_DAY_STATS) {
        if let Ok(entries) = serde_json::from_str::<Vec<TimeOfDayEntry>>(&raw) {
            snapshot.time_of_day_stats = entries;
        } else {
            tracing::warn!(
                key = keys::TIME_OF_DAY_STATS,
                raw = %raw,
                "Malformed local statistics value, using default"
            );
        }
    }

    snapshot
}

/// Write all five values of `snapshot` to the local tier.
///
/// Every key is attempted; the first error is returned after the rest have
/// been written.
pub fn save_snapshot<L: LocalTier + ?Sized>(tier: &L, snapshot: &StatisticsSnapshot) -> Result<()> {
    let last_active = snapshot
        .last_active_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let values = [
        (keys::CURRENT_STREAK, snapshot.current_streak.to_string()),
        (keys::LONGEST_STREAK, snapshot.longest_streak.to_string()),
        (keys::LAST_ACTIVE_DATE, last_active),
        (
            keys::ACTIVITY_LOGS,
            serde_json::to_string(&snapshot.activity_logs)?,
        ),
        (
            keys::TIME_OF_DAY_STATS,
            serde_json::to_string(&snapshot.time_of_day_stats)?,
        ),
    ];

    let mut first_error = None;
    for (key, value) in values {
        if let Err(e) = tier.set(key, &value) {
            tracing::warn!(key, error = %e, "Failed to write local statistics value");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Remove all five values from the local tier.
pub fn clear_snapshot<L: LocalTier + ?Sized>(tier: &L) -> Result<()> {
    for key in keys::ALL {
        tier.remove(key)?;
    }
    Ok(())
}

/// Load pending sync tokens. A malformed value counts as nothing pending.
pub fn load_queue<L: LocalTier + ?Sized>(tier: &L) -> SyncQueue {
    let mut queue = SyncQueue::new();
    if let Some(raw) = read_key(tier, keys::SYNC_QUEUE) {
        let tokens: Vec<SyncToken> = parse_or_default(keys::SYNC_QUEUE, &raw, |s| {
            serde_json::from_str(s).ok()
        });
        for token in tokens {
            queue.enqueue(token);
        }
    }
    queue
}

/// Store pending sync tokens, removing the key when nothing is pending.
pub fn save_queue<L: LocalTier + ?Sized>(tier: &L, queue: &SyncQueue) -> Result<()> {
    if queue.is_empty() {
        return tier.remove(keys::SYNC_QUEUE);
    }
    let tokens: Vec<SyncToken> = queue.tokens().collect();
    tier.set(keys::SYNC_QUEUE, &serde_json::to_string(&tokens)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DayPart;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_tier_loads_defaults() {
        let tier = MemoryTier::new();
        assert_eq!(load_snapshot(&tier), StatisticsSnapshot::default());
    }

    #[test]
    fn test_save_then_load() {
        let tier = MemoryTier::new();
        let snapshot = StatisticsSnapshot {
            current_streak: 3,
            longest_streak: 8,
            last_active_date: Some(date("2024-03-10")),
            activity_logs: vec![ActivityRecord {
                date: date("2024-03-10"),
                completed_tasks: 2,
                total_tasks: 3,
            }],
            time_of_day_stats: vec![
                TimeOfDayEntry {
                    time: DayPart::Morning,
                    completed: 1,
                },
                TimeOfDayEntry {
                    time: DayPart::Afternoon,
                    completed: 0,
                },
                TimeOfDayEntry {
                    time: DayPart::Evening,
                    completed: 5,
                },
                TimeOfDayEntry {
                    time: DayPart::Night,
                    completed: 0,
                },
            ],
        };

        save_snapshot(&tier, &snapshot).unwrap();
        assert_eq!(tier.dump().len(), 5);
        assert_eq!(tier.dump()["lastActiveDate"], "2024-03-10");
        assert_eq!(load_snapshot(&tier), snapshot);
    }

    #[test]
    fn test_malformed_values_degrade_to_defaults() {
        let tier = MemoryTier::new();
        tier.set(keys::CURRENT_STREAK, "three").unwrap();
        tier.set(keys::LONGEST_STREAK, "9").unwrap();
        tier.set(keys::LAST_ACTIVE_DATE, "yesterday").unwrap();
        tier.set(keys::ACTIVITY_LOGS, "[{not json").unwrap();
        tier.set(keys::TIME_OF_DAY_STATS, "{}").unwrap();

        let snapshot = load_snapshot(&tier);
        assert_eq!(snapshot.current_streak, 0);
        assert_eq!(snapshot.longest_streak, 9);
        assert_eq!(snapshot.last_active_date, None);
        assert!(snapshot.activity_logs.is_empty());
        assert_eq!(snapshot.time_of_day_stats.len(), 4);
    }

    #[test]
    fn test_empty_last_active_date_is_none() {
        let tier = MemoryTier::new();
        save_snapshot(&tier, &StatisticsSnapshot::default()).unwrap();
        assert_eq!(tier.dump()["lastActiveDate"], "");
        assert_eq!(load_snapshot(&tier).last_active_date, None);
    }

    #[test]
    fn test_clear_snapshot() {
        let tier = MemoryTier::new();
        save_snapshot(&tier, &StatisticsSnapshot::default()).unwrap();
        tier.set("unrelated", "kept").unwrap();

        clear_snapshot(&tier).unwrap();
        let remaining = tier.dump();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains_key("unrelated"));
    }

    #[test]
    fn test_queue_round_trip_and_clear() {
        let tier = MemoryTier::new();
        assert!(load_queue(&tier).is_empty());

        let mut queue = SyncQueue::new();
        queue.enqueue(SyncToken::Statistics);
        save_queue(&tier, &queue).unwrap();
        assert_eq!(tier.dump()[keys::SYNC_QUEUE], r#"["Statistics"]"#);
        assert!(load_queue(&tier).contains(SyncToken::Statistics));

        // Clearing the snapshot keeps pending writes
        clear_snapshot(&tier).unwrap();
        assert!(load_queue(&tier).contains(SyncToken::Statistics));

        save_queue(&tier, &SyncQueue::new()).unwrap();
        assert!(!tier.dump().contains_key(keys::SYNC_QUEUE));
    }

    #[test]
    fn test_malformed_queue_loads_empty() {
        let tier = MemoryTier::new();
        tier.set(keys::SYNC_QUEUE, "Statistics").unwrap();
        assert!(load_queue(&tier).is_empty());
    }
}
