//! Retention-bounded activity log
//!
//! One [`ActivityRecord`] per calendar day, kept in date order. Every mutation
//! bumps the log's epoch so derived values can tell when they are stale.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::NaiveDate;

use crate::types::ActivityRecord;

/// Number of distinct days kept in the log.
pub const RETENTION_DAYS: usize = 30;

/// Date-keyed activity log with a mutation epoch.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    records: BTreeMap<NaiveDate, ActivityRecord>,
    epoch: u64,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored records.
    ///
    /// Later duplicates of the same date win, and the retention bound is
    /// applied immediately.
    pub fn from_records(records: impl IntoIterator<Item = ActivityRecord>) -> Self {
        let mut log = Self::new();
        log.replace_all(records);
        log
    }

    /// Current mutation epoch. Starts at 0 and only ever increases.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Insert or overwrite the record for its date, then enforce retention.
    pub fn upsert(&mut self, record: ActivityRecord) {
        self.records.insert(record.date, record);
        self.enforce_retention();
        self.touch();
    }

    /// Replace every record, e.g. when adopting a remote snapshot.
    ///
    /// Records with more completed than total tasks are clamped.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = ActivityRecord>) {
        self.records = records
            .into_iter()
            .map(|r| {
                if !r.is_consistent() {
                    tracing::warn!(
                        date = %r.date,
                        completed = r.completed_tasks,
                        total = r.total_tasks,
                        "Activity record has more completed than total tasks, clamping"
                    );
                }
                (r.date, r.clamped())
            })
            .collect();
        self.enforce_retention();
        self.touch();
    }

    /// Drop the oldest records until at most [`RETENTION_DAYS`] remain.
    ///
    /// Returns the number of evicted records.
    pub fn enforce_retention(&mut self) -> usize {
        let mut evicted = 0;
        while self.records.len() > RETENTION_DAYS {
            self.records.pop_first();
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted activity records past retention");
            self.touch();
        }
        evicted
    }

    pub fn get(&self, date: NaiveDate) -> Option<&ActivityRecord> {
        self.records.get(&date)
    }

    /// Completed count for a day, 0 when there is no record.
    pub fn completed_on(&self, date: NaiveDate) -> u32 {
        self.get(date).map(|r| r.completed_tasks).unwrap_or(0)
    }

    /// Records whose date falls in the inclusive range, oldest first.
    pub fn range(&self, dates: RangeInclusive<NaiveDate>) -> impl Iterator<Item = &ActivityRecord> {
        self.records.range(dates).map(|(_, r)| r)
    }

    /// Sum of completed tasks over `start..=end`.
    pub fn completed_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if start > end {
            return 0;
        }
        self.range(start..=end).map(|r| r.completed_tasks).sum()
    }

    /// All records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.values()
    }

    pub fn to_vec(&self) -> Vec<ActivityRecord> {
        self.records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn touch(&mut self) {
        self.epoch += 1;
    }
}
