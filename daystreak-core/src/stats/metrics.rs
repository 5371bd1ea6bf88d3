//! Derived weekly metrics
//!
//! All four values are computed together from the [`ActivityLog`] and a
//! "today" date, then memoized. The memo is stamped with the log epoch and the
//! date it was computed for, so a log mutation or a new day invalidates every
//! value at once.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::log::ActivityLog;
use crate::types::{day_label, WeeklyProgressItem};

/// Display value for a missing most-productive day.
pub const NO_PRODUCTIVE_DAY: &str = "none";

/// The four derived values, always computed as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    /// Trailing 7 days ending at today, oldest first
    pub weekly_progress: Vec<WeeklyProgressItem>,
    /// Completions over days 7..=13 before today
    pub previous_week_total: u32,
    /// Rounded percentage change of this week over the previous one
    pub week_over_week_change: i64,
    /// Label of the first day with the highest count
    pub most_productive_day: Option<&'static str>,
}

impl MetricsSummary {
    /// Compute every derived value from scratch.
    pub fn compute(log: &ActivityLog, today: NaiveDate) -> Self {
        let weekly_progress = weekly_progress(log, today);
        let previous_week_total = previous_week_total(log, today);
        let this_week: u32 = weekly_progress.iter().map(|d| d.completed).sum();

        Self {
            week_over_week_change: week_over_week_change(this_week, previous_week_total),
            most_productive_day: most_productive_day(&weekly_progress),
            weekly_progress,
            previous_week_total,
        }
    }

    /// Sum of the weekly series.
    pub fn this_week_total(&self) -> u32 {
        self.weekly_progress.iter().map(|d| d.completed).sum()
    }
}

/// Memoization counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the memo
    pub hits: u64,
    /// Reads that had to recompute
    pub recomputes: u64,
}

#[derive(Debug, Clone)]
struct CachedMetrics {
    epoch: u64,
    today: NaiveDate,
    summary: MetricsSummary,
}

/// Lazily recomputed cache of [`MetricsSummary`].
#[derive(Debug, Clone, Default)]
pub struct DerivedMetrics {
    cached: Option<CachedMetrics>,
    stats: CacheStats,
}

impl DerivedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the memo regardless of epoch.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Whether the memo matches the log's current epoch and `today`.
    pub fn is_fresh(&self, log: &ActivityLog, today: NaiveDate) -> bool {
        matches!(&self.cached, Some(c) if c.epoch == log.epoch() && c.today == today)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn ensure(&mut self, log: &ActivityLog, today: NaiveDate) -> &MetricsSummary {
        if self.is_fresh(log, today) {
            self.stats.hits += 1;
        } else {
            self.cached = None;
        }

        let stats = &mut self.stats;
        &self
            .cached
            .get_or_insert_with(|| {
                stats.recomputes += 1;
                tracing::trace!(epoch = log.epoch(), %today, "Recomputing derived metrics");
                CachedMetrics {
                    epoch: log.epoch(),
                    today,
                    summary: MetricsSummary::compute(log, today),
                }
            })
            .summary
    }

    pub fn summary(&mut self, log: &ActivityLog, today: NaiveDate) -> MetricsSummary {
        self.ensure(log, today).clone()
    }

    pub fn weekly_progress(
        &mut self,
        log: &ActivityLog,
        today: NaiveDate,
    ) -> Vec<WeeklyProgressItem> {
        self.ensure(log, today).weekly_progress.clone()
    }

    pub fn previous_week_total(&mut self, log: &ActivityLog, today: NaiveDate) -> u32 {
        self.ensure(log, today).previous_week_total
    }

    pub fn week_over_week_change(&mut self, log: &ActivityLog, today: NaiveDate) -> i64 {
        self.ensure(log, today).week_over_week_change
    }

    pub fn most_productive_day(
        &mut self,
        log: &ActivityLog,
        today: NaiveDate,
    ) -> Option<&'static str> {
        self.ensure(log, today).most_productive_day
    }
}

/// Trailing 7 calendar days ending at `today`, oldest first.
pub fn weekly_progress(log: &ActivityLog, today: NaiveDate) -> Vec<WeeklyProgressItem> {
    (0..7)
        .rev()
        .map(|i| {
            let date = today - Duration::days(i);
            WeeklyProgressItem {
                day: day_label(date),
                completed: log.completed_on(date),
            }
        })
        .collect()
}

/// Completions over `today-13 ..= today-7`.
pub fn previous_week_total(log: &ActivityLog, today: NaiveDate) -> u32 {
    log.completed_between(today - Duration::days(13), today - Duration::days(7))
}

/// Percentage change, rounded half toward positive infinity.
///
/// Defined as 0 when the previous week had no completions.
pub fn week_over_week_change(this_week: u32, previous_week: u32) -> i64 {
    if previous_week == 0 {
        return 0;
    }
    let change = (this_week as f64 - previous_week as f64) * 100.0 / previous_week as f64;
    (change + 0.5).floor() as i64
}

/// First entry with the maximum count, scanning oldest to newest.
pub fn most_productive_day(series: &[WeeklyProgressItem]) -> Option<&'static str> {
    series
        .iter()
        .fold(None, |best: Option<&WeeklyProgressItem>, item| match best {
            Some(b) if b.completed >= item.completed => Some(b),
            _ => Some(item),
        })
        .map(|item| item.day)
}
