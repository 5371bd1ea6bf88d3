//! The statistics tracker
//!
//! [`Tracker`] owns every piece of mutable statistics state: the activity
//! log, the streak, the time-of-day tally, the derived-metrics memo and the
//! reconciler that persists them. Hosts build one at startup and drive it
//! from task-completion signals.

use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

use crate::config::SyncConfig;
use crate::remote::RemoteTier;
use crate::stats::{
    ActivityLog, CacheStats, DerivedMetrics, MetricsSummary, StreakState, StreakUpdate,
    TimeOfDayTally,
};
use crate::sync::{
    DrainOutcome, LocalTier, PersistOutcome, Reconciler, Session, SnapshotSource,
};
use crate::types::{ActivityRecord, DayPart, StatisticsSnapshot, TaskStatus, WeeklyProgressItem};

/// Supplies the current task list.
pub trait TaskSource: Send + Sync {
    fn tasks(&self) -> Vec<TaskStatus>;
}

/// A task list set explicitly by the host.
#[derive(Debug, Default)]
pub struct FixedTasks {
    tasks: Mutex<Vec<TaskStatus>>,
}

impl FixedTasks {
    pub fn new(tasks: Vec<TaskStatus>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    pub fn set(&self, tasks: Vec<TaskStatus>) {
        *self.tasks.lock().unwrap_or_else(|p| p.into_inner()) = tasks;
    }
}

impl TaskSource for FixedTasks {
    fn tasks(&self) -> Vec<TaskStatus> {
        self.tasks.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

/// What a recorded day changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    pub streak: StreakUpdate,
    pub day_part: DayPart,
    pub persisted: PersistOutcome,
}

/// Owner of the statistics state.
pub struct Tracker<L, R, S, T> {
    log: ActivityLog,
    streak: StreakState,
    tally: TimeOfDayTally,
    metrics: DerivedMetrics,
    sync: Reconciler<L, R, S>,
    tasks: T,
    is_initialized: bool,
}

impl<L, R, S, T> Tracker<L, R, S, T>
where
    L: LocalTier,
    R: RemoteTier,
    S: Session,
    T: TaskSource,
{
    pub fn new(local: L, remote: R, session: S, tasks: T, config: SyncConfig) -> Self {
        Self {
            log: ActivityLog::new(),
            streak: StreakState::default(),
            tally: TimeOfDayTally::new(),
            metrics: DerivedMetrics::new(),
            sync: Reconciler::new(local, remote, session, config),
            tasks,
            is_initialized: false,
        }
    }

    /// Load persisted state, reconcile with the remote tier, then record
    /// today's activity from the task source.
    ///
    /// Only the first call does anything; later calls return `None`.
    pub async fn initialize(&mut self) -> Option<SnapshotSource> {
        if self.is_initialized {
            return None;
        }
        self.is_initialized = true;

        let init = self.sync.initialize().await;
        self.apply_snapshot(init.snapshot);
        tracing::info!(
            source = ?init.source,
            current_streak = self.streak.current_streak,
            records = self.log.len(),
            "Statistics initialized"
        );

        self.update_streak_info().await;
        Some(init.source)
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Record activity for the current local time from the task source.
    pub async fn update_streak_info(&mut self) -> Option<Recorded> {
        let now = Local::now().naive_local();
        let tasks = self.tasks.tasks();
        let has_completion = tasks.iter().any(|t| t.completed);
        self.record_daily_activity(now, has_completion, &tasks).await
    }

    /// Fold one day's task snapshot into the statistics and persist them.
    ///
    /// Does nothing and returns `None` when `has_completion` is false.
    pub async fn record_daily_activity(
        &mut self,
        now: NaiveDateTime,
        has_completion: bool,
        tasks: &[TaskStatus],
    ) -> Option<Recorded> {
        if !has_completion {
            return None;
        }

        let today = now.date();
        let streak = self.streak.advance(today);
        self.log.upsert(ActivityRecord::from_tasks(today, tasks));
        let day_part = self.tally.record_completion_event(now.hour());
        self.metrics.invalidate();

        tracing::debug!(
            %today,
            ?streak,
            %day_part,
            current_streak = self.streak.current_streak,
            "Recorded daily activity"
        );

        let snapshot = self.snapshot();
        let persisted = self.sync.persist(&snapshot).await;
        Some(Recorded {
            streak,
            day_part,
            persisted,
        })
    }

    /// Retry a queued remote write with the current snapshot.
    pub async fn process_sync_queue(&mut self) -> DrainOutcome {
        let snapshot = self.snapshot();
        self.sync.drain_sync_queue(&snapshot).await
    }

    /// Write the current snapshot to both tiers, whether or not anything is
    /// queued. A failed remote write is queued like any other.
    pub async fn push_snapshot(&mut self) -> PersistOutcome {
        let snapshot = self.snapshot();
        self.sync.persist(&snapshot).await
    }

    /// Current state in its persisted form.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            current_streak: self.streak.current_streak,
            longest_streak: self.streak.longest_streak,
            last_active_date: self.streak.last_active_date,
            activity_logs: self.log.to_vec(),
            time_of_day_stats: self.tally.entries(),
        }
    }

    fn apply_snapshot(&mut self, snapshot: StatisticsSnapshot) {
        self.streak = StreakState {
            current_streak: snapshot.current_streak,
            longest_streak: snapshot.longest_streak,
            last_active_date: snapshot.last_active_date,
        };
        self.log.replace_all(snapshot.activity_logs);
        self.tally = TimeOfDayTally::from_entries(&snapshot.time_of_day_stats);
        self.metrics.invalidate();
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn time_of_day(&self) -> &TimeOfDayTally {
        &self.tally
    }

    pub fn sync(&self) -> &Reconciler<L, R, S> {
        &self.sync
    }

    pub fn tasks(&self) -> &T {
        &self.tasks
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.metrics.stats()
    }

    pub fn summary(&mut self, today: NaiveDate) -> MetricsSummary {
        self.metrics.summary(&self.log, today)
    }

    pub fn weekly_progress(&mut self, today: NaiveDate) -> Vec<WeeklyProgressItem> {
        self.metrics.weekly_progress(&self.log, today)
    }

    pub fn previous_week_total(&mut self, today: NaiveDate) -> u32 {
        self.metrics.previous_week_total(&self.log, today)
    }

    pub fn week_over_week_change(&mut self, today: NaiveDate) -> i64 {
        self.metrics.week_over_week_change(&self.log, today)
    }

    pub fn most_productive_day(&mut self, today: NaiveDate) -> Option<&'static str> {
        self.metrics.most_productive_day(&self.log, today)
    }
}
