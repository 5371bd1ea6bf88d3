//! Core domain types for daystreak
//!
//! These types describe one user's completion activity and the statistics
//! snapshot that is persisted locally and exchanged with the remote tier.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Calendar day** | A [`NaiveDate`]; compared only by date equality and ordering |
//! | **Activity record** | Completed/total task counts for one calendar day |
//! | **Streak** | Consecutive calendar days with at least one completion |
//! | **Day part** | One of four fixed time-of-day buckets |
//! | **Snapshot** | The full statistics state as stored by either tier |

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================
// Tasks
// ============================================

/// One task from the task source's view of "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Whether the task has been completed
    pub completed: bool,
}

impl TaskStatus {
    pub fn done() -> Self {
        Self { completed: true }
    }

    pub fn open() -> Self {
        Self { completed: false }
    }
}

// ============================================
// Activity
// ============================================

/// Completion counts for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// The calendar day (unique key in the log)
    pub date: NaiveDate,
    /// Number of tasks completed that day
    pub completed_tasks: u32,
    /// Number of tasks on the list that day (always >= completed_tasks)
    pub total_tasks: u32,
}

impl ActivityRecord {
    /// Build a record from a task snapshot.
    pub fn from_tasks(date: NaiveDate, tasks: &[TaskStatus]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            date,
            completed_tasks: completed as u32,
            total_tasks: tasks.len() as u32,
        }
    }

    /// Whether the counts are consistent (`completed_tasks <= total_tasks`).
    pub fn is_consistent(&self) -> bool {
        self.completed_tasks <= self.total_tasks
    }

    /// Raise `total_tasks` to `completed_tasks` if it is lower.
    pub fn clamped(self) -> Self {
        Self {
            total_tasks: self.total_tasks.max(self.completed_tasks),
            ..self
        }
    }
}

/// One entry of the trailing 7-day series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyProgressItem {
    /// Short weekday label ("Sun".."Sat")
    pub day: &'static str,
    /// Tasks completed on that day
    pub completed: u32,
}

/// Short weekday label used throughout the weekly series.
pub fn day_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

// ============================================
// Time of day
// ============================================

/// Fixed time-of-day buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayPart {
    /// 05:00-11:59
    Morning,
    /// 12:00-16:59
    Afternoon,
    /// 17:00-21:59
    Evening,
    /// 22:00-04:59
    Night,
}

impl DayPart {
    /// All buckets in display order.
    pub const ALL: [DayPart; 4] = [
        DayPart::Morning,
        DayPart::Afternoon,
        DayPart::Evening,
        DayPart::Night,
    ];

    /// Map an hour of the day to its bucket.
    ///
    /// Anything outside the three daytime ranges, including out-of-range
    /// hours, falls into [`DayPart::Night`].
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPart::Morning,
            12..=16 => DayPart::Afternoon,
            17..=21 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPart::Morning => "Morning",
            DayPart::Afternoon => "Afternoon",
            DayPart::Evening => "Evening",
            DayPart::Night => "Night",
        }
    }

    /// Position of this bucket in [`DayPart::ALL`].
    pub fn index(&self) -> usize {
        match self {
            DayPart::Morning => 0,
            DayPart::Afternoon => 1,
            DayPart::Evening => 2,
            DayPart::Night => 3,
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of one time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDayEntry {
    pub time: DayPart,
    pub completed: u64,
}

// ============================================
// Snapshot
// ============================================

/// Full statistics state, as written to the local tier and exchanged with
/// the remote tier.
///
/// Missing fields deserialize to their defaults so that a partial remote
/// payload or an old local format never fails outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsSnapshot {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Empty string on the wire when there has been no activity yet
    #[serde(with = "optional_date")]
    pub last_active_date: Option<NaiveDate>,
    pub activity_logs: Vec<ActivityRecord>,
    pub time_of_day_stats: Vec<TimeOfDayEntry>,
}

impl Default for StatisticsSnapshot {
    fn default() -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            activity_logs: Vec::new(),
            time_of_day_stats: DayPart::ALL
                .iter()
                .map(|&time| TimeOfDayEntry { time, completed: 0 })
                .collect(),
        }
    }
}

/// `Option<NaiveDate>` <-> `"YYYY-MM-DD"` or `""`.
pub(crate) mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
