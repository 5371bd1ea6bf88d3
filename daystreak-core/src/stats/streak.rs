//! Consecutive-day completion streaks

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How a call to [`StreakState::advance`] changed the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// First activity ever recorded
    Started,
    /// Yesterday was active; the streak grew by one
    Extended,
    /// Today was already counted
    Unchanged,
    /// A gap (or a last-active date in the future) broke the streak
    Reset,
}

/// Current and longest streak plus the day they were last advanced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive active days ending at `last_active_date`
    pub current_streak: u32,
    /// High-water mark of `current_streak`; never decreases except on reset
    pub longest_streak: u32,
    /// Most recent day with a completion
    pub last_active_date: Option<NaiveDate>,
}

impl StreakState {
    /// Record that `today` had at least one completion.
    ///
    /// A last-active date after `today` (clock skew) is treated as a broken
    /// streak, not an error.
    pub fn advance(&mut self, today: NaiveDate) -> StreakUpdate {
        let update = match self.last_active_date {
            None => {
                self.current_streak = 1;
                StreakUpdate::Started
            }
            Some(last) if last == today => StreakUpdate::Unchanged,
            Some(last) if Some(last) == today.checked_sub_signed(Duration::days(1)) => {
                self.current_streak = self.current_streak.saturating_add(1);
                StreakUpdate::Extended
            }
            Some(last) => {
                if last > today {
                    tracing::debug!(
                        %last,
                        %today,
                        "Last active date is in the future, resetting streak"
                    );
                }
                self.current_streak = 1;
                StreakUpdate::Reset
            }
        };

        self.last_active_date = Some(today);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        update
    }

    /// Whether the next activity would start a new streak instead of
    /// extending this one.
    pub fn is_broken(&self, today: NaiveDate) -> bool {
        match self.last_active_date {
            None => false,
            Some(last) => last > today || (today - last).num_days() > 1,
        }
    }

    /// Streak length as it stands on `today`: 0 once a day has been missed.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        if self.is_broken(today) {
            0
        } else {
            self.current_streak
        }
    }

    /// Clear every field, including the longest-streak high-water mark.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
