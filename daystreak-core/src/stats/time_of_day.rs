//! Time-of-day completion tally

use crate::types::{DayPart, TimeOfDayEntry};

/// Completion counters for the four fixed day parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeOfDayTally {
    counts: [u64; 4],
}

impl TimeOfDayTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tally from stored entries.
    ///
    /// Buckets missing from `entries` start at zero; repeated buckets keep the
    /// last value seen.
    pub fn from_entries(entries: &[TimeOfDayEntry]) -> Self {
        let mut tally = Self::new();
        for entry in entries {
            tally.counts[entry.time.index()] = entry.completed;
        }
        tally
    }

    /// Count one completion event at `hour` (0-23). Returns the bucket used.
    pub fn record_completion_event(&mut self, hour: u32) -> DayPart {
        let part = DayPart::from_hour(hour);
        self.counts[part.index()] += 1;
        part
    }

    pub fn count(&self, part: DayPart) -> u64 {
        self.counts[part.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Bucket with the most completions; earliest bucket wins ties.
    pub fn busiest(&self) -> Option<DayPart> {
        DayPart::ALL
            .iter()
            .copied()
            .filter(|part| self.count(*part) > 0)
            .fold(None, |best: Option<DayPart>, part| match best {
                Some(b) if self.count(b) >= self.count(part) => Some(b),
                _ => Some(part),
            })
    }

    /// All four buckets in display order.
    pub fn entries(&self) -> Vec<TimeOfDayEntry> {
        DayPart::ALL
            .iter()
            .map(|&time| TimeOfDayEntry {
                time,
                completed: self.count(time),
            })
            .collect()
    }
}
