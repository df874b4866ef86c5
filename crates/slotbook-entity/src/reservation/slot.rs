//! Half-open time-of-day interval.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use slotbook_core::AppError;

/// A validated `[start, end)` interval within a single calendar day.
///
/// Construction rejects zero-length and inverted intervals, so every
/// `TimeSlot` in circulation has `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSlot")]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawSlot> for TimeSlot {
    type Error = AppError;

    fn try_from(raw: RawSlot) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::validation(format!(
                "end time {end} must be after start time {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Rebuild a slot from columns already validated on write.
    pub(crate) fn from_stored(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open overlap: touching intervals do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }
}
