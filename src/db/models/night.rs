//! Sleep-night data model.
//!
//! One row per recorded sleep interval. A night is "open" while the user is
//! still asleep: its end time equals its start time until the tracker closes
//! it. Quality stays at [`NO_RATING`] until the user picks a rating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel quality for a night that has not been rated yet.
pub const NO_RATING: i32 = -1;

/// Lowest selectable quality rating.
pub const QUALITY_MIN: i32 = 0;

/// Highest selectable quality rating.
pub const QUALITY_MAX: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepNight {
    /// Store-assigned row id. Zero until the night has been persisted.
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub quality_rating: i32,
}

impl SleepNight {
    /// A fresh open night: end equals start, quality unset.
    pub fn started_at(now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            start_time: now,
            end_time: now,
            quality_rating: NO_RATING,
        }
    }

    /// An open night has not been explicitly closed.
    ///
    /// Timestamps round-trip through the store at millisecond precision, so
    /// the comparison is done on millis rather than the full chrono value.
    pub fn is_open(&self) -> bool {
        self.end_time.timestamp_millis() == self.start_time.timestamp_millis()
    }

    pub fn duration_millis(&self) -> i64 {
        self.end_time.timestamp_millis() - self.start_time.timestamp_millis()
    }
}

/// True for every value the store accepts in `quality_rating`.
pub fn is_valid_quality(rating: i32) -> bool {
    rating == NO_RATING || (QUALITY_MIN..=QUALITY_MAX).contains(&rating)
}
