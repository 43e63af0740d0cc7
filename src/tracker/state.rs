use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    Idle,
    Tracking,
}

impl Default for TrackerStatus {
    fn default() -> Self {
        TrackerStatus::Idle
    }
}

/// In-memory view of the start/stop workflow. The store stays authoritative;
/// this only mirrors which night, if any, is currently open.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub status: TrackerStatus,
    pub tonight_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_night(&mut self, night_id: i64, started_at: DateTime<Utc>) {
        *self = Self {
            status: TrackerStatus::Tracking,
            tonight_id: Some(night_id),
            started_at: Some(started_at),
        };
    }

    pub fn finish_night(&mut self) {
        *self = Self::default();
    }
}

/// Single-value slot for a signal that must fire at most once per
/// production: the producer sets it, the first consumer takes it, and a
/// re-observing consumer (for example a rebuilt UI) sees nothing.
#[derive(Debug, Default)]
pub struct EventSlot<T> {
    pending: Mutex<Option<T>>,
}

impl<T> EventSlot<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Arms the slot. An unconsumed previous value is replaced; only the
    /// most recent production matters.
    pub fn set(&self, value: T) {
        let mut guard = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(value);
    }

    /// Consumes the pending value, clearing the slot.
    pub fn take(&self) -> Option<T> {
        let mut guard = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take()
    }
}
