use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::info;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::{
    db::{
        models::{SleepNight, QUALITY_MAX, QUALITY_MIN},
        Database,
    },
    display::TrackerDisplay,
};

use super::{EventSlot, TrackerState, TrackerStatus};

/// Orchestrates the nightly start/stop/rate workflow on top of [`Database`].
///
/// The store stays authoritative: state only advances after a write has been
/// confirmed, and a rebuilt tracker over an existing database resumes the
/// open night it finds there. User-facing one-shot signals (navigate to the
/// rating screen, navigate to a night's detail, history-cleared notice) are
/// armed here and consumed at most once each.
#[derive(Clone)]
pub struct SleepTracker {
    state: Arc<Mutex<TrackerState>>,
    db: Database,
    rating_nav: Arc<EventSlot<i64>>,
    detail_nav: Arc<EventSlot<i64>>,
    cleared_notice: Arc<EventSlot<()>>,
    display_tx: Arc<watch::Sender<TrackerDisplay>>,
    refresher: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SleepTracker {
    /// Builds a tracker over `db`, resuming an open night if the most recent
    /// row was never closed.
    pub async fn new(db: Database) -> Result<Self> {
        let latest = db.get_latest_night().await?;

        let mut state = TrackerState::new();
        if let Some(night) = latest.as_ref().filter(|night| night.is_open()) {
            info!("Resuming open night {}", night.id);
            state.begin_night(night.id, night.start_time);
        }

        let (display_tx, _display_rx) =
            watch::channel(TrackerDisplay::from_latest(latest.as_ref()));

        let tracker = Self {
            state: Arc::new(Mutex::new(state)),
            db,
            rating_nav: Arc::new(EventSlot::new()),
            detail_nav: Arc::new(EventSlot::new()),
            cleared_notice: Arc::new(EventSlot::new()),
            display_tx: Arc::new(display_tx),
            refresher: Arc::new(Mutex::new(None)),
        };

        tracker.spawn_refresher().await;

        Ok(tracker)
    }

    /// Starts tracking tonight. Fails if a night is already open.
    pub async fn start_tracking(&self) -> Result<SleepNight> {
        let mut state = self.state.lock().await;
        if state.status != TrackerStatus::Idle {
            return Err(anyhow!("a night is already being tracked"));
        }

        let night = SleepNight::started_at(Utc::now());
        let night_id = self
            .db
            .insert_night(&night)
            .await
            .context("failed to persist new night")?;

        // Re-fetch so the in-memory record carries the assigned id and the
        // store's millisecond precision.
        let night = self
            .db
            .get_night(night_id)
            .await?
            .ok_or_else(|| anyhow!("night {night_id} missing right after insert"))?;

        state.begin_night(night.id, night.start_time);
        info!("Started tracking night {}", night.id);

        Ok(night)
    }

    /// Closes tonight's open night and arms the rating-screen navigation
    /// signal. Fails if nothing is being tracked.
    pub async fn stop_tracking(&self) -> Result<SleepNight> {
        let mut state = self.state.lock().await;
        let night_id = match (state.status, state.tonight_id) {
            (TrackerStatus::Tracking, Some(id)) => id,
            _ => return Err(anyhow!("no open night to stop")),
        };

        let mut night = self
            .db
            .get_night(night_id)
            .await?
            .ok_or_else(|| anyhow!("open night {night_id} vanished from the store"))?;

        night.end_time = Utc::now();
        self.db
            .update_night(&night)
            .await
            .context("failed to persist night end time")?;

        state.finish_night();
        self.rating_nav.set(night.id);
        info!("Stopped tracking night {}", night.id);

        Ok(night)
    }

    /// Records the user's quality rating for a closed night.
    pub async fn set_quality(&self, night_id: i64, quality: i32) -> Result<()> {
        if !(QUALITY_MIN..=QUALITY_MAX).contains(&quality) {
            return Err(anyhow!(
                "quality rating {quality} outside {QUALITY_MIN}..={QUALITY_MAX}"
            ));
        }

        let _state = self.state.lock().await;
        let mut night = self
            .db
            .get_night(night_id)
            .await?
            .ok_or_else(|| anyhow!("night {night_id} not found"))?;

        night.quality_rating = quality;
        self.db
            .update_night(&night)
            .await
            .context("failed to persist quality rating")?;
        info!("Rated night {night_id} as {quality}");

        Ok(())
    }

    /// Deletes every recorded night and arms the cleared notice.
    pub async fn clear_history(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.db
            .clear_nights()
            .await
            .context("failed to clear sleep history")?;

        state.finish_night();
        self.cleared_notice.set(());
        info!("Cleared sleep history");

        Ok(())
    }

    /// Called when the user taps a night in the history list.
    pub fn on_night_clicked(&self, night_id: i64) {
        self.detail_nav.set(night_id);
    }

    /// Pending rating-screen navigation, consumed on read.
    pub fn take_rating_navigation(&self) -> Option<i64> {
        self.rating_nav.take()
    }

    /// Pending detail-screen navigation, consumed on read.
    pub fn take_detail_navigation(&self) -> Option<i64> {
        self.detail_nav.take()
    }

    /// Pending history-cleared notice, consumed on read.
    pub fn take_cleared_notice(&self) -> bool {
        self.cleared_notice.take().is_some()
    }

    pub async fn state(&self) -> TrackerState {
        self.state.lock().await.clone()
    }

    /// Live ordered history, straight from the store.
    pub fn nights(&self) -> watch::Receiver<Vec<SleepNight>> {
        self.db.subscribe_nights()
    }

    /// Derived display text, recomputed on every store emission.
    pub fn display(&self) -> watch::Receiver<TrackerDisplay> {
        self.display_tx.subscribe()
    }

    async fn spawn_refresher(&self) {
        let mut nights_rx = self.db.subscribe_nights();
        let display_tx = self.display_tx.clone();

        let handle = tokio::spawn(async move {
            while nights_rx.changed().await.is_ok() {
                let latest = nights_rx.borrow_and_update().first().cloned();
                display_tx.send_replace(TrackerDisplay::from_latest(latest.as_ref()));
            }
        });

        let mut guard = self.refresher.lock().await;
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    /// Stops the background display refresher. Pending store operations are
    /// allowed to finish; their results are simply discarded.
    pub async fn shutdown(&self) {
        let mut guard = self.refresher.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }
}
