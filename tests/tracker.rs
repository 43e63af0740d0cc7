use std::time::Duration;

use anyhow::Result;
use nightlog::{Database, SleepTracker, TrackerStatus};
use tempfile::TempDir;

async fn open_tracker() -> Result<(TempDir, SleepTracker)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new()?;
    let db = Database::new(dir.path().join("nightlog.db"))?;
    let tracker = SleepTracker::new(db).await?;
    Ok((dir, tracker))
}

// Keeps start and stop from landing in the same millisecond, which would
// leave the night indistinguishable from an open one.
async fn let_time_pass() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn stop_fires_rating_navigation_exactly_once() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;

    let night = tracker.start_tracking().await?;
    let_time_pass().await;
    tracker.stop_tracking().await?;

    assert_eq!(tracker.take_rating_navigation(), Some(night.id));
    // Re-observation without a new stop yields nothing.
    assert_eq!(tracker.take_rating_navigation(), None);
    Ok(())
}

#[tokio::test]
async fn stop_while_idle_is_an_error() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;
    assert!(tracker.stop_tracking().await.is_err());
    assert_eq!(tracker.take_rating_navigation(), None);
    Ok(())
}

#[tokio::test]
async fn double_start_is_an_error() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;

    tracker.start_tracking().await?;
    assert!(tracker.start_tracking().await.is_err());

    // The store still holds exactly the one open night.
    let nights = tracker.nights().borrow().clone();
    assert_eq!(nights.len(), 1);
    Ok(())
}

#[tokio::test]
async fn full_workflow_records_a_rated_night() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;

    let started = tracker.start_tracking().await?;
    assert_eq!(tracker.state().await.status, TrackerStatus::Tracking);

    let_time_pass().await;
    let stopped = tracker.stop_tracking().await?;
    assert_eq!(stopped.id, started.id);
    assert!(stopped.end_time > stopped.start_time);
    assert_eq!(tracker.state().await.status, TrackerStatus::Idle);

    tracker.set_quality(stopped.id, 5).await?;

    let nights = tracker.nights().borrow().clone();
    assert_eq!(nights.len(), 1);
    assert_eq!(nights[0].quality_rating, 5);
    assert!(!nights[0].is_open());
    Ok(())
}

#[tokio::test]
async fn quality_validation() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;

    tracker.start_tracking().await?;
    let_time_pass().await;
    let night = tracker.stop_tracking().await?;

    assert!(tracker.set_quality(night.id, 9).await.is_err());
    assert!(tracker.set_quality(night.id, -1).await.is_err());
    assert!(tracker.set_quality(night.id + 100, 3).await.is_err());
    tracker.set_quality(night.id, 0).await?;
    Ok(())
}

#[tokio::test]
async fn clear_history_fires_notice_once() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;

    tracker.start_tracking().await?;
    let_time_pass().await;
    tracker.stop_tracking().await?;
    tracker.clear_history().await?;

    assert!(tracker.take_cleared_notice());
    assert!(!tracker.take_cleared_notice());
    assert!(tracker.nights().borrow().is_empty());
    assert_eq!(tracker.state().await.status, TrackerStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn night_click_arms_detail_navigation_once() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;

    tracker.on_night_clicked(17);
    assert_eq!(tracker.take_detail_navigation(), Some(17));
    assert_eq!(tracker.take_detail_navigation(), None);
    Ok(())
}

#[tokio::test]
async fn rebuilt_tracker_resumes_open_night() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new()?;
    let path = dir.path().join("nightlog.db");

    let db = Database::new(path.clone())?;
    let tracker = SleepTracker::new(db).await?;
    let night = tracker.start_tracking().await?;
    tracker.shutdown().await;
    drop(tracker);

    let resumed = SleepTracker::new(Database::new(path)?).await?;
    let state = resumed.state().await;
    assert_eq!(state.status, TrackerStatus::Tracking);
    assert_eq!(state.tonight_id, Some(night.id));

    let_time_pass().await;
    let stopped = resumed.stop_tracking().await?;
    assert_eq!(stopped.id, night.id);
    Ok(())
}

#[tokio::test]
async fn display_tracks_store_changes() -> Result<()> {
    let (_dir, tracker) = open_tracker().await?;
    let mut display_rx = tracker.display();
    assert!(display_rx.borrow().duration_text.is_none());

    tracker.start_tracking().await?;
    display_rx.changed().await?;
    assert!(display_rx.borrow_and_update().tracking);

    let_time_pass().await;
    let night = tracker.stop_tracking().await?;
    display_rx.changed().await?;
    {
        let display = display_rx.borrow_and_update();
        assert!(!display.tracking);
        assert_eq!(display.quality_text.as_deref(), Some("--"));
    }

    tracker.set_quality(night.id, 4).await?;
    display_rx.changed().await?;
    assert_eq!(
        display_rx.borrow_and_update().quality_text.as_deref(),
        Some("Pretty good")
    );
    Ok(())
}
