//! Pure presentation helpers: quality and duration text, and the
//! header-prepended list the UI renders.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::db::models::{SleepNight, NO_RATING};

/// Human-readable label for a quality rating.
pub fn quality_description(rating: i32) -> &'static str {
    match rating {
        NO_RATING => "--",
        0 => "Very bad",
        1 => "Poor",
        2 => "So-so",
        3 => "OK",
        4 => "Pretty good",
        5 => "Excellent",
        other => {
            warn!("Unexpected quality rating {other} in display path");
            "--"
        }
    }
}

/// Formats a sleep duration for display.
///
/// Under a minute renders as seconds, under an hour as whole minutes, and
/// anything longer as fractional hours with one decimal.
pub fn format_duration_millis(millis: i64) -> String {
    let seconds = millis.max(0) / 1_000;
    let minutes = seconds / 60;

    if minutes < 1 {
        format!("{seconds} seconds")
    } else if minutes < 60 {
        format!("{minutes} minutes")
    } else {
        format!("{:.1} hours", minutes as f64 / 60.0)
    }
}

/// Derived display state for the tracking screen, recomputed whenever the
/// store emits a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerDisplay {
    /// Formatted duration of the latest night, or `None` before any night
    /// has been recorded.
    pub duration_text: Option<String>,
    pub quality_text: Option<String>,
    /// True while the latest night is still open.
    pub tracking: bool,
}

impl TrackerDisplay {
    pub fn empty() -> Self {
        Self {
            duration_text: None,
            quality_text: None,
            tracking: false,
        }
    }

    pub fn from_latest(latest: Option<&SleepNight>) -> Self {
        match latest {
            Some(night) => Self {
                duration_text: Some(format_duration_millis(night.duration_millis())),
                quality_text: Some(quality_description(night.quality_rating).to_string()),
                tracking: night.is_open(),
            },
            None => Self::empty(),
        }
    }
}

/// One row in the rendered history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ListItem {
    Header,
    Night(SleepNight),
}

/// Prepends the synthetic header row to an ordered nights snapshot.
/// Order of the underlying nights is preserved untouched.
pub fn with_header(nights: Vec<SleepNight>) -> Vec<ListItem> {
    let mut items = Vec::with_capacity(nights.len() + 1);
    items.push(ListItem::Header);
    items.extend(nights.into_iter().map(ListItem::Night));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn night_with_id(id: i64) -> SleepNight {
        let mut night = SleepNight::started_at(Utc::now());
        night.id = id;
        night
    }

    #[test]
    fn quality_descriptions_cover_range() {
        assert_eq!(quality_description(-1), "--");
        assert_eq!(quality_description(0), "Very bad");
        assert_eq!(quality_description(3), "OK");
        assert_eq!(quality_description(5), "Excellent");
        assert_eq!(quality_description(9), "--");
    }

    #[test]
    fn duration_rendering() {
        assert_eq!(format_duration_millis(45_000), "45 seconds");
        assert_eq!(format_duration_millis(25 * 60 * 1_000), "25 minutes");
        assert_eq!(format_duration_millis(90 * 60 * 1_000), "1.5 hours");
        assert_eq!(format_duration_millis(-5), "0 seconds");
    }

    #[test]
    fn header_prepended_order_preserved() {
        let nights = vec![night_with_id(3), night_with_id(2), night_with_id(1)];
        let items = with_header(nights);

        assert_eq!(items.len(), 4);
        assert_eq!(items[0], ListItem::Header);
        for (item, expected_id) in items[1..].iter().zip([3, 2, 1]) {
            match item {
                ListItem::Night(night) => assert_eq!(night.id, expected_id),
                ListItem::Header => panic!("header appeared past position 0"),
            }
        }
    }

    #[test]
    fn empty_list_renders_header_only() {
        assert_eq!(with_header(Vec::new()), vec![ListItem::Header]);
    }

    #[test]
    fn display_from_latest() {
        let empty = TrackerDisplay::from_latest(None);
        assert_eq!(empty, TrackerDisplay::empty());

        let mut night = night_with_id(1);
        night.end_time = night.start_time + Duration::hours(8);
        night.quality_rating = 4;
        let display = TrackerDisplay::from_latest(Some(&night));
        assert_eq!(display.duration_text.as_deref(), Some("8.0 hours"));
        assert_eq!(display.quality_text.as_deref(), Some("Pretty good"));
        assert!(!display.tracking);
    }
}
