pub mod db;
pub mod display;
pub mod tracker;

pub use db::{
    models::{SleepNight, NO_RATING, QUALITY_MAX, QUALITY_MIN},
    Database,
};
pub use display::{format_duration_millis, quality_description, with_header, ListItem, TrackerDisplay};
pub use tracker::{SleepTracker, TrackerState, TrackerStatus};
