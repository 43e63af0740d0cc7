pub mod controller;
pub mod state;

pub use controller::SleepTracker;
pub use state::{EventSlot, TrackerState, TrackerStatus};
