pub mod night;

pub use night::{is_valid_quality, SleepNight, NO_RATING, QUALITY_MAX, QUALITY_MIN};
