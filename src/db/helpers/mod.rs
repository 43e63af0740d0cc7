use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};

use crate::db::models::{is_valid_quality, QUALITY_MAX, QUALITY_MIN};

pub fn datetime_from_millis(millis: i64, field: &str) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| anyhow!("{field} contains out-of-range timestamp {millis}"))
}

pub fn ensure_quality(rating: i32) -> Result<i32> {
    if is_valid_quality(rating) {
        Ok(rating)
    } else {
        Err(anyhow!(
            "quality rating {rating} outside {QUALITY_MIN}..={QUALITY_MAX} (or -1 for unrated)"
        ))
    }
}
