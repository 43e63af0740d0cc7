use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    helpers::{datetime_from_millis, ensure_quality},
    models::SleepNight,
    Database,
};

fn row_to_night(row: &Row) -> Result<SleepNight> {
    let start_millis: i64 = row.get("start_time_millis")?;
    let end_millis: i64 = row.get("end_time_millis")?;

    Ok(SleepNight {
        id: row.get("id")?,
        start_time: datetime_from_millis(start_millis, "start_time_millis")?,
        end_time: datetime_from_millis(end_millis, "end_time_millis")?,
        quality_rating: row.get("quality_rating")?,
    })
}

/// Full-table snapshot, most recent night first. Runs on the worker thread;
/// also used to seed and refresh the live subscription.
pub(crate) fn query_all_nights(conn: &Connection) -> Result<Vec<SleepNight>> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time_millis, end_time_millis, quality_rating
         FROM nights
         ORDER BY id DESC",
    )?;

    let mut rows = stmt.query([])?;
    let mut nights = Vec::new();
    while let Some(row) = rows.next()? {
        nights.push(row_to_night(row)?);
    }

    Ok(nights)
}

impl Database {
    /// Persists a night and returns the store-assigned id. Any id already
    /// set on the record is ignored.
    pub async fn insert_night(&self, night: &SleepNight) -> Result<i64> {
        let record = night.clone();
        self.execute_mutating(move |conn| {
            ensure_quality(record.quality_rating)?;
            conn.execute(
                "INSERT INTO nights (start_time_millis, end_time_millis, quality_rating)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.start_time.timestamp_millis(),
                    record.end_time.timestamp_millis(),
                    record.quality_rating,
                ],
            )
            .with_context(|| "failed to insert night")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Overwrites the row matching `night.id`. Updating an id that was never
    /// inserted is a caller bug and reported as an error.
    pub async fn update_night(&self, night: &SleepNight) -> Result<()> {
        let record = night.clone();
        self.execute_mutating(move |conn| {
            ensure_quality(record.quality_rating)?;
            let rows_affected = conn
                .execute(
                    "UPDATE nights
                     SET start_time_millis = ?1,
                         end_time_millis = ?2,
                         quality_rating = ?3
                     WHERE id = ?4",
                    params![
                        record.start_time.timestamp_millis(),
                        record.end_time.timestamp_millis(),
                        record.quality_rating,
                        record.id,
                    ],
                )
                .with_context(|| "failed to update night")?;

            if rows_affected == 0 {
                return Err(anyhow!("night {} not found", record.id));
            }

            Ok(())
        })
        .await
    }

    pub async fn get_night(&self, night_id: i64) -> Result<Option<SleepNight>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, start_time_millis, end_time_millis, quality_rating
                 FROM nights
                 WHERE id = ?1",
            )?;

            let night = stmt
                .query_row(params![night_id], |row| Ok(row_to_night(row)))
                .optional()?
                .transpose()?;

            Ok(night)
        })
        .await
    }

    /// The most recently inserted night, if any.
    pub async fn get_latest_night(&self) -> Result<Option<SleepNight>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, start_time_millis, end_time_millis, quality_rating
                 FROM nights
                 ORDER BY id DESC
                 LIMIT 1",
            )?;

            let mut rows = stmt.query([])?;
            let night = match rows.next()? {
                Some(row) => Some(row_to_night(row)?),
                None => None,
            };
            Ok(night)
        })
        .await
    }

    /// One-off ordered listing; prefer [`Database::subscribe_nights`] for a
    /// view that tracks changes.
    pub async fn list_nights(&self) -> Result<Vec<SleepNight>> {
        self.execute(|conn| query_all_nights(conn)).await
    }

    /// Deletes every night. Irreversible.
    pub async fn clear_nights(&self) -> Result<()> {
        self.execute_mutating(|conn| {
            conn.execute("DELETE FROM nights", [])
                .with_context(|| "failed to clear nights")?;
            Ok(())
        })
        .await
    }
}
