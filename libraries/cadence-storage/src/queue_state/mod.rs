//! Queue snapshot persistence
//!
//! A single row holds the serialized queue and current position so a
//! session can resume where the previous one left off.

use crate::error::Result;
use cadence_core::Track;
use sqlx::{Row, SqlitePool};

/// Save the queue snapshot, replacing any previous one
pub async fn save(pool: &SqlitePool, tracks: &[Track], current_index: usize) -> Result<()> {
    let tracks_json = serde_json::to_string(tracks)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO queue_state (id, tracks_json, current_index, updated_at)
         VALUES (1, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            tracks_json = excluded.tracks_json,
            current_index = excluded.current_index,
            updated_at = excluded.updated_at",
    )
    .bind(tracks_json)
    .bind(current_index as i64)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the stored snapshot, `None` when nothing was saved
pub async fn load(pool: &SqlitePool) -> Result<Option<(Vec<Track>, usize)>> {
    let row = sqlx::query("SELECT tracks_json, current_index FROM queue_state WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let tracks: Vec<Track> = serde_json::from_str(&row.get::<String, _>("tracks_json"))?;
            let current_index = row.get::<i64, _>("current_index").max(0) as usize;
            Ok(Some((tracks, current_index)))
        }
        None => Ok(None),
    }
}

/// Drop the stored snapshot
pub async fn clear(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM queue_state WHERE id = 1")
        .execute(pool)
        .await?;
    Ok(())
}
