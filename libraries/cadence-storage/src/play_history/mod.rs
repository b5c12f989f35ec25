//! Shuffle play-history persistence
//!
//! The recency list that biases shuffle selection survives across
//! sessions and queue replacements. It lives under one dedicated key
//! as a capped ordered list of ids, oldest first.

use crate::error::Result;
use cadence_core::TrackId;
use sqlx::{Row, SqlitePool};

/// Dedicated key for the shuffle recency list
pub const SHUFFLE_HISTORY_KEY: &str = "shuffle.recent_tracks";

/// Hard cap applied on save, guarding against unbounded growth even if
/// the caller forgot to trim
const MAX_PERSISTED_IDS: usize = 100;

/// Persist the recency list, replacing the previous one
///
/// Keeps the most recent `MAX_PERSISTED_IDS` entries.
pub async fn save(pool: &SqlitePool, ids: &[TrackId]) -> Result<()> {
    let start = ids.len().saturating_sub(MAX_PERSISTED_IDS);
    let ids_json = serde_json::to_string(&ids[start..])?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO play_history (key, ids_json, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET ids_json = excluded.ids_json, updated_at = excluded.updated_at",
    )
    .bind(SHUFFLE_HISTORY_KEY)
    .bind(ids_json)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the persisted recency list, empty when nothing was saved
pub async fn load(pool: &SqlitePool) -> Result<Vec<TrackId>> {
    let row = sqlx::query("SELECT ids_json FROM play_history WHERE key = ?")
        .bind(SHUFFLE_HISTORY_KEY)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let ids: Vec<TrackId> = serde_json::from_str(&row.get::<String, _>("ids_json"))?;
            Ok(ids)
        }
        None => Ok(Vec::new()),
    }
}
