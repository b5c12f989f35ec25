//! Favorite tracks
//!
//! Timestamped favorites keyed by track id.

use crate::error::Result;
use cadence_core::TrackId;
use sqlx::{Row, SqlitePool};

/// A favorited track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub track_id: TrackId,
    pub favorited_at: i64,
}

/// Mark a track as favorite; keeps the original timestamp when it
/// already is one
pub async fn add(pool: &SqlitePool, track_id: &TrackId) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO favorites (track_id, favorited_at) VALUES (?, ?)
         ON CONFLICT(track_id) DO NOTHING",
    )
    .bind(track_id.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Unmark a favorite; returns whether a row was removed
pub async fn remove(pool: &SqlitePool, track_id: &TrackId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE track_id = ?")
        .bind(track_id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether the track is currently a favorite
pub async fn is_favorite(pool: &SqlitePool, track_id: &TrackId) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM favorites WHERE track_id = ?")
        .bind(track_id.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// All favorites, most recently favorited first
pub async fn all(pool: &SqlitePool) -> Result<Vec<FavoriteEntry>> {
    let rows = sqlx::query(
        "SELECT track_id, favorited_at FROM favorites ORDER BY favorited_at DESC, track_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| FavoriteEntry {
            track_id: TrackId::new(row.get::<String, _>("track_id")),
            favorited_at: row.get::<i64, _>("favorited_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn add_and_query() {
        let db = Database::in_memory().await.unwrap();
        let id = TrackId::new("t1");

        assert!(!is_favorite(db.pool(), &id).await.unwrap());
        add(db.pool(), &id).await.unwrap();
        assert!(is_favorite(db.pool(), &id).await.unwrap());
    }

    #[tokio::test]
    async fn add_twice_keeps_single_entry() {
        let db = Database::in_memory().await.unwrap();
        let id = TrackId::new("t1");

        add(db.pool(), &id).await.unwrap();
        add(db.pool(), &id).await.unwrap();

        assert_eq!(all(db.pool()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_reports_whether_present() {
        let db = Database::in_memory().await.unwrap();
        let id = TrackId::new("t1");

        add(db.pool(), &id).await.unwrap();
        assert!(remove(db.pool(), &id).await.unwrap());
        assert!(!remove(db.pool(), &id).await.unwrap());
        assert!(!is_favorite(db.pool(), &id).await.unwrap());
    }
}
