//! Playlist storage
//!
//! Locally stored playlists with remote sync bookkeeping: every local
//! edit marks the playlist dirty; a sync worker moves it through
//! syncing back to clean and stamps the sync time.

use crate::error::Result;
use cadence_core::{PlaylistId, Track};
use sqlx::{Row, SqlitePool};

/// Remote synchronization state of a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// In sync with the remote copy
    Clean,

    /// Local edits not yet pushed
    Dirty,

    /// A sync is in flight
    Syncing,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Clean => "clean",
            SyncStatus::Dirty => "dirty",
            SyncStatus::Syncing => "syncing",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "clean" => SyncStatus::Clean,
            "syncing" => SyncStatus::Syncing,
            _ => SyncStatus::Dirty,
        }
    }
}

/// A stored playlist
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlaylist {
    pub id: PlaylistId,
    pub name: String,
    pub tracks: Vec<Track>,
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create or update a playlist; local edits always mark it dirty
pub async fn save(
    pool: &SqlitePool,
    id: &PlaylistId,
    name: &str,
    tracks: &[Track],
) -> Result<()> {
    let tracks_json = serde_json::to_string(tracks)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO playlists (id, name, tracks_json, sync_status, last_synced_at, created_at, updated_at)
         VALUES (?, ?, ?, 'dirty', NULL, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            tracks_json = excluded.tracks_json,
            sync_status = 'dirty',
            updated_at = excluded.updated_at",
    )
    .bind(id.as_str())
    .bind(name)
    .bind(tracks_json)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch one playlist
pub async fn get(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<StoredPlaylist>> {
    let row = sqlx::query(
        "SELECT id, name, tracks_json, sync_status, last_synced_at, created_at, updated_at
         FROM playlists WHERE id = ?",
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(from_row(&row)?)),
        None => Ok(None),
    }
}

/// All playlists, alphabetical
pub async fn all(pool: &SqlitePool) -> Result<Vec<StoredPlaylist>> {
    let rows = sqlx::query(
        "SELECT id, name, tracks_json, sync_status, last_synced_at, created_at, updated_at
         FROM playlists ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Delete a playlist; returns whether it existed
pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark a playlist as having a sync in flight
pub async fn mark_syncing(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    set_status(pool, id, SyncStatus::Syncing, None).await
}

/// Mark a playlist clean and stamp the sync time
pub async fn mark_synced(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    set_status(pool, id, SyncStatus::Clean, Some(now)).await
}

async fn set_status(
    pool: &SqlitePool,
    id: &PlaylistId,
    status: SyncStatus,
    synced_at: Option<i64>,
) -> Result<()> {
    match synced_at {
        Some(ts) => {
            sqlx::query("UPDATE playlists SET sync_status = ?, last_synced_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(ts)
                .bind(id.as_str())
                .execute(pool)
                .await?;
        }
        None => {
            sqlx::query("UPDATE playlists SET sync_status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id.as_str())
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredPlaylist> {
    let tracks: Vec<Track> = serde_json::from_str(&row.get::<String, _>("tracks_json"))?;
    Ok(StoredPlaylist {
        id: PlaylistId::new(row.get::<String, _>("id")),
        name: row.get::<String, _>("name"),
        tracks,
        sync_status: SyncStatus::parse(&row.get::<String, _>("sync_status")),
        last_synced_at: row.get::<Option<i64>, _>("last_synced_at"),
        created_at: row.get::<i64, _>("created_at"),
        updated_at: row.get::<i64, _>("updated_at"),
    })
}
