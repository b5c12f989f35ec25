//! Settings storage
//!
//! Arbitrary settings as key-value pairs with JSON-serialized values.

use crate::error::Result;
use sqlx::{Row, SqlitePool};

// Setting key constants
/// Shuffle enabled flag
pub const SETTING_SHUFFLE_ENABLED: &str = "playback.shuffle_enabled";

/// Last used sleep timer settings
pub const SETTING_SLEEP_TIMER: &str = "playback.sleep_timer";

/// Playback volume (0-100)
pub const SETTING_VOLUME: &str = "playback.volume";

/// Get a setting value
///
/// Returns `Ok(Some(value))` if the setting exists, `Ok(None)` if not
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<serde_json::Value>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let value: serde_json::Value = serde_json::from_str(&row.get::<String, _>("value"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Set a setting value (upsert)
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &serde_json::Value) -> Result<()> {
    let value_str = serde_json::to_string(value)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value_str)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a setting; returns whether it existed
pub async fn delete_setting(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn get_missing_setting_is_none() {
        let db = Database::in_memory().await.unwrap();
        assert!(get_setting(db.pool(), "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_and_get_roundtrip() {
        let db = Database::in_memory().await.unwrap();

        set_setting(db.pool(), SETTING_SHUFFLE_ENABLED, &serde_json::json!(true))
            .await
            .unwrap();

        let value = get_setting(db.pool(), SETTING_SHUFFLE_ENABLED)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, serde_json::json!(true));
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let db = Database::in_memory().await.unwrap();

        set_setting(db.pool(), SETTING_VOLUME, &serde_json::json!(80))
            .await
            .unwrap();
        set_setting(db.pool(), SETTING_VOLUME, &serde_json::json!(40))
            .await
            .unwrap();

        let value = get_setting(db.pool(), SETTING_VOLUME).await.unwrap().unwrap();
        assert_eq!(value, serde_json::json!(40));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let db = Database::in_memory().await.unwrap();
        set_setting(db.pool(), "k", &serde_json::json!("v")).await.unwrap();

        assert!(delete_setting(db.pool(), "k").await.unwrap());
        assert!(!delete_setting(db.pool(), "k").await.unwrap());
    }
}
