/// Database implementation
use crate::error::{Result, StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// SQLite database holding all Cadence session state
///
/// One instance is constructed per application session and injected
/// into the components that persist state; it is the single shared
/// mutable resource across sessions. Clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    ///
    /// # Errors
    /// Returns an error if the connection fails or migrations fail
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create database from an existing pool (for testing)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an in-memory database
    ///
    /// A single connection keeps every query on the same in-memory
    /// store.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wipe every collection (sign-out path)
    pub async fn clear_all(&self) -> Result<()> {
        const TABLES: &[&str] = &[
            "queue_state",
            "favorites",
            "playlists",
            "settings",
            "play_history",
        ];

        for table in TABLES {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Run database migrations
    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        // Embedded migrations for reliability across execution contexts
        const MIGRATIONS: &[&str] = &[
            include_str!("../migrations/20250501000001_create_queue_state.sql"),
            include_str!("../migrations/20250501000002_create_favorites.sql"),
            include_str!("../migrations/20250501000003_create_playlists.sql"),
            include_str!("../migrations/20250501000004_create_settings.sql"),
            include_str!("../migrations/20250501000005_create_play_history.sql"),
        ];

        for migration in MIGRATIONS {
            sqlx::query(migration)
                .execute(pool)
                .await
                .map_err(|e| StorageError::Migration(e.to_string()))?;
        }

        Ok(())
    }
}
