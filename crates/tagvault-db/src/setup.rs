//! Replica schema setup.
//!
//! Every replica carries the same schema. `initialize_replica` is the only
//! place a database file may be created; coordinated traffic never does.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use tagvault_core::ConnectionProfile;
use tracing::info;

/// Create the replica's database file if needed and ensure the schema.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the file cannot be created, or
/// schema creation fails.
pub async fn initialize_replica(profile: &ConnectionProfile) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&profile.url)
        .with_context(|| format!("invalid URL for profile {}", profile.name))?
        .create_if_missing(true);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let pool = SqlitePool::connect_with(options)
        .await
        .with_context(|| format!("opening replica {}", profile.name))?;
    create_schema(&pool).await?;

    info!(profile = %profile.name, "Replica schema ready");
    Ok(pool)
}

/// Sets up an in-memory `SQLite` database for testing.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_replica() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the replica schema. Safe to call repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS channels (
            name TEXT PRIMARY KEY NOT NULL COLLATE NOCASE
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS playlist_events (
            id INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            channel TEXT NOT NULL COLLATE NOCASE,
            scheduled_date TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            file_path TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            duration_ms INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    // Slot lookups and the update-by-slot statement
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_playlist_events_slot \
         ON playlist_events(category, scheduled_date, scheduled_time)",
    )
    .execute(pool)
    .await?;

    // Rename and delete locate rows by stored path
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_playlist_events_path ON playlist_events(file_path)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
