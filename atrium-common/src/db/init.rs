//! Database initialization
//!
//! Creates the database file on first use and brings the schema up
//! idempotently. Safe to call from multiple hosts concurrently; every
//! statement is CREATE-IF-NOT-EXISTS or an upsert.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Current schema version, bumped on any table shape change
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Connection-level options apply to every pooled connection: foreign
    // keys on, WAL for concurrent readers with one writer (watch/tracking
    // writes arrive from many concurrent forum requests), busy timeout to
    // ride out short lock contention
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema_version_table(&pool).await?;
    create_watch_table(&pool).await?;
    create_tracking_table(&pool).await?;
    create_topics_table(&pool).await?;
    create_contribs_table(&pool).await?;
    create_queue_items_table(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Watch records: one row per (user, object kind, object id) subscription
async fn create_watch_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS watch (
            watch_user_id     INTEGER NOT NULL,
            watch_object_type INTEGER NOT NULL,
            watch_object_id   INTEGER NOT NULL,
            watch_mark_time   INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (watch_user_id, watch_object_type, watch_object_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // unsubscribe_all deletes by object, not by user
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_watch_object
            ON watch (watch_object_type, watch_object_id)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Read marks: last-read timestamp per (user, tracking kind, tracked id)
async fn create_tracking_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracking (
            track_user_id INTEGER NOT NULL,
            track_type    INTEGER NOT NULL,
            track_id      INTEGER NOT NULL,
            track_time    INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (track_user_id, track_type, track_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Discussion topics. `topic_posts` is the serialized three-tier cumulative
/// post counter ("teams:authors:public").
async fn create_topics_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            topic_id                INTEGER PRIMARY KEY AUTOINCREMENT,
            topic_type              INTEGER NOT NULL DEFAULT 0,
            parent_id               INTEGER NOT NULL DEFAULT 0,
            topic_access            INTEGER NOT NULL DEFAULT 2,
            topic_subject           TEXT NOT NULL DEFAULT '',
            topic_time              INTEGER NOT NULL DEFAULT 0,
            topic_posts             TEXT NOT NULL DEFAULT '',
            topic_first_post_user_id INTEGER NOT NULL DEFAULT 0,
            topic_last_post_id      INTEGER NOT NULL DEFAULT 0,
            topic_last_post_user_id INTEGER NOT NULL DEFAULT 0,
            topic_last_post_time    INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Contributions (the objects support areas and item watches hang off)
async fn create_contribs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contribs (
            contrib_id          INTEGER PRIMARY KEY AUTOINCREMENT,
            contrib_user_id     INTEGER NOT NULL DEFAULT 0,
            contrib_type        INTEGER NOT NULL DEFAULT 0,
            contrib_name        TEXT NOT NULL DEFAULT '',
            contrib_last_update INTEGER NOT NULL DEFAULT 0,
            contrib_downloads   INTEGER NOT NULL DEFAULT 0,
            contrib_views       INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Moderation queue items; `queue_status > 0` means still pending
async fn create_queue_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS queue_items (
            queue_id          INTEGER PRIMARY KEY AUTOINCREMENT,
            queue_type        INTEGER NOT NULL DEFAULT 0,
            queue_status      INTEGER NOT NULL DEFAULT 0,
            queue_topic_id    INTEGER NOT NULL DEFAULT 0,
            queue_submit_time INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_queue_type_status
            ON queue_items (queue_type, queue_status)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
