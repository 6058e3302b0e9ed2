//! Database engine and connection management

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Open (creating if missing) the sqlite database at `db_path`
pub async fn setup_sqlite(db_path: &Path) -> Result<SqlitePool> {
    // Create connection options with SQLite pragmas
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30))
        .foreign_keys(true)
        .pragma("cache_size", "10000")
        .pragma("temp_store", "FILE");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Private in-memory database; one connection so every query sees the same data
#[cfg(test)]
pub async fn setup_memory_sqlite() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all database tables
async fn create_tables(pool: &SqlitePool) -> Result<()> {
    // User table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            username TEXT NOT NULL,
            password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user'
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_user_email ON user(email);
        "#,
    )
    .execute(pool)
    .await?;

    // Artist table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artist (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_artist_name ON artist(name);
        "#,
    )
    .execute(pool)
    .await?;

    // Track table. No foreign key on artist_id: the artist is resolved
    // after the track row is committed.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist_id TEXT NOT NULL,
            genre_id TEXT NOT NULL,
            uploaded_by TEXT NOT NULL,
            FOREIGN KEY (uploaded_by) REFERENCES user(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_track_artist ON track(artist_id);
        "#,
    )
    .execute(pool)
    .await?;

    // Playlist table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            created_by TEXT NOT NULL,
            FOREIGN KEY (created_by) REFERENCES user(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_playlist_created_by ON playlist(created_by);
        "#,
    )
    .execute(pool)
    .await?;

    // Membership tables
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_track (
            owner_id TEXT NOT NULL,
            member_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (owner_id, member_id),
            FOREIGN KEY (owner_id) REFERENCES playlist(id) ON DELETE CASCADE,
            FOREIGN KEY (member_id) REFERENCES track(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS user_track (
            owner_id TEXT NOT NULL,
            member_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (owner_id, member_id),
            FOREIGN KEY (owner_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY (member_id) REFERENCES track(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS user_playlist (
            owner_id TEXT NOT NULL,
            member_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (owner_id, member_id),
            FOREIGN KEY (owner_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY (member_id) REFERENCES playlist(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Refresh tokens, stored by digest
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS refresh_token (
            user_id TEXT NOT NULL,
            token_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, token_hash),
            FOREIGN KEY (user_id) REFERENCES user(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
