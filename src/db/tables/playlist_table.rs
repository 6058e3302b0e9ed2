//! Playlist table operations

use sqlx::{FromRow, SqlitePool};

use super::map_write_error;
use crate::db::store::{new_id, StoreError, StoreResult};
use crate::models::{NewPlaylist, Playlist};

/// Database row for playlist table
#[derive(Debug, FromRow)]
struct PlaylistRow {
    id: String,
    title: String,
    created_by: String,
}

impl From<PlaylistRow> for Playlist {
    fn from(row: PlaylistRow) -> Self {
        Playlist {
            id: row.id,
            title: row.title,
            created_by: row.created_by,
        }
    }
}

/// Playlist table operations
pub struct PlaylistTable;

impl PlaylistTable {
    /// Get all playlists
    pub async fn all(pool: &SqlitePool) -> StoreResult<Vec<Playlist>> {
        let rows: Vec<PlaylistRow> = sqlx::query_as("SELECT * FROM playlist ORDER BY rowid")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Playlist::from).collect())
    }

    /// Get playlist by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> StoreResult<Playlist> {
        let row: Option<PlaylistRow> = sqlx::query_as("SELECT * FROM playlist WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(Playlist::from)
            .ok_or_else(|| StoreError::not_found("playlist", id))
    }

    /// Insert playlist
    pub async fn insert(pool: &SqlitePool, playlist: NewPlaylist) -> StoreResult<Playlist> {
        let playlist = Playlist {
            id: new_id(),
            title: playlist.title,
            created_by: playlist.created_by,
        };

        sqlx::query("INSERT INTO playlist (id, title, created_by) VALUES (?, ?, ?)")
            .bind(&playlist.id)
            .bind(&playlist.title)
            .bind(&playlist.created_by)
            .execute(pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    StoreError::not_found("user", &playlist.created_by)
                }
                other => map_write_error(other, format!("playlist {} exists", playlist.id)),
            })?;

        Ok(playlist)
    }

    /// Delete playlist; its membership rows cascade
    pub async fn delete(pool: &SqlitePool, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM playlist WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("playlist", id));
        }

        Ok(())
    }
}
