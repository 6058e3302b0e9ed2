//! Track table operations

use sqlx::{FromRow, SqlitePool};

use super::ensure_exists;
use crate::db::store::{
    new_id, DeleteTrackCallback, StoreError, StoreResult, UploadTrackCallback,
};
use crate::models::{NewTrack, Track, TrackUpdate};

/// Database row for track table
#[derive(Debug, FromRow)]
struct TrackRow {
    id: String,
    title: String,
    artist_id: String,
    genre_id: String,
    uploaded_by: String,
}

impl From<TrackRow> for Track {
    fn from(row: TrackRow) -> Self {
        Track {
            id: row.id,
            title: row.title,
            artist_id: row.artist_id,
            genre_id: row.genre_id,
            uploaded_by: row.uploaded_by,
        }
    }
}

/// Track table operations
pub struct TrackTable;

impl TrackTable {
    /// Insert a track and hand its id to `upload`. The row is committed only
    /// once the upload succeeds, and the upload is discarded if the commit
    /// fails.
    pub async fn insert(
        pool: &SqlitePool,
        track: NewTrack,
        upload: UploadTrackCallback,
    ) -> StoreResult<Track> {
        let mut tx = pool.begin().await?;
        ensure_exists(&mut *tx, "user", &track.uploaded_by).await?;

        let track = Track {
            id: new_id(),
            title: track.title,
            artist_id: track.artist_id,
            genre_id: track.genre_id,
            uploaded_by: track.uploaded_by,
        };

        sqlx::query(
            "INSERT INTO track (id, title, artist_id, genre_id, uploaded_by) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&track.id)
        .bind(&track.title)
        .bind(&track.artist_id)
        .bind(&track.genre_id)
        .bind(&track.uploaded_by)
        .execute(&mut *tx)
        .await?;

        let discard = upload(&track.id).map_err(|e| StoreError::Blob(e.to_string()))?;

        if let Err(e) = tx.commit().await {
            discard();
            return Err(e.into());
        }
        Ok(track)
    }

    /// Get track by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> StoreResult<Track> {
        let row: Option<TrackRow> = sqlx::query_as("SELECT * FROM track WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(Track::from)
            .ok_or_else(|| StoreError::not_found("track", id))
    }

    /// Get all tracks in upload order
    pub async fn all(pool: &SqlitePool) -> StoreResult<Vec<Track>> {
        let rows: Vec<TrackRow> = sqlx::query_as("SELECT * FROM track ORDER BY rowid")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Track::from).collect())
    }

    /// Replace a track's metadata and return the stored result
    pub async fn update(pool: &SqlitePool, update: TrackUpdate) -> StoreResult<Track> {
        let result =
            sqlx::query("UPDATE track SET title = ?, artist_id = ?, genre_id = ? WHERE id = ?")
                .bind(&update.title)
                .bind(&update.artist_id)
                .bind(&update.genre_id)
                .bind(&update.id)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("track", update.id));
        }

        Self::get_by_id(pool, &update.id).await
    }

    /// Delete a track, then its audio; memberships go with it through the
    /// foreign keys
    pub async fn delete(
        pool: &SqlitePool,
        id: &str,
        delete: DeleteTrackCallback,
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM track WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("track", id));
        }

        tx.commit().await?;

        delete(id).map_err(|e| StoreError::Blob(e.to_string()))
    }
}
