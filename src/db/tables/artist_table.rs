//! Artist table operations

use sqlx::{FromRow, SqlitePool};

use crate::db::store::{new_id, StoreError, StoreResult};
use crate::models::Artist;

#[derive(Debug, FromRow)]
struct ArtistRow {
    id: String,
    name: String,
}

impl From<ArtistRow> for Artist {
    fn from(row: ArtistRow) -> Self {
        Artist {
            id: row.id,
            name: row.name,
        }
    }
}

/// Artist table operations
pub struct ArtistTable;

impl ArtistTable {
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> StoreResult<Artist> {
        let row: Option<ArtistRow> = sqlx::query_as("SELECT id, name FROM artist WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(Artist::from)
            .ok_or_else(|| StoreError::not_found("artist", id))
    }

    pub async fn all(pool: &SqlitePool) -> StoreResult<Vec<Artist>> {
        let rows: Vec<ArtistRow> = sqlx::query_as("SELECT id, name FROM artist ORDER BY rowid")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Artist::from).collect())
    }

    /// Insert the artist unless the name is taken; returns the artist id either way
    pub async fn ensure(pool: &SqlitePool, name: &str) -> StoreResult<String> {
        sqlx::query("INSERT OR IGNORE INTO artist (id, name) VALUES (?, ?)")
            .bind(new_id())
            .bind(name)
            .execute(pool)
            .await?;

        let (id,): (String,) = sqlx::query_as("SELECT id FROM artist WHERE name = ?")
            .bind(name)
            .fetch_one(pool)
            .await?;

        Ok(id)
    }
}
