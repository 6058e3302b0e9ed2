//! Ordered membership lists: playlist tracks, user tracks, user playlists

use sqlx::SqlitePool;

use super::ensure_exists;
use crate::db::store::StoreResult;

/// Which membership list an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    PlaylistTracks,
    UserTracks,
    UserPlaylists,
}

impl Membership {
    fn table(self) -> &'static str {
        match self {
            Membership::PlaylistTracks => "playlist_track",
            Membership::UserTracks => "user_track",
            Membership::UserPlaylists => "user_playlist",
        }
    }

    /// Table holding the list owner; also used as the entity name in errors
    fn owner(self) -> &'static str {
        match self {
            Membership::PlaylistTracks => "playlist",
            Membership::UserTracks | Membership::UserPlaylists => "user",
        }
    }

    fn member(self) -> &'static str {
        match self {
            Membership::PlaylistTracks | Membership::UserTracks => "track",
            Membership::UserPlaylists => "playlist",
        }
    }
}

/// Membership table operations
pub struct MembershipTable;

impl MembershipTable {
    /// Member ids of `owner_id`, in insertion order
    pub async fn list(
        pool: &SqlitePool,
        kind: Membership,
        owner_id: &str,
    ) -> StoreResult<Vec<String>> {
        let mut conn = pool.acquire().await?;
        ensure_exists(&mut *conn, kind.owner(), owner_id).await?;

        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT member_id FROM {} WHERE owner_id = ? ORDER BY position",
            kind.table()
        ))
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Append members not already present. Fails without changes if the owner
    /// or any member does not exist.
    pub async fn add(
        pool: &SqlitePool,
        kind: Membership,
        owner_id: &str,
        member_ids: &[String],
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;
        ensure_exists(&mut *tx, kind.owner(), owner_id).await?;

        let insert = format!(
            "INSERT OR IGNORE INTO {table} (owner_id, member_id, position) \
             SELECT ?, ?, COALESCE(MAX(position), -1) + 1 FROM {table} WHERE owner_id = ?",
            table = kind.table()
        );

        for member_id in member_ids {
            ensure_exists(&mut *tx, kind.member(), member_id).await?;

            sqlx::query(&insert)
                .bind(owner_id)
                .bind(member_id)
                .bind(owner_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove the given members; absent ones are ignored
    pub async fn remove(
        pool: &SqlitePool,
        kind: Membership,
        owner_id: &str,
        member_ids: &[String],
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;
        ensure_exists(&mut *tx, kind.owner(), owner_id).await?;

        let delete = format!(
            "DELETE FROM {} WHERE owner_id = ? AND member_id = ?",
            kind.table()
        );

        for member_id in member_ids {
            sqlx::query(&delete)
                .bind(owner_id)
                .bind(member_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
