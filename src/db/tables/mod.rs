//! Database table operations

mod artist_table;
mod membership_table;
mod playlist_table;
mod token_table;
mod track_table;
mod user_table;

pub use artist_table::ArtistTable;
pub use membership_table::{Membership, MembershipTable};
pub use playlist_table::PlaylistTable;
pub use token_table::RefreshTokenTable;
pub use track_table::TrackTable;
pub use user_table::UserTable;

use sqlx::SqliteConnection;

use crate::db::store::{StoreError, StoreResult};

/// Fail with `NotFound` unless `table` holds a row with this id.
/// `table` is always one of our own table names, never user input.
async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    id: &str,
) -> StoreResult<()> {
    let found: Option<(i64,)> = sqlx::query_as(&format!("SELECT 1 FROM {} WHERE id = ?", table))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::not_found(table, id)),
    }
}

/// Unique violations become `Conflict`, everything else stays a database error
fn map_write_error(err: sqlx::Error, conflict: String) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict(conflict),
        other => other.into(),
    }
}
