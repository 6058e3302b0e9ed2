//! Catalog store contract
//!
//! Everything the services know about persistence goes through
//! [`CatalogStore`]. Each storage backend provides one implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Artist, NewPlaylist, NewTrack, NewUser, Playlist, Track, TrackUpdate, User,
};

/// Throws away audio written for a track whose row was never committed.
pub type DiscardUpload = Box<dyn FnOnce() + Send>;

/// Writes the uploaded audio for a freshly assigned track id and returns how
/// to discard it again.
pub type UploadTrackCallback = Box<dyn FnOnce(&str) -> anyhow::Result<DiscardUpload> + Send>;

/// Removes the stored audio of a deleted track.
pub type DeleteTrackCallback = Box<dyn FnOnce(&str) -> anyhow::Result<()> + Send>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("audio storage error: {0}")]
    Blob(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for users, the catalog, memberships and refresh tokens.
///
/// Membership lists keep insertion order. Adding a member that is already
/// present and removing one that is absent are both no-ops. Refresh tokens are
/// addressed by `(user_id, token)`; replacing or deleting a pair that is not
/// stored fails with [`StoreError::NotFound`].
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // users

    async fn add_new_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, user_id: &str) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    // artists

    async fn get_artist(&self, artist_id: &str) -> StoreResult<Artist>;

    async fn get_all_artists(&self) -> StoreResult<Vec<Artist>>;

    // tracks

    /// Persists the track and runs `upload` with the new id. If the upload
    /// fails no track record remains; if the record cannot be saved after the
    /// upload, the upload is discarded.
    async fn add_new_track(
        &self,
        track: NewTrack,
        upload: UploadTrackCallback,
    ) -> StoreResult<Track>;

    async fn get_track(&self, track_id: &str) -> StoreResult<Track>;

    async fn get_all_tracks(&self) -> StoreResult<Vec<Track>>;

    async fn update_track(&self, update: TrackUpdate) -> StoreResult<Track>;

    /// Removes the track from the catalog and from every membership list,
    /// then runs `delete`. A failing callback is reported as
    /// [`StoreError::Blob`] but the track stays deleted.
    async fn delete_track(&self, track_id: &str, delete: DeleteTrackCallback)
        -> StoreResult<()>;

    // per-user track list

    async fn get_user_track_list(&self, user_id: &str) -> StoreResult<Vec<String>>;

    async fn add_tracks_to_user_list(&self, user_id: &str, track_ids: &[String])
        -> StoreResult<()>;

    async fn delete_tracks_from_user_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()>;

    // playlists

    async fn add_new_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist>;

    async fn get_playlist(&self, playlist_id: &str) -> StoreResult<Playlist>;

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>>;

    async fn delete_playlist(&self, playlist_id: &str) -> StoreResult<()>;

    async fn get_playlist_tracks(&self, playlist_id: &str) -> StoreResult<Vec<String>>;

    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String])
        -> StoreResult<()>;

    async fn delete_tracks_from_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()>;

    // per-user playlist list

    async fn get_user_playlists(&self, user_id: &str) -> StoreResult<Vec<String>>;

    async fn add_playlists_to_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> StoreResult<()>;

    async fn delete_playlists_from_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> StoreResult<()>;

    // refresh tokens

    async fn add_refresh_token(&self, user_id: &str, token: &str) -> StoreResult<()>;

    /// Swaps `old_token` for `new_token` atomically.
    async fn update_refresh_token(
        &self,
        user_id: &str,
        old_token: &str,
        new_token: &str,
    ) -> StoreResult<()>;

    async fn delete_refresh_token(&self, user_id: &str, token: &str) -> StoreResult<()>;
}

/// Refresh tokens are persisted by digest, never verbatim.
pub fn refresh_token_digest(token: &str) -> String {
    use sha2::{Digest, Sha256};

    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Fresh opaque identifier for a stored record
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Upload callback for tests that store no audio
#[cfg(test)]
pub fn no_upload() -> UploadTrackCallback {
    Box::new(|_| Ok(Box::new(|| ()) as DiscardUpload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_pool_is_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }

    #[test]
    fn test_digest_is_stable_and_opaque() {
        let a = refresh_token_digest("token-a");
        assert_eq!(a, refresh_token_digest("token-a"));
        assert_ne!(a, refresh_token_digest("token-b"));
        assert_eq!(a.len(), 64);
        assert!(!a.contains("token-a"));
    }
}
