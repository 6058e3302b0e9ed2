//! SQLite-backed catalog store

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;

use super::engine::setup_sqlite;
use super::store::{CatalogStore, DeleteTrackCallback, StoreResult, UploadTrackCallback};
use super::tables::{
    ArtistTable, Membership, MembershipTable, PlaylistTable, RefreshTokenTable, TrackTable,
    UserTable,
};
use crate::models::{
    Artist, NewPlaylist, NewTrack, NewUser, Playlist, Track, TrackUpdate, User,
};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database file, creating the schema when missing
    pub async fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            pool: setup_sqlite(db_path).await?,
        })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self {
            pool: super::engine::setup_memory_sqlite().await?,
        })
    }

    /// Insert an artist unless one with the same name exists; returns its id
    pub async fn ensure_artist(&self, name: &str) -> StoreResult<String> {
        ArtistTable::ensure(&self.pool, name).await
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn add_new_user(&self, user: NewUser) -> StoreResult<User> {
        UserTable::insert(&self.pool, user).await
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<User> {
        UserTable::get_by_id(&self.pool, user_id).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        UserTable::get_by_email(&self.pool, email).await
    }

    async fn get_artist(&self, artist_id: &str) -> StoreResult<Artist> {
        ArtistTable::get_by_id(&self.pool, artist_id).await
    }

    async fn get_all_artists(&self) -> StoreResult<Vec<Artist>> {
        ArtistTable::all(&self.pool).await
    }

    async fn add_new_track(
        &self,
        track: NewTrack,
        upload: UploadTrackCallback,
    ) -> StoreResult<Track> {
        TrackTable::insert(&self.pool, track, upload).await
    }

    async fn get_track(&self, track_id: &str) -> StoreResult<Track> {
        TrackTable::get_by_id(&self.pool, track_id).await
    }

    async fn get_all_tracks(&self) -> StoreResult<Vec<Track>> {
        TrackTable::all(&self.pool).await
    }

    async fn update_track(&self, update: TrackUpdate) -> StoreResult<Track> {
        TrackTable::update(&self.pool, update).await
    }

    async fn delete_track(
        &self,
        track_id: &str,
        delete: DeleteTrackCallback,
    ) -> StoreResult<()> {
        TrackTable::delete(&self.pool, track_id, delete).await
    }

    async fn get_user_track_list(&self, user_id: &str) -> StoreResult<Vec<String>> {
        MembershipTable::list(&self.pool, Membership::UserTracks, user_id).await
    }

    async fn add_tracks_to_user_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        MembershipTable::add(&self.pool, Membership::UserTracks, user_id, track_ids).await
    }

    async fn delete_tracks_from_user_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        MembershipTable::remove(&self.pool, Membership::UserTracks, user_id, track_ids).await
    }

    async fn add_new_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        PlaylistTable::insert(&self.pool, playlist).await
    }

    async fn get_playlist(&self, playlist_id: &str) -> StoreResult<Playlist> {
        PlaylistTable::get_by_id(&self.pool, playlist_id).await
    }

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>> {
        PlaylistTable::all(&self.pool).await
    }

    async fn delete_playlist(&self, playlist_id: &str) -> StoreResult<()> {
        PlaylistTable::delete(&self.pool, playlist_id).await
    }

    async fn get_playlist_tracks(&self, playlist_id: &str) -> StoreResult<Vec<String>> {
        MembershipTable::list(&self.pool, Membership::PlaylistTracks, playlist_id).await
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        MembershipTable::add(&self.pool, Membership::PlaylistTracks, playlist_id, track_ids).await
    }

    async fn delete_tracks_from_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        MembershipTable::remove(&self.pool, Membership::PlaylistTracks, playlist_id, track_ids)
            .await
    }

    async fn get_user_playlists(&self, user_id: &str) -> StoreResult<Vec<String>> {
        MembershipTable::list(&self.pool, Membership::UserPlaylists, user_id).await
    }

    async fn add_playlists_to_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> StoreResult<()> {
        MembershipTable::add(&self.pool, Membership::UserPlaylists, user_id, playlist_ids).await
    }

    async fn delete_playlists_from_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> StoreResult<()> {
        MembershipTable::remove(&self.pool, Membership::UserPlaylists, user_id, playlist_ids)
            .await
    }

    async fn add_refresh_token(&self, user_id: &str, token: &str) -> StoreResult<()> {
        RefreshTokenTable::insert(&self.pool, user_id, token).await
    }

    async fn update_refresh_token(
        &self,
        user_id: &str,
        old_token: &str,
        new_token: &str,
    ) -> StoreResult<()> {
        RefreshTokenTable::replace(&self.pool, user_id, old_token, new_token).await
    }

    async fn delete_refresh_token(&self, user_id: &str, token: &str) -> StoreResult<()> {
        RefreshTokenTable::delete(&self.pool, user_id, token).await
    }
}
