//! Catalog service
//!
//! Composes stored records into client views and sequences the multi-step
//! workflows (upload, playlist creation, sign-in). Every operation is a
//! function of store reads plus its arguments; nothing is kept between calls.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::error::{ServiceError, ServiceResult};
use super::guard::authorize_owner;
use super::tokens::TokenService;
use crate::db::{CatalogStore, DeleteTrackCallback, StoreError, StoreResult, UploadTrackCallback};
use crate::models::{
    Artist, NewPlaylist, NewTrack, NewUser, Playlist, PlaylistResponse, PublicUser, TokenPair,
    Track, TrackResponse, TrackUpdate, UserRole,
};
use crate::utils::auth::PasswordHasher;

/// Builds views for one request. Artist names are cached only for the
/// lifetime of the composer.
struct ViewComposer<'a> {
    store: &'a dyn CatalogStore,
    artist_names: HashMap<String, String>,
}

impl<'a> ViewComposer<'a> {
    fn new(store: &'a dyn CatalogStore) -> Self {
        Self {
            store,
            artist_names: HashMap::new(),
        }
    }

    async fn artist_name(&mut self, artist_id: &str) -> StoreResult<String> {
        if let Some(name) = self.artist_names.get(artist_id) {
            return Ok(name.clone());
        }

        let artist = self.store.get_artist(artist_id).await?;
        self.artist_names
            .insert(artist.id.clone(), artist.name.clone());
        Ok(artist.name)
    }

    async fn track(&mut self, track: Track) -> StoreResult<TrackResponse> {
        let artist = self.artist_name(&track.artist_id).await?;
        Ok(TrackResponse {
            id: track.id,
            title: track.title,
            artist,
        })
    }

    async fn track_by_id(&mut self, track_id: &str) -> StoreResult<TrackResponse> {
        let track = self.store.get_track(track_id).await?;
        self.track(track).await
    }

    async fn tracks(&mut self, tracks: Vec<Track>) -> StoreResult<Vec<TrackResponse>> {
        let mut views = Vec::with_capacity(tracks.len());
        for track in tracks {
            views.push(self.track(track).await?);
        }
        Ok(views)
    }

    async fn tracks_by_id(&mut self, track_ids: &[String]) -> StoreResult<Vec<TrackResponse>> {
        let mut views = Vec::with_capacity(track_ids.len());
        for track_id in track_ids {
            views.push(self.track_by_id(track_id).await?);
        }
        Ok(views)
    }

    async fn playlist(&mut self, playlist: Playlist) -> StoreResult<PlaylistResponse> {
        let track_ids = self.store.get_playlist_tracks(&playlist.id).await?;
        let track_list = self.tracks_by_id(&track_ids).await?;

        Ok(PlaylistResponse {
            id: playlist.id,
            title: playlist.title,
            track_list,
        })
    }

    async fn playlists(&mut self, playlists: Vec<Playlist>) -> StoreResult<Vec<PlaylistResponse>> {
        let mut views = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            views.push(self.playlist(playlist).await?);
        }
        Ok(views)
    }
}

/// Metadata for an uploaded track
#[derive(Debug, Clone)]
pub struct TrackUpload {
    pub title: String,
    pub artist_id: String,
    pub genre_id: String,
}

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
    default_role: UserRole,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        tokens: TokenService,
        hasher: PasswordHasher,
        default_role: UserRole,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            default_role,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn composer(&self) -> ViewComposer<'_> {
        ViewComposer::new(self.store.as_ref())
    }

    // ========== Tracks ==========

    /// Store the track and its audio, then return it with the artist resolved.
    ///
    /// Nothing persists if the store or the upload fails. If only the artist
    /// lookup fails the track stays and the error is [`ServiceError::Incomplete`].
    pub async fn add_new_track(
        &self,
        uploaded_by: &str,
        upload: TrackUpload,
        write_audio: UploadTrackCallback,
    ) -> ServiceResult<TrackResponse> {
        let track = self
            .store
            .add_new_track(
                NewTrack {
                    title: upload.title,
                    artist_id: upload.artist_id,
                    genre_id: upload.genre_id,
                    uploaded_by: uploaded_by.to_string(),
                },
                write_audio,
            )
            .await?;
        info!(track_id = %track.id, user_id = %uploaded_by, "track uploaded");

        let track_id = track.id.clone();
        self.composer()
            .track(track)
            .await
            .map_err(|e| ServiceError::incomplete("track", &track_id, e.into()))
    }

    pub async fn get_all_tracks(&self) -> ServiceResult<Vec<TrackResponse>> {
        let tracks = self.store.get_all_tracks().await?;
        Ok(self.composer().tracks(tracks).await?)
    }

    pub async fn get_track_by_id(&self, track_id: &str) -> ServiceResult<TrackResponse> {
        Ok(self.composer().track_by_id(track_id).await?)
    }

    /// Replace a track's metadata. Only the uploader may do this.
    pub async fn update_track_by_id(
        &self,
        identity: &str,
        update: TrackUpdate,
    ) -> ServiceResult<TrackResponse> {
        let current = self.store.get_track(&update.id).await?;
        authorize_owner(identity, &current.uploaded_by)?;

        let track = self.store.update_track(update).await?;
        Ok(self.composer().track(track).await?)
    }

    /// Delete a track and its audio. Only the uploader may do this.
    pub async fn delete_track_by_id(
        &self,
        identity: &str,
        track_id: &str,
        remove_audio: DeleteTrackCallback,
    ) -> ServiceResult<()> {
        let current = self.store.get_track(track_id).await?;
        authorize_owner(identity, &current.uploaded_by)?;

        self.store.delete_track(track_id, remove_audio).await?;
        info!(track_id = %track_id, user_id = %identity, "track deleted");
        Ok(())
    }

    pub async fn list_artists(&self) -> ServiceResult<Vec<Artist>> {
        Ok(self.store.get_all_artists().await?)
    }

    // ========== Accounts ==========

    /// Create an account with the configured default role
    pub async fn sign_up(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ServiceResult<PublicUser> {
        let user = self
            .store
            .add_new_user(NewUser {
                email: email.to_string(),
                username: username.to_string(),
                password: self.hasher.hash(password),
                role: self.default_role,
            })
            .await?;

        info!(user_id = %user.id, role = user.role.as_str(), "account created");
        Ok(user.to_public())
    }

    /// Verify credentials and start a session.
    ///
    /// A wrong password yields `Ok(None)` rather than an error; callers decide
    /// how to report it. An unknown email surfaces the store's `NotFound`.
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Option<TokenPair>> {
        let user = self.store.get_user_by_email(email).await?;

        if !self.hasher.verify(password, &user.password)? {
            debug!(user_id = %user.id, "password mismatch");
            return Ok(None);
        }

        let pair = self.tokens.issue_and_record(self.store.as_ref(), &user.id).await?;
        info!(user_id = %user.id, "signed in");
        Ok(Some(pair))
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        self.tokens.rotate(self.store.as_ref(), refresh_token).await
    }

    pub async fn sign_out(&self, refresh_token: &str) -> ServiceResult<()> {
        self.tokens.revoke(self.store.as_ref(), refresh_token).await
    }

    pub async fn get_user_profile(&self, user_id: &str) -> ServiceResult<PublicUser> {
        Ok(self.store.get_user(user_id).await?.to_public())
    }

    // ========== Personal track list ==========

    pub async fn get_user_track_list(&self, user_id: &str) -> ServiceResult<Vec<TrackResponse>> {
        let track_ids = self.store.get_user_track_list(user_id).await?;
        Ok(self.composer().tracks_by_id(&track_ids).await?)
    }

    pub async fn add_tracks_to_user_track_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> ServiceResult<()> {
        Ok(self.store.add_tracks_to_user_list(user_id, track_ids).await?)
    }

    pub async fn delete_tracks_from_user_track_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> ServiceResult<()> {
        Ok(self
            .store
            .delete_tracks_from_user_list(user_id, track_ids)
            .await?)
    }

    // ========== Playlists ==========

    pub async fn get_all_playlists(&self) -> ServiceResult<Vec<PlaylistResponse>> {
        let playlists = self.store.get_all_playlists().await?;
        Ok(self.composer().playlists(playlists).await?)
    }

    pub async fn get_user_playlists(&self, user_id: &str) -> ServiceResult<Vec<PlaylistResponse>> {
        let playlist_ids = self.store.get_user_playlists(user_id).await?;

        let mut playlists = Vec::with_capacity(playlist_ids.len());
        for playlist_id in &playlist_ids {
            playlists.push(self.store.get_playlist(playlist_id).await?);
        }

        Ok(self.composer().playlists(playlists).await?)
    }

    /// Create a playlist owned by `created_by` holding `track_ids`.
    ///
    /// If attaching or resolving the tracks fails the empty playlist stays
    /// and the error is [`ServiceError::Incomplete`].
    pub async fn create_new_playlist(
        &self,
        title: &str,
        created_by: &str,
        track_ids: &[String],
    ) -> ServiceResult<PlaylistResponse> {
        let playlist = self
            .store
            .add_new_playlist(NewPlaylist {
                title: title.to_string(),
                created_by: created_by.to_string(),
            })
            .await?;
        info!(playlist_id = %playlist.id, user_id = %created_by, "playlist created");

        let playlist_id = playlist.id.clone();
        let incomplete = |e: StoreError| {
            ServiceError::incomplete("playlist", &playlist_id, e.into())
        };

        self.store
            .add_tracks_to_playlist(&playlist.id, track_ids)
            .await
            .map_err(incomplete)?;

        self.composer().playlist(playlist).await.map_err(incomplete)
    }

    pub async fn get_playlist_by_id(&self, playlist_id: &str) -> ServiceResult<PlaylistResponse> {
        let playlist = self.store.get_playlist(playlist_id).await?;
        Ok(self.composer().playlist(playlist).await?)
    }

    /// Fetch the playlist and make sure `identity` created it
    async fn owned_playlist(&self, identity: &str, playlist_id: &str) -> ServiceResult<Playlist> {
        let playlist = self.store.get_playlist(playlist_id).await?;
        authorize_owner(identity, &playlist.created_by)?;
        Ok(playlist)
    }

    pub async fn delete_playlist_by_id(&self, identity: &str, playlist_id: &str) -> ServiceResult<()> {
        self.owned_playlist(identity, playlist_id).await?;
        self.store.delete_playlist(playlist_id).await?;
        info!(playlist_id = %playlist_id, user_id = %identity, "playlist deleted");
        Ok(())
    }

    pub async fn add_tracks_to_playlist(
        &self,
        identity: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> ServiceResult<()> {
        self.owned_playlist(identity, playlist_id).await?;
        Ok(self.store.add_tracks_to_playlist(playlist_id, track_ids).await?)
    }

    pub async fn delete_tracks_from_playlist(
        &self,
        identity: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> ServiceResult<()> {
        self.owned_playlist(identity, playlist_id).await?;
        Ok(self
            .store
            .delete_tracks_from_playlist(playlist_id, track_ids)
            .await?)
    }

    // ========== Personal playlist list ==========

    pub async fn add_playlists_to_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> ServiceResult<()> {
        Ok(self
            .store
            .add_playlists_to_user_list(user_id, playlist_ids)
            .await?)
    }

    pub async fn delete_playlists_from_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> ServiceResult<()> {
        Ok(self
            .store
            .delete_playlists_from_user_list(user_id, playlist_ids)
            .await?)
    }
}
