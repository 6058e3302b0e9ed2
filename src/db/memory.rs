//! In-process catalog store
//!
//! Keeps everything behind a single lock so multi-row updates such as refresh
//! token replacement are atomic. Used with `--memory` and throughout the tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use super::store::{
    new_id, refresh_token_digest, CatalogStore, DeleteTrackCallback, StoreError, StoreResult,
    UploadTrackCallback,
};
use crate::models::{
    Artist, NewPlaylist, NewTrack, NewUser, Playlist, Track, TrackUpdate, User,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    artists: Vec<Artist>,
    tracks: Vec<Track>,
    playlists: Vec<Playlist>,
    user_tracks: HashMap<String, Vec<String>>,
    user_playlists: HashMap<String, Vec<String>>,
    playlist_tracks: HashMap<String, Vec<String>>,
    /// (user id, token digest)
    refresh_tokens: HashSet<(String, String)>,
}

impl Inner {
    fn user(&self, user_id: &str) -> StoreResult<&User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| StoreError::not_found("user", user_id))
    }

    fn track(&self, track_id: &str) -> StoreResult<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id == track_id)
            .ok_or_else(|| StoreError::not_found("track", track_id))
    }

    fn playlist(&self, playlist_id: &str) -> StoreResult<&Playlist> {
        self.playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| StoreError::not_found("playlist", playlist_id))
    }
}

/// Appends every id not yet present, keeping insertion order
fn add_members(list: &mut Vec<String>, ids: &[String]) {
    for id in ids {
        if !list.contains(id) {
            list.push(id.clone());
        }
    }
}

fn remove_members(list: &mut Vec<String>, ids: &[String]) {
    list.retain(|id| !ids.contains(id));
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    #[cfg(test)]
    failing: parking_lot::Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an artist unless one with the same name exists; returns its id
    pub fn ensure_artist(&self, name: &str) -> String {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.artists.iter().find(|a| a.name == name) {
            return existing.id.clone();
        }

        let artist = Artist {
            id: new_id(),
            name: name.to_string(),
        };
        let id = artist.id.clone();
        inner.artists.push(artist);
        id
    }

    /// Makes every subsequent call of the named operation fail
    #[cfg(test)]
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    #[cfg(test)]
    fn check(&self, operation: &'static str) -> StoreResult<()> {
        if self.failing.lock().contains(operation) {
            return Err(StoreError::Unavailable(format!("{} failed", operation)));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn check(&self, _operation: &'static str) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn add_new_user(&self, user: NewUser) -> StoreResult<User> {
        self.check("add_new_user")?;
        let mut inner = self.inner.write();

        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }

        let user = User {
            id: new_id(),
            email: user.email,
            username: user.username,
            password: user.password,
            role: user.role,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<User> {
        self.check("get_user")?;
        self.inner.read().user(user_id).cloned()
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.check("get_user_by_email")?;
        self.inner
            .read()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn get_artist(&self, artist_id: &str) -> StoreResult<Artist> {
        self.check("get_artist")?;
        self.inner
            .read()
            .artists
            .iter()
            .find(|a| a.id == artist_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("artist", artist_id))
    }

    async fn get_all_artists(&self) -> StoreResult<Vec<Artist>> {
        self.check("get_all_artists")?;
        Ok(self.inner.read().artists.clone())
    }

    async fn add_new_track(
        &self,
        track: NewTrack,
        upload: UploadTrackCallback,
    ) -> StoreResult<Track> {
        self.check("add_new_track")?;
        self.inner.read().user(&track.uploaded_by)?;

        let track = Track {
            id: new_id(),
            title: track.title,
            artist_id: track.artist_id,
            genre_id: track.genre_id,
            uploaded_by: track.uploaded_by,
        };
        // nothing below can fail, so the upload is never discarded
        upload(&track.id).map_err(|e| StoreError::Blob(e.to_string()))?;

        self.inner.write().tracks.push(track.clone());
        Ok(track)
    }

    async fn get_track(&self, track_id: &str) -> StoreResult<Track> {
        self.check("get_track")?;
        self.inner.read().track(track_id).cloned()
    }

    async fn get_all_tracks(&self) -> StoreResult<Vec<Track>> {
        self.check("get_all_tracks")?;
        Ok(self.inner.read().tracks.clone())
    }

    async fn update_track(&self, update: TrackUpdate) -> StoreResult<Track> {
        self.check("update_track")?;
        let mut inner = self.inner.write();
        let track = inner
            .tracks
            .iter_mut()
            .find(|t| t.id == update.id)
            .ok_or_else(|| StoreError::not_found("track", &update.id))?;

        track.title = update.title;
        track.artist_id = update.artist_id;
        track.genre_id = update.genre_id;
        Ok(track.clone())
    }

    async fn delete_track(
        &self,
        track_id: &str,
        delete: DeleteTrackCallback,
    ) -> StoreResult<()> {
        self.check("delete_track")?;
        {
            let mut inner = self.inner.write();
            inner.track(track_id)?;

            let removed = [track_id.to_string()];
            inner.tracks.retain(|t| t.id != track_id);
            for list in inner.user_tracks.values_mut() {
                remove_members(list, &removed);
            }
            for list in inner.playlist_tracks.values_mut() {
                remove_members(list, &removed);
            }
        }

        delete(track_id).map_err(|e| StoreError::Blob(e.to_string()))
    }

    async fn get_user_track_list(&self, user_id: &str) -> StoreResult<Vec<String>> {
        self.check("get_user_track_list")?;
        let inner = self.inner.read();
        inner.user(user_id)?;
        Ok(inner.user_tracks.get(user_id).cloned().unwrap_or_default())
    }

    async fn add_tracks_to_user_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        self.check("add_tracks_to_user_list")?;
        let mut inner = self.inner.write();
        inner.user(user_id)?;
        for id in track_ids {
            inner.track(id)?;
        }

        add_members(
            inner.user_tracks.entry(user_id.to_string()).or_default(),
            track_ids,
        );
        Ok(())
    }

    async fn delete_tracks_from_user_list(
        &self,
        user_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        self.check("delete_tracks_from_user_list")?;
        let mut inner = self.inner.write();
        inner.user(user_id)?;
        if let Some(list) = inner.user_tracks.get_mut(user_id) {
            remove_members(list, track_ids);
        }
        Ok(())
    }

    async fn add_new_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        self.check("add_new_playlist")?;
        let mut inner = self.inner.write();
        inner.user(&playlist.created_by)?;

        let playlist = Playlist {
            id: new_id(),
            title: playlist.title,
            created_by: playlist.created_by,
        };
        inner.playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn get_playlist(&self, playlist_id: &str) -> StoreResult<Playlist> {
        self.check("get_playlist")?;
        self.inner.read().playlist(playlist_id).cloned()
    }

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>> {
        self.check("get_all_playlists")?;
        Ok(self.inner.read().playlists.clone())
    }

    async fn delete_playlist(&self, playlist_id: &str) -> StoreResult<()> {
        self.check("delete_playlist")?;
        let mut inner = self.inner.write();
        inner.playlist(playlist_id)?;

        let removed = [playlist_id.to_string()];
        inner.playlists.retain(|p| p.id != playlist_id);
        inner.playlist_tracks.remove(playlist_id);
        for list in inner.user_playlists.values_mut() {
            remove_members(list, &removed);
        }
        Ok(())
    }

    async fn get_playlist_tracks(&self, playlist_id: &str) -> StoreResult<Vec<String>> {
        self.check("get_playlist_tracks")?;
        let inner = self.inner.read();
        inner.playlist(playlist_id)?;
        Ok(inner
            .playlist_tracks
            .get(playlist_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        self.check("add_tracks_to_playlist")?;
        let mut inner = self.inner.write();
        inner.playlist(playlist_id)?;
        for id in track_ids {
            inner.track(id)?;
        }

        add_members(
            inner
                .playlist_tracks
                .entry(playlist_id.to_string())
                .or_default(),
            track_ids,
        );
        Ok(())
    }

    async fn delete_tracks_from_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> StoreResult<()> {
        self.check("delete_tracks_from_playlist")?;
        let mut inner = self.inner.write();
        inner.playlist(playlist_id)?;
        if let Some(list) = inner.playlist_tracks.get_mut(playlist_id) {
            remove_members(list, track_ids);
        }
        Ok(())
    }

    async fn get_user_playlists(&self, user_id: &str) -> StoreResult<Vec<String>> {
        self.check("get_user_playlists")?;
        let inner = self.inner.read();
        inner.user(user_id)?;
        Ok(inner.user_playlists.get(user_id).cloned().unwrap_or_default())
    }

    async fn add_playlists_to_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> StoreResult<()> {
        self.check("add_playlists_to_user_list")?;
        let mut inner = self.inner.write();
        inner.user(user_id)?;
        for id in playlist_ids {
            inner.playlist(id)?;
        }

        add_members(
            inner.user_playlists.entry(user_id.to_string()).or_default(),
            playlist_ids,
        );
        Ok(())
    }

    async fn delete_playlists_from_user_list(
        &self,
        user_id: &str,
        playlist_ids: &[String],
    ) -> StoreResult<()> {
        self.check("delete_playlists_from_user_list")?;
        let mut inner = self.inner.write();
        inner.user(user_id)?;
        if let Some(list) = inner.user_playlists.get_mut(user_id) {
            remove_members(list, playlist_ids);
        }
        Ok(())
    }

    async fn add_refresh_token(&self, user_id: &str, token: &str) -> StoreResult<()> {
        self.check("add_refresh_token")?;
        let mut inner = self.inner.write();
        inner.user(user_id)?;
        inner
            .refresh_tokens
            .insert((user_id.to_string(), refresh_token_digest(token)));
        Ok(())
    }

    async fn update_refresh_token(
        &self,
        user_id: &str,
        old_token: &str,
        new_token: &str,
    ) -> StoreResult<()> {
        self.check("update_refresh_token")?;
        let mut inner = self.inner.write();
        let old = (user_id.to_string(), refresh_token_digest(old_token));
        if !inner.refresh_tokens.remove(&old) {
            return Err(StoreError::not_found("refresh token", user_id));
        }
        inner
            .refresh_tokens
            .insert((user_id.to_string(), refresh_token_digest(new_token)));
        Ok(())
    }

    async fn delete_refresh_token(&self, user_id: &str, token: &str) -> StoreResult<()> {
        self.check("delete_refresh_token")?;
        let key = (user_id.to_string(), refresh_token_digest(token));
        if !self.inner.write().refresh_tokens.remove(&key) {
            return Err(StoreError::not_found("refresh token", user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::no_upload;
    use crate::models::UserRole;

    async fn seeded() -> (MemoryStore, User, String) {
        let store = MemoryStore::new();
        let user = store
            .add_new_user(NewUser {
                email: "ann@example.com".to_string(),
                username: "ann".to_string(),
                password: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap();
        let artist_id = store.ensure_artist("Artist X");
        (store, user, artist_id)
    }

    async fn upload(store: &MemoryStore, user: &User, artist_id: &str, title: &str) -> Track {
        store
            .add_new_track(
                NewTrack {
                    title: title.to_string(),
                    artist_id: artist_id.to_string(),
                    genre_id: "rock".to_string(),
                    uploaded_by: user.id.clone(),
                },
                no_upload(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ensure_artist_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.ensure_artist("Artist X");
        let b = store.ensure_artist("Artist X");
        assert_eq!(a, b);
        assert_eq!(store.get_all_artists().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (store, _, _) = seeded().await;
        let err = store
            .add_new_user(NewUser {
                email: "ann@example.com".to_string(),
                username: "other".to_string(),
                password: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_no_track() {
        let (store, user, artist_id) = seeded().await;
        let err = store
            .add_new_track(
                NewTrack {
                    title: "Song A".to_string(),
                    artist_id,
                    genre_id: "rock".to_string(),
                    uploaded_by: user.id,
                },
                Box::new(|_| Err(anyhow::anyhow!("disk full"))),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Blob(_)));
        assert!(store.get_all_tracks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_membership_keeps_order_and_ignores_duplicates() {
        let (store, user, artist_id) = seeded().await;
        let t1 = upload(&store, &user, &artist_id, "one").await;
        let t2 = upload(&store, &user, &artist_id, "two").await;
        let playlist = store
            .add_new_playlist(NewPlaylist {
                title: "Mix".to_string(),
                created_by: user.id.clone(),
            })
            .await
            .unwrap();

        store
            .add_tracks_to_playlist(&playlist.id, &[t2.id.clone(), t1.id.clone()])
            .await
            .unwrap();
        store
            .add_tracks_to_playlist(&playlist.id, &[t2.id.clone()])
            .await
            .unwrap();

        assert_eq!(
            store.get_playlist_tracks(&playlist.id).await.unwrap(),
            vec![t2.id.clone(), t1.id.clone()]
        );

        store
            .delete_tracks_from_playlist(&playlist.id, &[t2.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(
            store.get_playlist_tracks(&playlist.id).await.unwrap(),
            vec![t1.id]
        );
    }

    #[tokio::test]
    async fn test_adding_unknown_track_fails_without_change() {
        let (store, user, artist_id) = seeded().await;
        let t1 = upload(&store, &user, &artist_id, "one").await;

        let err = store
            .add_tracks_to_user_list(&user.id, &[t1.id.clone(), "ghost".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_user_track_list(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_track_delete_cascades_memberships() {
        let (store, user, artist_id) = seeded().await;
        let track = upload(&store, &user, &artist_id, "one").await;
        let playlist = store
            .add_new_playlist(NewPlaylist {
                title: "Mix".to_string(),
                created_by: user.id.clone(),
            })
            .await
            .unwrap();
        store
            .add_tracks_to_playlist(&playlist.id, &[track.id.clone()])
            .await
            .unwrap();
        store
            .add_tracks_to_user_list(&user.id, &[track.id.clone()])
            .await
            .unwrap();

        store
            .delete_track(&track.id, Box::new(|_| Ok(())))
            .await
            .unwrap();

        assert!(store.get_track(&track.id).await.unwrap_err().is_not_found());
        assert!(store.get_playlist_tracks(&playlist.id).await.unwrap().is_empty());
        assert!(store.get_user_track_list(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_audio_removal_still_deletes_track() {
        let (store, user, artist_id) = seeded().await;
        let track = upload(&store, &user, &artist_id, "one").await;

        let err = store
            .delete_track(&track.id, Box::new(|_| Err(anyhow::anyhow!("read-only disk"))))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Blob(_)));
        assert!(store.get_track(&track.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_refresh_token_replace_and_delete() {
        let (store, user, _) = seeded().await;
        store.add_refresh_token(&user.id, "r1").await.unwrap();

        store.update_refresh_token(&user.id, "r1", "r2").await.unwrap();
        assert!(store
            .update_refresh_token(&user.id, "r1", "r3")
            .await
            .unwrap_err()
            .is_not_found());

        store.delete_refresh_token(&user.id, "r2").await.unwrap();
        assert!(store
            .delete_refresh_token(&user.id, "r2")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_fail_on_injects_errors() {
        let (store, _, artist_id) = seeded().await;
        store.fail_on("get_artist");
        let err = store.get_artist(&artist_id).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
