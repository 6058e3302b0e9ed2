//! Data models for melodeck
//!
//! Stored records (`User`, `Track`, `Artist`, `Playlist`) mirror what the
//! catalog store persists. `TrackResponse` and `PlaylistResponse` are views
//! rebuilt on every read and never persisted.

mod artist;
mod playlist;
mod track;
mod user;

pub use artist::Artist;
pub use playlist::{NewPlaylist, Playlist, PlaylistResponse};
pub use track::{NewTrack, Track, TrackResponse, TrackUpdate};
pub use user::{NewUser, PublicUser, User, UserRole};

/// An access/refresh token pair handed to a signed-in client
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
