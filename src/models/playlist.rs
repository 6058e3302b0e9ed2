//! Playlist model

use serde::{Deserialize, Serialize};

use super::TrackResponse;

/// A stored playlist. Track membership lives in the store and is
/// fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    /// Owner user ID
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub title: String,
    pub created_by: String,
}

/// Client-facing playlist view with every member track resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub title: String,
    pub track_list: Vec<TrackResponse>,
}
