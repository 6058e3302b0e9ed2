//! Track model

use serde::{Deserialize, Serialize};

/// A stored track, with foreign references left unresolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist_id: String,
    pub genre_id: String,
    /// User that uploaded the audio
    pub uploaded_by: String,
}

/// Track metadata handed to the store on upload
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub title: String,
    pub artist_id: String,
    pub genre_id: String,
    pub uploaded_by: String,
}

/// Metadata replacement for an existing track
#[derive(Debug, Clone)]
pub struct TrackUpdate {
    pub id: String,
    pub title: String,
    pub artist_id: String,
    pub genre_id: String,
}

/// Client-facing track view with the artist name folded in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
}
