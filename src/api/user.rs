//! Per-user routes under `/users/{userId}`
//!
//! Every handler here takes [`ScopedUser`], so a token only reaches its own
//! user's library and audio.

use actix_files::NamedFile;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::middleware::ScopedUser;
use super::response::{created, ok};
use super::IdList;
use crate::core::{CatalogService, ServiceError, TrackUpload};
use crate::db::StoreError;
use crate::utils::audio::AudioStorage;

/// Largest accepted audio upload
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Track metadata passed in the upload query string
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub title: String,
    pub artist_id: String,
    pub genre_id: String,
}

#[get("/{userId}")]
pub async fn get_profile(
    user: ScopedUser,
    service: web::Data<CatalogService>,
) -> Result<HttpResponse, ServiceError> {
    let profile = service.get_user_profile(&user.user_id).await?;
    Ok(ok(json!({ "user": profile })))
}

/// Upload audio; the raw request body is the file
#[post("/{userId}/tracks/upload")]
pub async fn upload_track(
    user: ScopedUser,
    service: web::Data<CatalogService>,
    audio: web::Data<AudioStorage>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    let upload = TrackUpload {
        title: query.title,
        artist_id: query.artist_id,
        genre_id: query.genre_id,
    };

    let track = service
        .add_new_track(&user.user_id, upload, audio.upload_callback(body.to_vec()))
        .await?;
    Ok(created(json!({ "track": track })))
}

/// Stream a track's stored audio
#[get("/{userId}/tracks/{trackId}/audio")]
pub async fn stream_audio(
    req: HttpRequest,
    _user: ScopedUser,
    service: web::Data<CatalogService>,
    audio: web::Data<AudioStorage>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServiceError> {
    let (_, track_id) = path.into_inner();
    service.get_track_by_id(&track_id).await?;

    let file = audio
        .path_for(&track_id)
        .and_then(|file_path| NamedFile::open(file_path).ok())
        .ok_or_else(|| StoreError::not_found("audio", &track_id))?;

    Ok(file.into_response(&req))
}

#[get("/{userId}/tracks")]
pub async fn get_track_list(
    user: ScopedUser,
    service: web::Data<CatalogService>,
) -> Result<HttpResponse, ServiceError> {
    let tracks = service.get_user_track_list(&user.user_id).await?;
    Ok(ok(json!({ "tracks": tracks })))
}

#[post("/{userId}/tracks")]
pub async fn add_to_track_list(
    user: ScopedUser,
    service: web::Data<CatalogService>,
    body: web::Json<IdList>,
) -> Result<HttpResponse, ServiceError> {
    service
        .add_tracks_to_user_track_list(&user.user_id, &body.ids)
        .await?;
    Ok(ok(json!({})))
}

#[delete("/{userId}/tracks")]
pub async fn remove_from_track_list(
    user: ScopedUser,
    service: web::Data<CatalogService>,
    body: web::Json<IdList>,
) -> Result<HttpResponse, ServiceError> {
    service
        .delete_tracks_from_user_track_list(&user.user_id, &body.ids)
        .await?;
    Ok(ok(json!({})))
}

#[get("/{userId}/playlists")]
pub async fn get_playlists(
    user: ScopedUser,
    service: web::Data<CatalogService>,
) -> Result<HttpResponse, ServiceError> {
    let playlists = service.get_user_playlists(&user.user_id).await?;
    Ok(ok(json!({ "playlists": playlists })))
}

#[post("/{userId}/playlists")]
pub async fn add_playlists(
    user: ScopedUser,
    service: web::Data<CatalogService>,
    body: web::Json<IdList>,
) -> Result<HttpResponse, ServiceError> {
    service
        .add_playlists_to_user_list(&user.user_id, &body.ids)
        .await?;
    Ok(ok(json!({})))
}

#[delete("/{userId}/playlists")]
pub async fn remove_playlists(
    user: ScopedUser,
    service: web::Data<CatalogService>,
    body: web::Json<IdList>,
) -> Result<HttpResponse, ServiceError> {
    service
        .delete_playlists_from_user_list(&user.user_id, &body.ids)
        .await?;
    Ok(ok(json!({})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .service(upload_track)
        .service(stream_audio)
        .service(get_track_list)
        .service(add_to_track_list)
        .service(remove_from_track_list)
        .service(get_playlists)
        .service(add_playlists)
        .service(remove_playlists)
        .service(get_profile);
}
