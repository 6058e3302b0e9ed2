//! Catalog track routes

use actix_web::{delete, get, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::middleware::AuthenticatedUser;
use super::response::ok;
use crate::core::{CatalogService, ServiceError};
use crate::models::TrackUpdate;
use crate::utils::audio::AudioStorage;

/// Track metadata update request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadataUpdate {
    pub title: String,
    pub artist_id: String,
    pub genre_id: String,
}

/// Get every track in the catalog
#[get("")]
pub async fn get_all_tracks(
    _user: AuthenticatedUser,
    service: web::Data<CatalogService>,
) -> Result<HttpResponse, ServiceError> {
    let tracks = service.get_all_tracks().await?;
    Ok(ok(json!({ "tracks": tracks })))
}

/// Get track by id
#[get("/{trackId}")]
pub async fn get_track(
    _user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let track = service.get_track_by_id(&path.into_inner()).await?;
    Ok(ok(json!({ "track": track })))
}

/// Replace track metadata (uploader only)
#[put("/{trackId}")]
pub async fn update_track(
    user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    path: web::Path<String>,
    body: web::Json<TrackMetadataUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    let update = TrackUpdate {
        id: path.into_inner(),
        title: body.title,
        artist_id: body.artist_id,
        genre_id: body.genre_id,
    };

    let track = service.update_track_by_id(&user.user_id, update).await?;
    Ok(ok(json!({ "track": track })))
}

/// Delete a track and its audio (uploader only)
#[delete("/{trackId}")]
pub async fn delete_track(
    user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    audio: web::Data<AudioStorage>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    service
        .delete_track_by_id(&user.user_id, &path.into_inner(), audio.delete_callback())
        .await?;
    Ok(ok(json!({})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_all_tracks)
        .service(get_track)
        .service(update_track)
        .service(delete_track);
}
