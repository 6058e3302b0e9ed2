//! Playlist routes
//!
//! Reads are open to any signed-in user; changes require being the creator.

use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::middleware::AuthenticatedUser;
use super::response::{created, ok};
use super::IdList;
use crate::core::{CatalogService, ServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    pub title: String,
    #[serde(default)]
    pub track_ids: Vec<String>,
}

/// Get all playlists
#[get("")]
pub async fn get_all_playlists(
    _user: AuthenticatedUser,
    service: web::Data<CatalogService>,
) -> Result<HttpResponse, ServiceError> {
    let playlists = service.get_all_playlists().await?;
    Ok(ok(json!({ "playlists": playlists })))
}

/// Create a playlist owned by the caller
#[post("")]
pub async fn create_playlist(
    user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    body: web::Json<CreatePlaylistRequest>,
) -> Result<HttpResponse, ServiceError> {
    let playlist = service
        .create_new_playlist(&body.title, &user.user_id, &body.track_ids)
        .await?;
    Ok(created(json!({ "playlist": playlist })))
}

#[get("/{playlistId}")]
pub async fn get_playlist(
    _user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let playlist = service.get_playlist_by_id(&path.into_inner()).await?;
    Ok(ok(json!({ "playlist": playlist })))
}

#[delete("/{playlistId}")]
pub async fn remove_playlist(
    user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    service
        .delete_playlist_by_id(&user.user_id, &path.into_inner())
        .await?;
    Ok(ok(json!({})))
}

#[post("/{playlistId}/tracks")]
pub async fn add_tracks(
    user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    path: web::Path<String>,
    body: web::Json<IdList>,
) -> Result<HttpResponse, ServiceError> {
    service
        .add_tracks_to_playlist(&user.user_id, &path.into_inner(), &body.ids)
        .await?;
    Ok(ok(json!({})))
}

#[delete("/{playlistId}/tracks")]
pub async fn remove_tracks(
    user: AuthenticatedUser,
    service: web::Data<CatalogService>,
    path: web::Path<String>,
    body: web::Json<IdList>,
) -> Result<HttpResponse, ServiceError> {
    service
        .delete_tracks_from_playlist(&user.user_id, &path.into_inner(), &body.ids)
        .await?;
    Ok(ok(json!({})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_all_playlists)
        .service(create_playlist)
        .service(get_playlist)
        .service(remove_playlist)
        .service(add_tracks)
        .service(remove_tracks);
}
