//! REST API routes for melodeck

pub mod artist;
pub mod auth;
pub mod middleware;
pub mod playlist;
pub mod response;
pub mod track;
pub mod user;

use actix_web::web;
use serde::Deserialize;

/// Request body carrying a list of ids for membership changes
#[derive(Debug, Deserialize)]
pub struct IdList {
    pub ids: Vec<String>,
}

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Sign-up, sign-in and session routes
        .service(web::scope("/auth").configure(auth::configure))
        // Artist routes
        .service(web::scope("/artists").configure(artist::configure))
        // Catalog track routes
        .service(web::scope("/tracks").configure(track::configure))
        // Playlist routes
        .service(web::scope("/playlists").configure(playlist::configure))
        // Per-user library, upload and audio routes
        .service(web::scope("/users").configure(user::configure));
}
