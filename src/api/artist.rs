//! Artist routes

use actix_web::{get, web, HttpResponse};
use serde_json::json;

use super::middleware::AuthenticatedUser;
use super::response::ok;
use crate::core::{CatalogService, ServiceError};

/// List all artists, needed to pick an `artistId` when uploading
#[get("")]
pub async fn get_all_artists(
    _user: AuthenticatedUser,
    service: web::Data<CatalogService>,
) -> Result<HttpResponse, ServiceError> {
    let artists = service.list_artists().await?;
    Ok(ok(json!({ "artists": artists })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_all_artists);
}
