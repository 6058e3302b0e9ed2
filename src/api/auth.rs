//! Account and session routes

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::response::{created, ok};
use crate::core::{AuthError, CatalogService, ServiceError};
use crate::models::TokenPair;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn tokens_response(pair: TokenPair) -> HttpResponse {
    ok(json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    }))
}

/// create an account with the configured default role
#[post("/signup")]
pub async fn sign_up(
    service: web::Data<CatalogService>,
    body: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user = service
        .sign_up(&body.email, &body.username, &body.password)
        .await?;
    Ok(created(json!({ "user": user })))
}

/// sign in; a wrong password and an unknown email look the same to the client
#[post("/signin")]
pub async fn sign_in(
    service: web::Data<CatalogService>,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, ServiceError> {
    match service.sign_in(&body.email, &body.password).await {
        Ok(Some(pair)) => Ok(tokens_response(pair)),
        Ok(None) => Err(AuthError::InvalidCredentials.into()),
        Err(ServiceError::Store(e)) if e.is_not_found() => Err(AuthError::InvalidCredentials.into()),
        Err(e) => Err(e),
    }
}

/// exchange a refresh token for a new pair
#[post("/refresh")]
pub async fn refresh(
    service: web::Data<CatalogService>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ServiceError> {
    let pair = service.refresh_token(&body.refresh_token).await?;
    Ok(tokens_response(pair))
}

/// revoke a refresh token
#[post("/signout")]
pub async fn sign_out(
    service: web::Data<CatalogService>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ServiceError> {
    service.sign_out(&body.refresh_token).await?;
    Ok(ok(json!({})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_up)
        .service(sign_in)
        .service(refresh)
        .service(sign_out);
}
