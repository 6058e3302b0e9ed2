//! Request extractors for bearer authentication
//!
//! Handlers that need a signed-in user take [`AuthenticatedUser`]. Handlers
//! under `/users/{userId}` take [`ScopedUser`], which additionally requires the
//! path user to be the token's user.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::core::guard::authorize_path_identity;
use crate::core::{AuthError, CatalogService, ServiceError};

pub const USER_ID_PARAM: &str = "userId";

/// Pull the token out of an `Authorization` header value.
///
/// The value must be exactly `Bearer <token>`: two parts separated by a
/// single space.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = match header {
        None | Some("") => return Err(AuthError::NoToken),
        Some(value) => value,
    };

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(AuthError::InvalidToken),
    }
}

/// Identity behind a valid bearer access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl AuthenticatedUser {
    fn from_http(req: &HttpRequest) -> Result<Self, actix_web::Error> {
        let service = req
            .app_data::<web::Data<CatalogService>>()
            .ok_or_else(|| actix_web::error::ErrorInternalServerError("catalog service missing"))?;

        let header = match req.headers().get("Authorization") {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                ServiceError::from(AuthError::InvalidToken)
            })?),
        };

        let token = parse_bearer(header).map_err(ServiceError::from)?;
        let user_id = service
            .tokens()
            .authenticate(token)
            .map_err(ServiceError::from)?;

        Ok(Self { user_id })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_http(req))
    }
}

/// An authenticated user acting on their own `/users/{userId}` resources
#[derive(Debug, Clone)]
pub struct ScopedUser {
    pub user_id: String,
}

impl FromRequest for ScopedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(AuthenticatedUser::from_http(req).and_then(|user| {
            let path_user = req.match_info().get(USER_ID_PARAM).unwrap_or_default();
            authorize_path_identity(&user.user_id, path_user).map_err(ServiceError::from)?;
            Ok(ScopedUser {
                user_id: user.user_id,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer(Some("Bearer abc")).unwrap(), "abc");

        assert!(matches!(parse_bearer(None), Err(AuthError::NoToken)));
        assert!(matches!(parse_bearer(Some("")), Err(AuthError::NoToken)));

        for header in ["Bearer", "abc", "Basic abc", "bearer abc", "Bearer a b", "Bearer  abc"] {
            assert!(
                matches!(parse_bearer(Some(header)), Err(AuthError::InvalidToken)),
                "{:?}",
                header
            );
        }
    }
}
