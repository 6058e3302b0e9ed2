//! Error kinds raised by the session, authorization and catalog services

use thiserror::Error;

use crate::db::StoreError;

/// Authentication and authorization failures.
///
/// These never carry store detail; the caller only learns which rule failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token provided")]
    NoToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("forbidden")]
    Forbidden,

    #[error("not the owner of this resource")]
    NotOwner,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The first step of a workflow committed, a later one failed. The
    /// committed record stays in the store and can be read back by `id`.
    #[error("{entity} {id} was saved but the request did not complete: {source}")]
    Incomplete {
        entity: &'static str,
        id: String,
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    pub(crate) fn incomplete(entity: &'static str, id: &str, source: ServiceError) -> Self {
        ServiceError::Incomplete {
            entity,
            id: id.to_string(),
            source: Box::new(source),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
