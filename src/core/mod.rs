//! Core library functions for melodeck

pub mod catalog;
pub mod error;
pub mod guard;
pub mod tokens;

pub use catalog::{CatalogService, TrackUpload};
pub use error::{AuthError, ServiceError};
pub use tokens::TokenService;
