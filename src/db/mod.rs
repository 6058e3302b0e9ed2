//! Database module for melodeck
//!
//! The services only see the [`CatalogStore`] trait. Two backends implement
//! it: SQLx/SQLite for deployments and an in-process store for `--memory`
//! runs and tests.

mod engine;
mod memory;
mod sqlite;
pub mod store;
pub mod tables;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{
    CatalogStore, DeleteTrackCallback, DiscardUpload, StoreError, StoreResult,
    UploadTrackCallback,
};
