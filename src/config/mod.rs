//! Configuration module for melodeck
//!
//! This module contains the server settings and path management.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::Settings;
