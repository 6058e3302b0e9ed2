//! Utility modules for melodeck

pub mod audio;
pub mod auth;
