//! Server settings for melodeck
//!
//! Settings live in `settings.json` in the config directory. A missing file is
//! created with defaults and a freshly generated JWT secret.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::models::UserRole;
use crate::utils::auth::generate_random_string;

pub const JWT_SECRET_ENV: &str = "MELODECK_JWT_SECRET";
pub const DEFAULT_ROLE_ENV: &str = "MELODECK_DEFAULT_ROLE";

const JWT_SECRET_LENGTH: usize = 64;

/// Server settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// HS256 signing secret for session tokens
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: i64,

    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: i64,

    /// Role given to every account created through sign-up
    #[serde(default)]
    pub default_role: UserRole,

    /// pbkdf2 rounds for new password hashes
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,

    /// Artist names inserted on startup when missing
    #[serde(default)]
    pub seed_artists: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl_secs: default_access_ttl(),
            refresh_token_ttl_secs: default_refresh_ttl(),
            default_role: UserRole::default(),
            hash_iterations: default_hash_iterations(),
            seed_artists: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from file, writing defaults when the file is missing or
    /// has no secret yet
    pub fn load(settings_path: &Path) -> Result<Self> {
        let mut settings = if settings_path.exists() {
            let content =
                std::fs::read_to_string(settings_path).context("Failed to read settings file")?;
            serde_json::from_str(&content).context("Failed to parse settings file")?
        } else {
            Self::default()
        };
        settings.validate()?;

        if settings.jwt_secret.is_empty() {
            info!("Generating a new JWT secret");
            settings.jwt_secret = generate_random_string(JWT_SECRET_LENGTH);
            settings.save(settings_path)?;
        }

        Ok(settings)
    }

    /// Token lifetimes and hash rounds must be positive
    fn validate(&self) -> Result<()> {
        if self.access_token_ttl_secs <= 0 {
            bail!("accessTokenTtlSecs must be positive, got {}", self.access_token_ttl_secs);
        }
        if self.refresh_token_ttl_secs <= 0 {
            bail!("refreshTokenTtlSecs must be positive, got {}", self.refresh_token_ttl_secs);
        }
        if self.hash_iterations == 0 {
            bail!("hashIterations must be at least 1");
        }
        Ok(())
    }

    /// Save settings to file
    pub fn save(&self, settings_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(settings_path, content).context("Failed to write settings file")?;
        Ok(())
    }

    /// Apply `MELODECK_*` environment overrides. Never persisted.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(JWT_SECRET_ENV).ok(),
            std::env::var(DEFAULT_ROLE_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, jwt_secret: Option<String>, default_role: Option<String>) {
        if let Some(secret) = jwt_secret.filter(|s| !s.is_empty()) {
            self.jwt_secret = secret;
        }

        if let Some(raw) = default_role {
            match UserRole::parse(&raw) {
                Some(role) => self.default_role = role,
                None => warn!("Ignoring unknown {} value: {}", DEFAULT_ROLE_ENV, raw),
            }
        }
    }
}

fn default_access_ttl() -> i64 {
    15 * 60
}

fn default_refresh_ttl() -> i64 {
    30 * 24 * 60 * 60
}

fn default_hash_iterations() -> u32 {
    100_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_generates_and_persists_secret() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let first = Settings::load(&path).unwrap();
        assert_eq!(first.jwt_secret.len(), JWT_SECRET_LENGTH);
        assert!(path.exists());

        let second = Settings::load(&path).unwrap();
        assert_eq!(second.jwt_secret, first.jwt_secret);
        assert_eq!(second.access_token_ttl_secs, 900);
        assert_eq!(second.default_role, UserRole::User);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"jwtSecret":"s","defaultRole":"admin","seedArtists":["Artist X"]}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.jwt_secret, "s");
        assert_eq!(settings.default_role, UserRole::Admin);
        assert_eq!(settings.seed_artists, vec!["Artist X".to_string()]);
        assert_eq!(settings.hash_iterations, 100_000);
        assert_eq!(settings.refresh_token_ttl_secs, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_non_positive_lifetimes_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        for body in [
            r#"{"jwtSecret":"s","accessTokenTtlSecs":0}"#,
            r#"{"jwtSecret":"s","refreshTokenTtlSecs":-60}"#,
            r#"{"jwtSecret":"s","hashIterations":0}"#,
        ] {
            std::fs::write(&path, body).unwrap();
            assert!(Settings::load(&path).is_err(), "accepted {}", body);
        }
    }

    #[test]
    fn test_overrides() {
        let mut settings = Settings {
            jwt_secret: "file".to_string(),
            ..Settings::default()
        };

        settings.apply_overrides(Some(String::new()), Some("curator".to_string()));
        assert_eq!(settings.jwt_secret, "file");
        assert_eq!(settings.default_role, UserRole::User);

        settings.apply_overrides(Some("env".to_string()), Some("ADMIN".to_string()));
        assert_eq!(settings.jwt_secret, "env");
        assert_eq!(settings.default_role, UserRole::Admin);
    }
}
