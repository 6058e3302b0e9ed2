//! Path management for melodeck
//!
//! All files live under one config directory: `settings.json`, the sqlite
//! database and the uploaded audio.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Manages all filesystem paths for the application
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
}

impl Paths {
    /// Resolve the config directory and create it with its subfolders.
    ///
    /// With an override the directory is `<override>/melodeck` (or
    /// `.melodeck` inside the home directory); otherwise the platform config
    /// location is used.
    pub fn new(config_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_override {
            Some(parent) => {
                let name = if is_home_dir(&parent) {
                    ".melodeck"
                } else {
                    "melodeck"
                };
                parent.join(name)
            }
            None => directories::ProjectDirs::from("", "", "melodeck")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .context("could not determine a config directory, pass --config")?,
        };

        let paths = Self { config_dir };
        paths.create_directories()?;
        Ok(paths)
    }

    fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .with_context(|| format!("creating {}", self.config_dir.display()))?;
        std::fs::create_dir_all(self.audio_dir())?;
        Ok(())
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the catalog database path
    pub fn db_path(&self) -> PathBuf {
        self.config_dir.join("melodeck.db")
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Uploaded audio, one file per track id
    pub fn audio_dir(&self) -> PathBuf {
        self.config_dir.join("audio")
    }
}

/// Check if a path is in the user's home directory
fn is_home_dir(path: &Path) -> bool {
    directories::UserDirs::new()
        .map(|dirs| path.starts_with(dirs.home_dir()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::new(Some(temp_dir.path().to_path_buf())).unwrap();

        assert!(paths.config_dir().starts_with(temp_dir.path()));
        assert!(paths.config_dir().exists());
        assert!(paths.audio_dir().exists());
        assert_eq!(paths.db_path().file_name().unwrap(), "melodeck.db");
    }
}
