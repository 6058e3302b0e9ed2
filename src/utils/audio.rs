//! Uploaded audio on disk
//!
//! Each track's audio is a single file named after the track id. The store
//! never sees the bytes; it receives callbacks that write or remove the file
//! once the track id is known.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::db::{DeleteTrackCallback, DiscardUpload, UploadTrackCallback};

#[derive(Debug, Clone)]
pub struct AudioStorage {
    dir: PathBuf,
}

impl AudioStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding a track's audio. `None` for ids that are not a plain
    /// file name.
    pub fn path_for(&self, track_id: &str) -> Option<PathBuf> {
        let is_plain = !track_id.is_empty()
            && track_id != "."
            && track_id != ".."
            && !track_id.contains(['/', '\\']);

        is_plain.then(|| self.dir.join(track_id))
    }

    /// Callback writing `bytes` under the id the store assigns
    pub fn upload_callback(&self, bytes: Vec<u8>) -> UploadTrackCallback {
        let storage = self.clone();
        Box::new(move |track_id| {
            let path = storage.checked_path(track_id)?;
            std::fs::write(&path, &bytes)
                .with_context(|| format!("writing audio to {}", path.display()))?;
            tracing::debug!(track_id = %track_id, size = bytes.len(), "stored audio");

            let discard: DiscardUpload = Box::new(move || {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!("Failed to discard {}: {}", path.display(), e);
                }
            });
            Ok(discard)
        })
    }

    /// Callback removing a deleted track's audio; a missing file is fine
    pub fn delete_callback(&self) -> DeleteTrackCallback {
        let storage = self.clone();
        Box::new(move |track_id| {
            let path = storage.checked_path(track_id)?;
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
            }
        })
    }

    fn checked_path(&self, track_id: &str) -> anyhow::Result<PathBuf> {
        self.path_for(track_id)
            .with_context(|| format!("invalid track id for audio storage: {}", track_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upload_then_delete() {
        let dir = TempDir::new().unwrap();
        let storage = AudioStorage::new(dir.path());

        (storage.upload_callback(b"RIFF".to_vec()))("track-1").unwrap();
        let path = storage.path_for("track-1").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");

        (storage.delete_callback())("track-1").unwrap();
        assert!(!path.exists());

        // already gone
        (storage.delete_callback())("track-1").unwrap();
    }

    #[test]
    fn test_discard_removes_uncommitted_upload() {
        let dir = TempDir::new().unwrap();
        let storage = AudioStorage::new(dir.path());

        let discard = (storage.upload_callback(b"RIFF".to_vec()))("track-1").unwrap();
        let path = storage.path_for("track-1").unwrap();
        assert!(path.exists());

        discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let storage = AudioStorage::new("/tmp/audio");
        assert!(storage.path_for("..").is_none());
        assert!(storage.path_for("a/b").is_none());
        assert!(storage.path_for("").is_none());
        assert!((storage.upload_callback(vec![1]))("../x").is_err());
    }

    #[test]
    fn test_upload_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let storage = AudioStorage::new(dir.path().join("missing"));
        assert!((storage.upload_callback(vec![1]))("track-1").is_err());
    }
}
