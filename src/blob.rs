//! Blob store access: the fetch capability the pipeline consumes, plus a
//! directory-backed implementation that also stages uploads.

use log::debug;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Capability to retrieve an uploaded object by its opaque key.
///
/// The pipeline receives this as an injected dependency; it never knows
/// where the bytes actually live.
pub trait BlobFetch {
    /// Fetches the full contents of the object at `key`.
    fn fetch(&self, key: &str) -> io::Result<Vec<u8>>;
}

/// A blob store over a local directory tree.
///
/// Object keys are slash-separated relative paths under the root. Keys that
/// escape the root (absolute paths, `..` components) are rejected.
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Creates a store over `root`. The directory is created lazily on the
    /// first `stage`; fetching from a missing root is an ordinary not-found.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DirBlobStore { root: root.into() }
    }

    /// Stages uploaded bytes under a fresh object key and returns the key.
    ///
    /// Keys take the form `uploads/<uuid>_<filename>`, so repeated uploads
    /// of the same filename never collide.
    pub fn stage(&self, filename: &str, bytes: &[u8]) -> io::Result<String> {
        let basename = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "unusable upload filename")
            })?;

        let key = format!("uploads/{}_{}", Uuid::new_v4(), basename);
        let path = self.resolve(&key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;

        debug!("Staged {} byte(s) at '{}'", bytes.len(), key);
        Ok(key)
    }

    fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            !matches!(c, Component::Normal(_) | Component::CurDir)
        });
        if key.is_empty() || escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid object key '{}'", key),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobFetch for DirBlobStore {
    fn fetch(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_then_fetch_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirBlobStore::new(dir.path());

        let key = store.stage("users.csv", b"user_id,email\n").unwrap();
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with("_users.csv"));

        let bytes = store.fetch(&key).unwrap();
        assert_eq!(bytes, b"user_id,email\n");
    }

    #[test]
    fn test_staged_keys_are_unique_per_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirBlobStore::new(dir.path());

        let a = store.stage("same.csv", b"a").unwrap();
        let b = store.stage("same.csv", b"b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_stage_strips_directories_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirBlobStore::new(dir.path());

        let key = store.stage("/tmp/incoming/users.csv", b"x").unwrap();
        assert!(key.ends_with("_users.csv"));
    }

    #[test]
    fn test_fetch_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirBlobStore::new(dir.path());

        let err = store.fetch("uploads/nope.csv").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirBlobStore::new(dir.path());

        for key in ["../secrets.csv", "/etc/passwd", ""] {
            let err = store.fetch(key).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "key: {:?}", key);
        }
    }
}
