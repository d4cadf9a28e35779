//! File-backed store
//!
//! Each key is a `<key>.json` file under the store root. Writes land in a
//! temporary sibling first and are renamed over the target.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, validate_key};
use crate::error::{Result, TrackerError};

/// Store that keeps one file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| TrackerError::Io { key: root.display().to_string(), source })?;
        Ok(Self { root })
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TrackerError::Io { key: key.to_string(), source }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        let target = self.path_for(key);
        let staging = self.root.join(format!(".{key}.json.tmp"));

        fs::write(&staging, value)
            .and_then(|()| fs::rename(&staging, &target))
            .map_err(|source| TrackerError::Io { key: key.to_string(), source })?;

        tracing::debug!("Wrote {} bytes to {:?}", value.len(), target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("store");

        let store = FileStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert!(store.get("course-a-progress").unwrap().is_none());
    }

    #[test]
    fn set_then_get_returns_value() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        store.set("course-a-progress", br#"{"module-1":true}"#).unwrap();
        let value = store.get("course-a-progress").unwrap().unwrap();
        assert_eq!(value, br#"{"module-1":true}"#);
    }

    #[test]
    fn set_leaves_no_staging_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();
        store.set("course-a-notes", b"{}").unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["course-a-notes.json".to_string()]);
    }

    #[test]
    fn values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(temp_dir.path()).unwrap();
            store.set("k", b"persisted").unwrap();
        }
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"persisted"[..]));
    }

    #[test]
    fn traversal_key_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();
        assert!(matches!(store.set("../escape", b"x"), Err(TrackerError::InvalidKey(_))));
    }
}
