//! Whole-value key/value persistence for the captured session and the final
//! strip.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
};

use crate::error::StoreError;

/// JSON array of still-image data URIs.
pub const CAPTURED_PHOTOS_KEY: &str = "capturedPhotos";
/// Data URI of the last exported strip.
pub const EDITED_STRIP_KEY: &str = "editedPhotoStrip";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the whole value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One file per key inside a directory; writes go through a temp file so a
/// reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| StoreError::Persist {
            path: path.clone(),
            source: e.error,
        })?;
        log::debug!("Stored {key} ({} bytes)", value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_store_overwrites_whole_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::open(dir.path().join("nested")).unwrap();
        assert_eq!(store.get(CAPTURED_PHOTOS_KEY).unwrap(), None);

        store.set(CAPTURED_PHOTOS_KEY, "[\"a\",\"b\"]").unwrap();
        store.set(CAPTURED_PHOTOS_KEY, "[]").unwrap();
        assert_eq!(store.get(CAPTURED_PHOTOS_KEY).unwrap().as_deref(), Some("[]"));

        store.remove(CAPTURED_PHOTOS_KEY).unwrap();
        store.remove(CAPTURED_PHOTOS_KEY).unwrap();
        assert_eq!(store.get(CAPTURED_PHOTOS_KEY).unwrap(), None);
    }

    #[test]
    fn keys_are_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        store.set(CAPTURED_PHOTOS_KEY, "photos").unwrap();
        store.set(EDITED_STRIP_KEY, "strip").unwrap();
        assert_eq!(store.get(CAPTURED_PHOTOS_KEY).unwrap().as_deref(), Some("photos"));
        assert_eq!(store.get(EDITED_STRIP_KEY).unwrap().as_deref(), Some("strip"));
    }

    #[test]
    fn key_names_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        assert_eq!(store.path_for("../evil").parent(), Some(dir.path()));
    }

    #[test]
    fn memory_store_behaves_like_dir_store() {
        let mut store = MemoryStore::new();
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
