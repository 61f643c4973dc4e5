//! Durable key-value store backed by one JSON file per key.
//!
//! The store only ever touches its own directory: it holds a `cap_std`
//! capability for the directory and never resolves paths outside it.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use super::atomic_write::write_atomic;
use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

const FILE_EXTENSION: &str = "json";

/// [`KeyValueStore`] persisting each key as `<key>.json` inside a directory.
///
/// Keys are restricted to ASCII alphanumerics, `-`, and `_`.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use marketplace_client::domain::ports::KeyValueStore;
/// use marketplace_client::outbound::storage::FileKeyValueStore;
///
/// let store = FileKeyValueStore::open(Utf8Path::new(".marketplace")).expect("open store");
/// store.set("token", "abc").expect("write token");
/// ```
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: Dir,
    root: Utf8PathBuf,
}

impl FileKeyValueStore {
    /// Open `root`, creating it and its parents when missing.
    pub fn open(root: &Utf8Path) -> Result<Self, KeyValueStoreError> {
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(|err| {
            KeyValueStoreError::unavailable(format!("cannot create {root}: {err}"))
        })?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| {
            KeyValueStoreError::unavailable(format!("cannot open {root}: {err}"))
        })?;
        debug!(root = %root, "file key-value store opened");
        Ok(Self {
            dir,
            root: root.to_path_buf(),
        })
    }

    /// Directory holding the key files.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

fn file_name(key: &str) -> Option<String> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    valid.then(|| format!("{key}.{FILE_EXTENSION}"))
}

fn invalid_key(key: &str) -> String {
    format!("key {key:?} must be non-empty ASCII alphanumerics, '-' or '_'")
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let name = file_name(key).ok_or_else(|| KeyValueStoreError::read(key, invalid_key(key)))?;
        match self.dir.read_to_string(&name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(KeyValueStoreError::read(key, err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let name = file_name(key).ok_or_else(|| KeyValueStoreError::write(key, invalid_key(key)))?;
        write_atomic(&self.dir, &name, value)
            .map_err(|err| KeyValueStoreError::write(key, err.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let name = file_name(key).ok_or_else(|| KeyValueStoreError::write(key, invalid_key(key)))?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(KeyValueStoreError::write(key, err.to_string())),
        }
    }
}
