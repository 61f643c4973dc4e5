//! JSON persistence over a [`KeyValueStore`] with failure isolation.
//!
//! Nothing in here returns an error to the caller. Every failure is logged,
//! reported through the [`Notifier`], and degrades to "this session only".

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::ports::{KeyValueStore, Notice, Notifier};

const SESSION_ONLY_HINT: &str = "changes are kept for this session only";

/// Keys this crate reads and writes in the persistence medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// JSON array of favorited houses.
    FavoriteHouses,
    /// JSON array of favorited jobs.
    FavoriteJobs,
    /// Bearer token issued at login.
    Token,
    /// JSON user object whose `user_type` holds the encoded role.
    User,
}

impl StorageKey {
    /// Raw key string in the medium.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FavoriteHouses => "favoriteHouses",
            Self::FavoriteJobs => "favoriteJobs",
            Self::Token => "token",
            Self::User => "user",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fail-soft JSON store.
///
/// Cloning is cheap; clones share the underlying medium and notifier.
#[derive(Clone)]
pub struct PersistentStore {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl PersistentStore {
    /// Wrap a key-value medium and the notifier used for degraded-mode notices.
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Notifier shared with collaborators built on this store.
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    /// Load and decode the value under `key`.
    ///
    /// Returns `None` when the key is absent, unreadable, or holds data that
    /// does not decode as `T`. Only the last two cases notify.
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = match self.store.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "no persisted value");
                return None;
            }
            Err(error) => {
                warn!(key = %key, error = %error, "persisted value unreadable");
                self.notify_read_failure();
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key = %key, error = %error, "persisted value is not valid JSON for its type");
                self.notifier.notify(Notice::warning(format!(
                    "Saved data was corrupted and has been ignored; {SESSION_ONLY_HINT}."
                )));
                None
            }
        }
    }

    /// Encode and write `value` under `key`.
    ///
    /// Returns `true` when the value reached the medium. A `false` result
    /// never implies in-memory state should be rolled back.
    pub fn save<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(key = %key, error = %error, "value could not be encoded");
                self.notify_write_failure();
                return false;
            }
        };

        match self.store.set(key.as_str(), &encoded) {
            Ok(()) => true,
            Err(error) => {
                warn!(key = %key, error = %error, "value could not be persisted");
                self.notify_write_failure();
                false
            }
        }
    }

    /// Store a plain string without JSON encoding.
    pub fn save_raw(&self, key: StorageKey, value: &str) -> bool {
        match self.store.set(key.as_str(), value) {
            Ok(()) => true,
            Err(error) => {
                warn!(key = %key, error = %error, "value could not be persisted");
                self.notify_write_failure();
                false
            }
        }
    }

    /// Read a plain string without JSON decoding.
    pub fn load_raw(&self, key: StorageKey) -> Option<String> {
        match self.store.get(key.as_str()) {
            Ok(value) => value,
            Err(error) => {
                warn!(key = %key, error = %error, "persisted value unreadable");
                self.notify_read_failure();
                None
            }
        }
    }

    /// Delete `key`. Returns `true` when the medium confirmed the removal.
    ///
    /// A failed removal leaves the old value on the medium, where the next
    /// load finds it again; the user is told so.
    pub fn remove(&self, key: StorageKey) -> bool {
        match self.store.remove(key.as_str()) {
            Ok(()) => true,
            Err(error) => {
                warn!(key = %key, error = %error, "value could not be removed");
                self.notifier.notify(Notice::warning(
                    "Saved data could not be deleted from this device and may return next time.",
                ));
                false
            }
        }
    }

    fn notify_read_failure(&self) {
        self.notifier.notify(Notice::warning(format!(
            "Saved data could not be read; {SESSION_ONLY_HINT}."
        )));
    }

    fn notify_write_failure(&self) {
        self.notifier.notify(Notice::warning(format!(
            "Favorites could not be saved on this device; {SESSION_ONLY_HINT}."
        )));
    }
}

impl fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentStore").finish_non_exhaustive()
    }
}
