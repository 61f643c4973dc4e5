//! Port for the durable key-value medium behind local favorites and session
//! credentials.
//!
//! The medium behaves like browser local storage: string keys, string values,
//! synchronous access, and a finite quota. JSON encoding and failure isolation
//! live one layer up in [`crate::domain::PersistentStore`].

use super::define_port_error;

define_port_error! {
    /// Errors raised by key-value store adapters.
    pub enum KeyValueStoreError {
        /// The medium could not be opened at all.
        Unavailable { message: String } =>
            "key-value store unavailable: {message}",
        /// Reading a key failed.
        Read { key: String, message: String } =>
            "failed to read key {key}: {message}",
        /// Writing or removing a key failed.
        Write { key: String, message: String } =>
            "failed to write key {key}: {message}",
        /// The write would exceed the medium's quota.
        QuotaExceeded { key: String, limit: usize } =>
            "writing key {key} would exceed the {limit} byte quota",
    }
}

/// Port for string key-value persistence.
///
/// Implementations must treat a missing key as `Ok(None)` and removal of a
/// missing key as success.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Delete `key` if present.
    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}
