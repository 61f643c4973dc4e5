//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Each trait exposes a strongly typed error so adapters map their failures
//! into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod key_value_store;
mod notifier;
mod remote_favorites;

#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{KeyValueStore, KeyValueStoreError};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notice, NoticeLevel, Notifier, SilentNotifier};
#[cfg(test)]
pub use remote_favorites::MockRemoteFavorites;
pub use remote_favorites::{RemoteFavorites, RemoteFavoritesError};
