//! Single in-memory authority for favorites during a session.
//!
//! Mutations apply to memory first and are then written through to the
//! [`PersistentStore`]. A failed write leaves memory untouched: the session
//! keeps working with its favorites even when the medium does not.

use std::sync::Arc;

use mockable::Clock;
use tracing::debug;

use crate::domain::{
    EntityId, FavoriteEntry, FavoriteKind, FavoritesSet, Listing, PersistentStore, StorageKey,
};

fn storage_key(kind: FavoriteKind) -> StorageKey {
    match kind {
        FavoriteKind::House => StorageKey::FavoriteHouses,
        FavoriteKind::Job => StorageKey::FavoriteJobs,
    }
}

/// Favorites set manager.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use marketplace_client::domain::ports::SilentNotifier;
/// use marketplace_client::domain::{
///     EntityId, FavoriteKind, FavoritesManager, HouseSnapshot, Listing, PersistentStore,
/// };
/// use marketplace_client::outbound::storage::MemoryKeyValueStore;
/// use mockable::DefaultClock;
///
/// let store = PersistentStore::new(
///     Arc::new(MemoryKeyValueStore::default()),
///     Arc::new(SilentNotifier),
/// );
/// let mut favorites = FavoritesManager::load(store, Arc::new(DefaultClock));
/// let id = EntityId::new("h1").expect("id");
///
/// favorites.add(&Listing::house(id.clone(), HouseSnapshot::default()));
/// assert!(favorites.is_favorite(&id, FavoriteKind::House));
///
/// favorites.remove(&id, FavoriteKind::House);
/// assert!(!favorites.is_favorite(&id, FavoriteKind::House));
/// ```
pub struct FavoritesManager {
    favorites: FavoritesSet,
    store: PersistentStore,
    clock: Arc<dyn Clock>,
}

impl FavoritesManager {
    /// Restore both collections from the store.
    ///
    /// Missing keys start empty. Corrupt data starts empty and is reported by
    /// the store. Duplicate ids in persisted data collapse to the first
    /// occurrence.
    pub fn load(store: PersistentStore, clock: Arc<dyn Clock>) -> Self {
        let houses: Vec<FavoriteEntry> = store.load(StorageKey::FavoriteHouses).unwrap_or_default();
        let jobs: Vec<FavoriteEntry> = store.load(StorageKey::FavoriteJobs).unwrap_or_default();
        let favorites = FavoritesSet::from_collections(houses, jobs);
        debug!(count = favorites.len(), "favorites restored");
        Self {
            favorites,
            store,
            clock,
        }
    }

    /// Favorite `listing` unless `(id, kind)` is already present.
    ///
    /// Returns `true` when a new entry was created. The snapshot of an
    /// existing entry is not refreshed; re-adding after a removal retakes it.
    pub fn add(&mut self, listing: &Listing) -> bool {
        let kind = listing.kind();
        let entry = FavoriteEntry::new(listing.clone(), Some(self.clock.utc()));
        let inserted = self.favorites.insert(entry);
        self.persist(kind);
        inserted
    }

    /// Unfavorite `(id, kind)`. Returns `true` when an entry was removed.
    pub fn remove(&mut self, id: &EntityId, kind: FavoriteKind) -> bool {
        let removed = self.favorites.remove(id, kind);
        self.persist(kind);
        removed
    }

    /// Whether `(id, kind)` is favorited.
    pub fn is_favorite(&self, id: &EntityId, kind: FavoriteKind) -> bool {
        self.favorites.contains(id, kind)
    }

    /// Favorites of one kind in display order.
    pub fn entries(&self, kind: FavoriteKind) -> &[FavoriteEntry] {
        self.favorites.entries(kind)
    }

    /// Favorited houses in display order.
    pub fn houses(&self) -> &[FavoriteEntry] {
        self.entries(FavoriteKind::House)
    }

    /// Favorited jobs in display order.
    pub fn jobs(&self) -> &[FavoriteEntry] {
        self.entries(FavoriteKind::Job)
    }

    /// The whole set.
    pub fn favorites(&self) -> &FavoritesSet {
        &self.favorites
    }

    /// Replace one collection wholesale, as reconciliation does.
    pub fn replace(&mut self, kind: FavoriteKind, entries: Vec<FavoriteEntry>) {
        self.favorites.replace(kind, entries);
        self.persist(kind);
    }

    /// Forget every favorite and clear both keys from the medium.
    pub fn clear(&mut self) {
        self.favorites.clear();
        for kind in FavoriteKind::ALL {
            self.store.remove(storage_key(kind));
        }
    }

    fn persist(&self, kind: FavoriteKind) {
        self.store.save(storage_key(kind), self.favorites.entries(kind));
    }
}

impl std::fmt::Debug for FavoritesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesManager")
            .field("favorites", &self.favorites)
            .finish_non_exhaustive()
    }
}
