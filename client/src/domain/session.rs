//! Session context: credentials, decoded role, and the favorites manager.
//!
//! A [`Session`] is built once when the client starts, owns every piece of
//! per-user client state, and is consumed by [`Session::logout`]. Nothing in
//! the crate keeps ambient global state; callers pass the session (or the
//! manager it lends out) explicitly.

use std::sync::Arc;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::{
    Affordance, FavoriteKind, FavoritesManager, PersistentStore, SessionRole, StorageKey,
};

/// User object persisted next to the bearer token.
///
/// `user_type` holds the role token exactly as the backend issued it; it is
/// decoded once per session start, never rewritten in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Encoded role token.
    pub user_type: String,
    /// Remaining backend fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-user client state with an explicit lifecycle.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use marketplace_client::domain::ports::SilentNotifier;
/// use marketplace_client::domain::{
///     Affordance, FavoriteKind, PersistentStore, Session, SessionRole, StoredUser,
///     encode_role_token,
/// };
/// use marketplace_client::outbound::storage::MemoryKeyValueStore;
/// use mockable::DefaultClock;
///
/// let store = PersistentStore::new(
///     Arc::new(MemoryKeyValueStore::default()),
///     Arc::new(SilentNotifier),
/// );
/// let mut session = Session::start(store, Arc::new(DefaultClock));
/// assert!(session.role().is_none());
///
/// let user = StoredUser {
///     name: "Ada".to_owned(),
///     email: "ada@example.test".to_owned(),
///     user_type: encode_role_token("SELLER", "s4lt"),
///     extra: Default::default(),
/// };
/// session.sign_in("bearer-token", user);
/// assert_eq!(session.role(), Some(SessionRole::Seller));
/// assert!(session.permits(Affordance::ManageListings(FavoriteKind::House)));
/// ```
pub struct Session {
    token: Option<Zeroizing<String>>,
    user: Option<StoredUser>,
    role: Option<SessionRole>,
    favorites: FavoritesManager,
    store: PersistentStore,
}

impl Session {
    /// Restore credentials and favorites from `store`.
    pub fn start(store: PersistentStore, clock: Arc<dyn Clock>) -> Self {
        let token = store
            .load_raw(StorageKey::Token)
            .filter(|token| !token.trim().is_empty())
            .map(Zeroizing::new);
        let user: Option<StoredUser> = store.load(StorageKey::User);
        let role = user.as_ref().and_then(decode_user_role);
        let favorites = FavoritesManager::load(store.clone(), clock);
        Self {
            token,
            user,
            role,
            favorites,
            store,
        }
    }

    /// Record a successful login and persist its credentials.
    ///
    /// Returns the decoded role, if the token names a known one.
    pub fn sign_in(&mut self, token: &str, user: StoredUser) -> Option<SessionRole> {
        self.store.save_raw(StorageKey::Token, token);
        self.store.save(StorageKey::User, &user);
        self.role = decode_user_role(&user);
        self.token = Some(Zeroizing::new(token.to_owned()));
        self.user = Some(user);
        info!(role = ?self.role, "session signed in");
        self.role
    }

    /// End the session, forgetting persisted credentials.
    ///
    /// Local favorites stay on the device.
    pub fn logout(self) {
        let token_removed = self.store.remove(StorageKey::Token);
        let user_removed = self.store.remove(StorageKey::User);
        if token_removed && user_removed {
            info!("session logged out");
        } else {
            warn!(
                token_removed,
                user_removed,
                "session logged out but credentials remain on the device"
            );
        }
    }

    /// Decoded role, if signed in with a recognised role token.
    pub fn role(&self) -> Option<SessionRole> {
        self.role
    }

    /// Persisted user object, if any.
    pub fn user(&self) -> Option<&StoredUser> {
        self.user.as_ref()
    }

    /// Bearer token for backend calls.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.as_str())
    }

    /// Whether a bearer token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the current user may use `affordance`.
    ///
    /// Without a recognised role only local favorites are available.
    pub fn permits(&self, affordance: Affordance) -> bool {
        match self.role {
            Some(role) => role.permits(affordance),
            None => matches!(affordance, Affordance::Favorite(_)),
        }
    }

    /// Whether the current user may favorite listings of `kind`.
    pub fn can_favorite(&self, kind: FavoriteKind) -> bool {
        self.permits(Affordance::Favorite(kind))
    }

    /// Favorites manager owned by this session.
    pub fn favorites(&self) -> &FavoritesManager {
        &self.favorites
    }

    /// Mutable access to the favorites manager.
    pub fn favorites_mut(&mut self) -> &mut FavoritesManager {
        &mut self.favorites
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("role", &self.role)
            .field("favorites", &self.favorites)
            .finish_non_exhaustive()
    }
}

fn decode_user_role(user: &StoredUser) -> Option<SessionRole> {
    match SessionRole::from_token(&user.user_type) {
        Ok(role) => Some(role),
        Err(error) => {
            warn!(error = %error, "stored user has no recognised role");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        KeyValueStore, KeyValueStoreError, MockKeyValueStore, NoticeLevel, SilentNotifier,
    };
    use crate::domain::{EntityId, HouseSnapshot, Listing, encode_role_token};
    use crate::outbound::notices::NoticeQueue;
    use crate::outbound::storage::MemoryKeyValueStore;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[test]
    fn logout_that_cannot_forget_credentials_is_reported() {
        let mut medium = MockKeyValueStore::new();
        medium.expect_get().returning(|_| Ok(None));
        medium
            .expect_remove()
            .times(2)
            .returning(|key| Err(KeyValueStoreError::write(key, "read-only medium")));
        let notices = Arc::new(NoticeQueue::default());
        let session = Session::start(
            PersistentStore::new(Arc::new(medium), notices.clone()),
            Arc::new(DefaultClock),
        );

        session.logout();

        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|notice| notice.level == NoticeLevel::Warning));
    }

    #[fixture]
    fn memory() -> Arc<MemoryKeyValueStore> {
        Arc::new(MemoryKeyValueStore::default())
    }

    fn start(memory: &Arc<MemoryKeyValueStore>) -> Session {
        let store = PersistentStore::new(memory.clone(), Arc::new(SilentNotifier));
        Session::start(store, Arc::new(DefaultClock))
    }

    fn user(role_token: String) -> StoredUser {
        StoredUser {
            name: "Grace".to_owned(),
            email: "grace@example.test".to_owned(),
            user_type: role_token,
            extra: Map::new(),
        }
    }

    #[rstest]
    fn anonymous_session_only_permits_favorites(memory: Arc<MemoryKeyValueStore>) {
        let session = start(&memory);
        assert!(!session.is_authenticated());
        assert!(session.can_favorite(FavoriteKind::House));
        assert!(!session.permits(Affordance::AdminDashboard));
        assert!(!session.permits(Affordance::ManageListings(FavoriteKind::Job)));
    }

    #[rstest]
    fn role_is_decoded_from_persisted_user(memory: Arc<MemoryKeyValueStore>) {
        let raw_user = json!({
            "id": 17,
            "name": "Grace",
            "email": "grace@example.test",
            "user_type": encode_role_token("ADMIN", "q1")
        });
        memory
            .set("user", &raw_user.to_string())
            .expect("memory write");
        memory.set("token", "abc").expect("memory write");

        let session = start(&memory);
        assert_eq!(session.role(), Some(SessionRole::Admin));
        assert_eq!(session.bearer_token(), Some("abc"));
        assert_eq!(
            session.user().and_then(|user| user.extra.get("id")),
            Some(&json!(17))
        );
        assert!(session.permits(Affordance::AdminDashboard));
    }

    #[rstest]
    fn legacy_plaintext_role_still_decodes(memory: Arc<MemoryKeyValueStore>) {
        let mut session = start(&memory);
        let role = session.sign_in("abc", user("EMPLOYEE".to_owned()));
        assert_eq!(role, Some(SessionRole::Employee));
    }

    #[rstest]
    fn unknown_role_leaves_session_unprivileged(memory: Arc<MemoryKeyValueStore>) {
        let mut session = start(&memory);
        let role = session.sign_in("abc", user(encode_role_token("GUEST", "q1")));
        assert_eq!(role, None);
        assert!(session.is_authenticated());
        assert!(!session.permits(Affordance::AdminDashboard));
    }

    #[rstest]
    fn sign_in_persists_credentials_for_next_start(memory: Arc<MemoryKeyValueStore>) {
        let mut session = start(&memory);
        session.sign_in("abc", user(encode_role_token("BUYER", "q1")));
        drop(session);

        let restored = start(&memory);
        assert_eq!(restored.role(), Some(SessionRole::Buyer));
        assert_eq!(restored.bearer_token(), Some("abc"));
    }

    #[rstest]
    fn logout_forgets_credentials_but_keeps_favorites(memory: Arc<MemoryKeyValueStore>) {
        let mut session = start(&memory);
        session.sign_in("abc", user(encode_role_token("BUYER", "q1")));
        let id = EntityId::new("h1").expect("id");
        session
            .favorites_mut()
            .add(&Listing::house(id.clone(), HouseSnapshot::default()));
        session.logout();

        let restored = start(&memory);
        assert!(!restored.is_authenticated());
        assert!(restored.role().is_none());
        assert!(restored.favorites().is_favorite(&id, FavoriteKind::House));
    }
}
