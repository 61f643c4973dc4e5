//! Domain primitives, ports, and services.
//!
//! Purpose: Define the favorites model and the services that keep it in
//! step with local persistence and the backend, plus the session context and
//! role gating consulted by the UI. Types document their invariants and serde
//! contracts in their own Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure with a stable code.
//! - FavoriteEntry / FavoritesSet / Listing: the favorites model.
//! - PersistentStore: fail-soft JSON persistence over a key-value port.
//! - FavoritesManager: in-memory authority with write-through persistence.
//! - FavoritesSync: optimistic toggle and reconciliation with the backend.
//! - Session / SessionRole / Affordance: session lifecycle and role gating.

pub mod error;
pub mod favorites;
pub mod favorites_manager;
pub mod favorites_sync;
pub mod persistent_store;
pub mod ports;
pub mod role;
pub mod session;

pub use self::error::{Error, ErrorCode};
pub use self::favorites::{
    EntityId, EntityIdValidationError, EntitySnapshot, FavoriteEntry, FavoriteEntryDecodeError,
    FavoriteKind, FavoritesSet, HouseSnapshot, JobSnapshot, Listing, ParseFavoriteKindError,
};
pub use self::favorites_manager::FavoritesManager;
pub use self::favorites_sync::{DEFAULT_REMOTE_TIMEOUT, FavoritesSync, ReconcileOutcome};
pub use self::persistent_store::{PersistentStore, StorageKey};
pub use self::role::{
    Affordance, ParseSessionRoleError, SessionRole, decode_role_token, encode_role_token,
};
pub use self::session::{Session, StoredUser};
