//! Port for the backend favorites API.
//!
//! The adapter is responsible for absorbing backend inconsistency: records
//! arrive with partial or missing fields and must already be mapped into
//! well-formed [`FavoriteEntry`] values when they cross this port.

use async_trait::async_trait;

use crate::domain::{EntityId, FavoriteEntry, FavoriteKind};

use super::define_port_error;

define_port_error! {
    /// Errors raised by remote favorites adapters.
    pub enum RemoteFavoritesError {
        /// Connection, TLS, or body transfer failed.
        Transport { message: String } =>
            "favorites backend transport failed: {message}",
        /// The backend did not answer in time.
        Timeout { message: String } =>
            "favorites backend timed out: {message}",
        /// The backend rejected the bearer token or none was supplied.
        Unauthorized { message: String } =>
            "favorites backend rejected credentials: {message}",
        /// The backend answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "favorites backend returned {status}: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "favorites backend payload invalid: {message}",
    }
}

/// Port for reading and toggling favorites on the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteFavorites: Send + Sync {
    /// List every favorite of `kind` held by the backend for this user.
    ///
    /// Records whose nested entity is absent are excluded rather than
    /// returned half-filled.
    async fn fetch_favorites(
        &self,
        kind: FavoriteKind,
    ) -> Result<Vec<FavoriteEntry>, RemoteFavoritesError>;

    /// Flip membership of `(id, kind)` on the backend and return whether the
    /// entity is favorited afterwards.
    async fn toggle(&self, id: &EntityId, kind: FavoriteKind) -> Result<bool, RemoteFavoritesError>;
}
