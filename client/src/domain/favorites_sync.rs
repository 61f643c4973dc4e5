//! Optimistic synchronisation between local favorites and the backend.
//!
//! Local state always changes first and is never rolled back by a remote
//! failure: the next reconciliation brings it back in line with the server.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::ports::{Notice, Notifier, RemoteFavorites, RemoteFavoritesError};
use crate::domain::{Error, FavoriteEntry, FavoriteKind, FavoritesManager, Listing};

/// Upper bound on a single remote call when none is configured.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

const TOGGLE_FAILED: &str = "Failed to update favorite";
const FETCH_FAILED: &str = "Failed to load favorites";

/// Result of [`FavoritesSync::reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The local collection now mirrors the backend.
    Reconciled {
        /// Entries held after reconciliation.
        count: usize,
    },
    /// The backend could not be read; the local collection was kept.
    Stale,
}

/// Domain service bridging a [`FavoritesManager`] to a [`RemoteFavorites`]
/// port.
#[derive(Clone)]
pub struct FavoritesSync<R> {
    remote: Arc<R>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl<R> FavoritesSync<R> {
    /// Create a sync service with the default remote timeout.
    pub fn new(remote: Arc<R>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            remote,
            notifier,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Override the bound applied to each remote call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound applied to each remote call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<R> FavoritesSync<R>
where
    R: RemoteFavorites,
{
    /// Flip membership of `listing` locally, then confirm with the backend.
    ///
    /// Returns the membership the backend reports. When it disagrees with
    /// the optimistic local value the backend wins. On failure the local
    /// change stays, a warning notice is pushed, and the error is returned.
    pub async fn toggle(
        &self,
        favorites: &mut FavoritesManager,
        listing: &Listing,
    ) -> Result<bool, Error> {
        let kind = listing.kind();
        let favorited = if favorites.is_favorite(&listing.id, kind) {
            favorites.remove(&listing.id, kind);
            false
        } else {
            favorites.add(listing);
            true
        };

        let confirmed = match tokio::time::timeout(
            self.timeout,
            self.remote.toggle(&listing.id, kind),
        )
        .await
        {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(error)) => {
                return Err(self.report_toggle_failure(map_remote_error(error, TOGGLE_FAILED)));
            }
            Err(_) => return Err(self.report_toggle_failure(self.timeout_error())),
        };

        if confirmed != favorited {
            debug!(id = %listing.id, kind = %kind, confirmed, "adopting backend favorite state");
            let state = if confirmed {
                favorites.add(listing);
                "saved"
            } else {
                favorites.remove(&listing.id, kind);
                "not saved"
            };
            self.notifier.notify(Notice::info(format!(
                "The server reports this {kind} as {state}; your favorites were updated to match."
            )));
        }
        Ok(confirmed)
    }

    /// List the backend's favorites of `kind`.
    ///
    /// A malformed payload is treated as "no favorites".
    pub async fn fetch_favorites(&self, kind: FavoriteKind) -> Result<Vec<FavoriteEntry>, Error> {
        match self.fetch_remote(kind).await {
            Ok(entries) => Ok(entries),
            Err(FetchFailure::Remote(RemoteFavoritesError::Decode { message })) => {
                warn!(kind = %kind, error = %message, "malformed favorites payload ignored");
                Ok(Vec::new())
            }
            Err(FetchFailure::Remote(error)) => Err(map_remote_error(error, FETCH_FAILED)),
            Err(FetchFailure::Elapsed) => Err(self.timeout_error()),
        }
    }

    /// Replace the local collection of `kind` with the backend's.
    ///
    /// Any failure keeps the stale local collection and notifies.
    pub async fn reconcile(
        &self,
        favorites: &mut FavoritesManager,
        kind: FavoriteKind,
    ) -> ReconcileOutcome {
        let error = match self.fetch_remote(kind).await {
            Ok(entries) => {
                favorites.replace(kind, entries);
                let count = favorites.entries(kind).len();
                debug!(kind = %kind, count, "favorites reconciled");
                return ReconcileOutcome::Reconciled { count };
            }
            Err(FetchFailure::Remote(error)) => map_remote_error(error, FETCH_FAILED),
            Err(FetchFailure::Elapsed) => self.timeout_error(),
        };

        warn!(kind = %kind, code = ?error.code(), error = %error, "favorites reconciliation failed");
        self.notifier.notify(Notice::warning(format!(
            "Saved {kind}s could not be refreshed from the server; showing the copy on this device."
        )));
        ReconcileOutcome::Stale
    }

    async fn fetch_remote(&self, kind: FavoriteKind) -> Result<Vec<FavoriteEntry>, FetchFailure> {
        tokio::time::timeout(self.timeout, self.remote.fetch_favorites(kind))
            .await
            .map_err(|_| FetchFailure::Elapsed)?
            .map_err(FetchFailure::Remote)
    }

    fn report_toggle_failure(&self, error: Error) -> Error {
        warn!(code = ?error.code(), error = %error, "remote favorite toggle failed");
        self.notifier.notify(Notice::warning(format!(
            "Your change is saved on this device but the server did not confirm it: {}",
            error.message()
        )));
        error
    }

    fn timeout_error(&self) -> Error {
        Error::timeout(format!(
            "favorites backend did not answer within {} ms",
            self.timeout.as_millis()
        ))
    }
}

enum FetchFailure {
    Remote(RemoteFavoritesError),
    Elapsed,
}

/// Map a port failure to a domain error. `fallback` replaces a blank
/// backend message.
fn map_remote_error(error: RemoteFavoritesError, fallback: &str) -> Error {
    let describe = |message: String| {
        if message.trim().is_empty() {
            fallback.to_owned()
        } else {
            message
        }
    };
    match error {
        RemoteFavoritesError::Transport { message } => Error::service_unavailable(describe(message)),
        RemoteFavoritesError::Timeout { message } => Error::timeout(describe(message)),
        RemoteFavoritesError::Unauthorized { message } => Error::unauthorized(describe(message)),
        RemoteFavoritesError::Rejected { status, message } => {
            let message = describe(message);
            let error = match status {
                401 => Error::unauthorized(message),
                403 => Error::forbidden(message),
                404 => Error::not_found(message),
                400..=499 => Error::invalid_request(message),
                _ => Error::service_unavailable(message),
            };
            error.with_details(serde_json::json!({ "status": status }))
        }
        RemoteFavoritesError::Decode { message } => Error::internal(format!(
            "{fallback}: the server sent data this app cannot read ({})",
            describe(message)
        )),
    }
}

#[cfg(test)]
#[path = "favorites_sync_tests.rs"]
mod tests;
