//! Tests for the optimistic favorites sync service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockRemoteFavorites, NoticeLevel, SilentNotifier};
use crate::domain::{EntityId, ErrorCode, HouseSnapshot, JobSnapshot, PersistentStore};
use crate::outbound::notices::NoticeQueue;
use crate::outbound::storage::MemoryKeyValueStore;

fn id(raw: &str) -> EntityId {
    EntityId::new(raw).expect("fixture id")
}

fn house(raw: &str) -> Listing {
    Listing::house(
        id(raw),
        HouseSnapshot {
            title: format!("Flat {raw}"),
            price: 1200.0,
            ..HouseSnapshot::default()
        },
    )
}

fn job(raw: &str) -> Listing {
    Listing::job(
        id(raw),
        JobSnapshot {
            title: "Baker".to_owned(),
            ..JobSnapshot::default()
        },
    )
}

fn entry(listing: Listing) -> FavoriteEntry {
    FavoriteEntry::new(listing, None)
}

#[fixture]
fn manager() -> FavoritesManager {
    let store = PersistentStore::new(
        Arc::new(MemoryKeyValueStore::default()),
        Arc::new(SilentNotifier),
    );
    FavoritesManager::load(store, Arc::new(DefaultClock))
}

fn sync_over(
    remote: MockRemoteFavorites,
) -> (FavoritesSync<MockRemoteFavorites>, Arc<NoticeQueue>) {
    let notices = Arc::new(NoticeQueue::default());
    let sync = FavoritesSync::new(Arc::new(remote), notices.clone());
    (sync, notices)
}

/// Remote that never answers within any reasonable test timeout.
struct StalledRemote;

#[async_trait]
impl RemoteFavorites for StalledRemote {
    async fn fetch_favorites(
        &self,
        _kind: FavoriteKind,
    ) -> Result<Vec<FavoriteEntry>, RemoteFavoritesError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }

    async fn toggle(&self, _id: &EntityId, _kind: FavoriteKind) -> Result<bool, RemoteFavoritesError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(true)
    }
}

#[rstest]
#[tokio::test]
async fn toggle_flips_membership_when_remote_agrees(mut manager: FavoritesManager) {
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_toggle()
        .with(eq(id("h1")), eq(FavoriteKind::House))
        .times(1)
        .returning(|_, _| Ok(true));
    let (sync, notices) = sync_over(remote);

    let favorited = sync
        .toggle(&mut manager, &house("h1"))
        .await
        .expect("toggle succeeds");

    assert!(favorited);
    assert!(manager.is_favorite(&id("h1"), FavoriteKind::House));
    assert!(notices.drain().is_empty());
}

#[rstest]
#[tokio::test]
async fn toggle_removes_an_existing_favorite(mut manager: FavoritesManager) {
    manager.add(&job("j1"));
    let mut remote = MockRemoteFavorites::new();
    remote.expect_toggle().times(1).returning(|_, _| Ok(false));
    let (sync, _) = sync_over(remote);

    let favorited = sync
        .toggle(&mut manager, &job("j1"))
        .await
        .expect("toggle succeeds");

    assert!(!favorited);
    assert!(!manager.is_favorite(&id("j1"), FavoriteKind::Job));
}

#[rstest]
#[tokio::test]
async fn toggle_adopts_backend_state_when_it_disagrees(mut manager: FavoritesManager) {
    let mut remote = MockRemoteFavorites::new();
    remote.expect_toggle().times(1).returning(|_, _| Ok(false));
    let (sync, notices) = sync_over(remote);

    let favorited = sync
        .toggle(&mut manager, &house("h1"))
        .await
        .expect("toggle succeeds");

    assert!(!favorited);
    assert!(!manager.is_favorite(&id("h1"), FavoriteKind::House));
    let drained = notices.drain();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].level, NoticeLevel::Info);
    assert!(drained[0].message.contains("not saved"));
}

#[rstest]
#[tokio::test]
async fn toggle_failure_keeps_local_change_and_notifies(mut manager: FavoritesManager) {
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_toggle()
        .times(1)
        .returning(|_, _| Err(RemoteFavoritesError::rejected(500_u16, "database offline")));
    let (sync, notices) = sync_over(remote);

    let error = sync
        .toggle(&mut manager, &house("h1"))
        .await
        .expect_err("toggle fails");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(error.message(), "database offline");
    assert!(manager.is_favorite(&id("h1"), FavoriteKind::House));
    let drained = notices.drain();
    assert_eq!(drained.len(), 1);
    assert!(drained[0].message.contains("database offline"));
}

#[rstest]
#[case::server_error(RemoteFavoritesError::rejected(500_u16, ""), ErrorCode::ServiceUnavailable)]
#[case::not_found(RemoteFavoritesError::rejected(404_u16, "  "), ErrorCode::NotFound)]
#[case::transport(RemoteFavoritesError::transport(""), ErrorCode::ServiceUnavailable)]
#[tokio::test]
async fn toggle_failure_without_a_message_uses_the_operation_text(
    mut manager: FavoritesManager,
    #[case] failure: RemoteFavoritesError,
    #[case] expected: ErrorCode,
) {
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_toggle()
        .times(1)
        .returning(move |_, _| Err(failure.clone()));
    let (sync, notices) = sync_over(remote);

    let error = sync
        .toggle(&mut manager, &house("h1"))
        .await
        .expect_err("toggle fails");

    assert_eq!(error.code(), expected);
    assert_eq!(error.message(), "Failed to update favorite");
    assert!(manager.is_favorite(&id("h1"), FavoriteKind::House));
    assert!(notices.drain()[0].message.ends_with("Failed to update favorite"));
}

#[rstest]
#[tokio::test]
async fn fetch_and_reconcile_survive_a_blank_backend_message(mut manager: FavoritesManager) {
    manager.add(&house("h1"));
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_fetch_favorites()
        .times(2)
        .returning(|_| Err(RemoteFavoritesError::rejected(503_u16, "")));
    let (sync, notices) = sync_over(remote);

    let error = sync
        .fetch_favorites(FavoriteKind::House)
        .await
        .expect_err("fetch fails");
    assert_eq!(error.message(), "Failed to load favorites");

    let outcome = sync.reconcile(&mut manager, FavoriteKind::House).await;
    assert_eq!(outcome, ReconcileOutcome::Stale);
    assert!(manager.is_favorite(&id("h1"), FavoriteKind::House));
    assert_eq!(notices.drain().len(), 1);
}

#[rstest]
#[tokio::test]
async fn toggle_times_out_as_recoverable_error(mut manager: FavoritesManager) {
    let notices = Arc::new(NoticeQueue::default());
    let sync = FavoritesSync::new(Arc::new(StalledRemote), notices.clone())
        .with_timeout(Duration::from_millis(20));

    let error = sync
        .toggle(&mut manager, &job("j1"))
        .await
        .expect_err("toggle times out");

    assert_eq!(error.code(), ErrorCode::Timeout);
    assert!(manager.is_favorite(&id("j1"), FavoriteKind::Job));
    assert_eq!(notices.drain().len(), 1);
}

#[rstest]
#[case(401, ErrorCode::Unauthorized)]
#[case(403, ErrorCode::Forbidden)]
#[case(404, ErrorCode::NotFound)]
#[case(422, ErrorCode::InvalidRequest)]
#[case(503, ErrorCode::ServiceUnavailable)]
fn rejected_statuses_map_to_error_codes(#[case] status: u16, #[case] expected: ErrorCode) {
    let error = map_remote_error(RemoteFavoritesError::rejected(status, "nope"), "Failed to load favorites");
    assert_eq!(error.code(), expected);
    assert_eq!(
        error.details(),
        Some(&serde_json::json!({ "status": status }))
    );
}

#[tokio::test]
async fn malformed_fetch_payload_yields_no_favorites() {
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_fetch_favorites()
        .returning(|_| Err(RemoteFavoritesError::decode("expected array")));
    let (sync, _) = sync_over(remote);

    let entries = sync
        .fetch_favorites(FavoriteKind::House)
        .await
        .expect("decode failures are absorbed");
    assert!(entries.is_empty());
}

#[tokio::test]
async fn transport_failures_surface_from_fetch() {
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_fetch_favorites()
        .returning(|_| Err(RemoteFavoritesError::transport("connection refused")));
    let (sync, _) = sync_over(remote);

    let error = sync
        .fetch_favorites(FavoriteKind::Job)
        .await
        .expect_err("transport failure surfaces");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn reconcile_replaces_local_collection(mut manager: FavoritesManager) {
    manager.add(&house("h-local"));
    manager.add(&job("j1"));
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_fetch_favorites()
        .with(eq(FavoriteKind::House))
        .returning(|_| Ok(vec![entry(house("h1")), entry(house("h2")), entry(house("h1"))]));
    let (sync, _) = sync_over(remote);

    let outcome = sync.reconcile(&mut manager, FavoriteKind::House).await;

    assert_eq!(outcome, ReconcileOutcome::Reconciled { count: 2 });
    assert!(!manager.is_favorite(&id("h-local"), FavoriteKind::House));
    assert!(manager.is_favorite(&id("h2"), FavoriteKind::House));
    assert!(manager.is_favorite(&id("j1"), FavoriteKind::Job));
}

#[rstest]
#[tokio::test]
async fn reconcile_failure_keeps_stale_collection(mut manager: FavoritesManager) {
    manager.add(&house("h1"));
    let mut remote = MockRemoteFavorites::new();
    remote
        .expect_fetch_favorites()
        .returning(|_| Err(RemoteFavoritesError::decode("unexpected token")));
    let (sync, notices) = sync_over(remote);

    let outcome = sync.reconcile(&mut manager, FavoriteKind::House).await;

    assert_eq!(outcome, ReconcileOutcome::Stale);
    assert!(manager.is_favorite(&id("h1"), FavoriteKind::House));
    assert_eq!(notices.drain().len(), 1);
}
