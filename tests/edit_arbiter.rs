mod support;

use std::time::Duration;

use uuid::Uuid;

use docs_core::application::errors::DocsError;
use docs_core::application::ports::cache_port::CachePort;
use docs_core::application::ports::collaboration_port::RoomConnections;
use docs_core::application::services::edit_arbiter::{EditArbiter, lock_key};

use support::{MemCache, MemCollab, World};

fn arbiter<'a>(
    collab: &'a MemCollab,
    cache: &'a MemCache,
    ttl: Duration,
) -> EditArbiter<'a, MemCollab, MemCache> {
    EditArbiter {
        collaboration: collab,
        cache,
        lock_ttl: ttl,
    }
}

#[tokio::test]
async fn empty_room_first_writer_takes_the_lock() {
    // Empty room: S1 edits then S2 is refused, S1 edits
    // again within the TTL.
    let w = World::new();
    let doc = Uuid::new_v4();
    let arb = arbiter(w.collab.as_ref(), w.cache.as_ref(), Duration::from_secs(60));

    arb.check(doc, "s1", false).await.unwrap();
    assert_eq!(
        w.cache.get(&lock_key(doc)).await.unwrap().as_deref(),
        Some("s1")
    );

    let err = arb.check(doc, "s2", false).await.unwrap_err();
    assert!(matches!(err, DocsError::PermissionDenied(_)));

    arb.check(doc, "s1", false).await.unwrap();
}

#[tokio::test]
async fn lock_expires_after_ttl() {
    let w = World::new();
    let doc = Uuid::new_v4();
    let arb = arbiter(
        w.collab.as_ref(),
        w.cache.as_ref(),
        Duration::from_millis(20),
    );

    arb.check(doc, "s1", false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    arb.check(doc, "s2", false).await.unwrap();
}

#[tokio::test]
async fn room_participant_edits_freely() {
    let w = World::new();
    let doc = Uuid::new_v4();
    w.collab
        .set_connections(Some(RoomConnections {
            count: 2,
            exists: true,
        }))
        .await;
    let arb = arbiter(w.collab.as_ref(), w.cache.as_ref(), Duration::from_secs(60));
    arb.check(doc, "s1", false).await.unwrap();
    // No advisory lock taken for realtime participants.
    assert!(w.cache.get(&lock_key(doc)).await.unwrap().is_none());
}

#[tokio::test]
async fn non_participant_is_refused_while_room_is_live() {
    let w = World::new();
    let doc = Uuid::new_v4();
    w.collab
        .set_connections(Some(RoomConnections {
            count: 3,
            exists: false,
        }))
        .await;
    let arb = arbiter(w.collab.as_ref(), w.cache.as_ref(), Duration::from_secs(60));
    let err = arb.check(doc, "outsider", false).await.unwrap_err();
    assert!(matches!(err, DocsError::PermissionDenied(_)));
}

#[tokio::test]
async fn collaboration_failure_falls_back_to_the_lock() {
    let w = World::new();
    let doc = Uuid::new_v4();
    w.collab.set_connections(None).await;
    let arb = arbiter(w.collab.as_ref(), w.cache.as_ref(), Duration::from_secs(60));

    arb.check(doc, "s1", false).await.unwrap();
    let err = arb.check(doc, "s2", false).await.unwrap_err();
    assert!(matches!(err, DocsError::PermissionDenied(_)));
}

#[tokio::test]
async fn declared_websocket_clients_bypass_the_arbiter() {
    let w = World::new();
    let doc = Uuid::new_v4();
    w.collab
        .set_connections(Some(RoomConnections {
            count: 5,
            exists: false,
        }))
        .await;
    let arb = arbiter(w.collab.as_ref(), w.cache.as_ref(), Duration::from_secs(60));
    arb.check(doc, "anyone", true).await.unwrap();
}
