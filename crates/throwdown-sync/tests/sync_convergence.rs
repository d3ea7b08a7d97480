//! End-to-end convergence tests: two season stores replicating through a
//! shared in-memory backend.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use throwdown_store::{MemoryStore, SeasonStore};
use throwdown_sync::{DocumentBackend, MemoryBackend, SyncClient, SyncStatus};
use throwdown_types::{ActivityKind, PlayerId, SeasonDocument};

const CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Opt-in log output: `RUST_LOG=debug cargo test -- --nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn open_store() -> Arc<SeasonStore> {
    init_tracing();
    Arc::new(SeasonStore::open(Box::new(MemoryStore::new())).expect("store open"))
}

/// Poll a store until its document satisfies the predicate, or time out.
async fn wait_for(store: &SeasonStore, pred: impl Fn(&SeasonDocument) -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + CONVERGENCE_TIMEOUT;
    loop {
        if pred(&store.document()) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn points_of(doc: &SeasonDocument, player: &PlayerId) -> u32 {
    doc.player(player).map_or(0, |p| p.points)
}

#[tokio::test]
async fn local_edit_converges_to_connected_peer() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
    let store_a = open_store();
    let store_b = open_store();
    let client_a = SyncClient::new(Arc::clone(&store_a), Arc::clone(&backend));
    let client_b = SyncClient::new(Arc::clone(&store_b), Arc::clone(&backend));

    client_a.connect("gym", "{}").await.expect("connect a");
    client_b.connect("gym", "{}").await.expect("connect b");

    let p1 = PlayerId::new("p1");
    let granted = store_a
        .log_activity(&p1, ActivityKind::Workout, 1, "leg day")
        .expect("log");
    assert_eq!(granted, 20);

    let converged = wait_for(&store_b, |doc| points_of(doc, &p1) == 20).await;
    assert!(converged, "peer never saw the workout");

    client_a.disconnect();
    client_b.disconnect();
}

#[tokio::test]
async fn late_joiner_catches_up_from_the_room_snapshot() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
    let store_a = open_store();
    let client_a = SyncClient::new(Arc::clone(&store_a), Arc::clone(&backend));
    client_a.connect("late", "{}").await.expect("connect a");

    let p2 = PlayerId::new("p2");
    store_a
        .record_weigh_in(&p2, Decimal::from(195), Utc::now())
        .expect("weigh in");
    store_a
        .append_chat("Friend", "new total logged")
        .expect("chat");

    // Wait out the debounce so the room snapshot carries both edits.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let store_b = open_store();
    let client_b = SyncClient::new(Arc::clone(&store_b), Arc::clone(&backend));
    client_b.connect("late", "{}").await.expect("connect b");

    let converged = wait_for(&store_b, |doc| {
        doc.chat.len() == 1 && doc.player(&p2).is_some_and(|p| p.current_weight.is_some())
    })
    .await;
    assert!(converged, "late joiner never caught up");

    client_a.disconnect();
    client_b.disconnect();
}

#[tokio::test]
async fn sequential_edits_from_both_devices_accumulate() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
    let store_a = open_store();
    let store_b = open_store();
    let client_a = SyncClient::new(Arc::clone(&store_a), Arc::clone(&backend));
    let client_b = SyncClient::new(Arc::clone(&store_b), Arc::clone(&backend));

    client_a.connect("relay", "{}").await.expect("connect a");
    client_b.connect("relay", "{}").await.expect("connect b");

    let p1 = PlayerId::new("p1");
    let p2 = PlayerId::new("p2");

    store_a
        .log_activity(&p1, ActivityKind::Workout, 1, "")
        .expect("log a");
    assert!(wait_for(&store_b, |doc| points_of(doc, &p1) == 20).await);

    // The second edit builds on the replicated state, so nothing is lost.
    store_b
        .log_activity(&p2, ActivityKind::Steps5k, 1, "")
        .expect("log b");
    let converged = wait_for(&store_a, |doc| {
        points_of(doc, &p1) == 20 && points_of(doc, &p2) == 10
    })
    .await;
    assert!(converged, "edits did not accumulate across devices");

    client_a.disconnect();
    client_b.disconnect();
}

#[tokio::test]
async fn offline_edits_reach_an_established_room_on_connect() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
    let store_a = open_store();
    let client_a = SyncClient::new(Arc::clone(&store_a), Arc::clone(&backend));

    // Device A establishes the room, then goes away.
    client_a.connect("cabin", "{}").await.expect("connect a");
    client_a.disconnect();

    // Device B edits while offline: its document is now strictly newer
    // than the room snapshot.
    let store_b = open_store();
    let p1 = PlayerId::new("p1");
    store_b
        .log_activity(&p1, ActivityKind::Workout, 1, "offline leg day")
        .expect("offline log");

    // Connecting pushes B's newer state into the room, and the older room
    // snapshot must not clobber B's local document.
    let client_b = SyncClient::new(Arc::clone(&store_b), Arc::clone(&backend));
    client_b.connect("cabin", "{}").await.expect("connect b");
    assert_eq!(points_of(&store_b.document(), &p1), 20);

    // A comes back and converges onto B's offline edit.
    client_a.connect("cabin", "{}").await.expect("reconnect a");
    let converged = wait_for(&store_a, |doc| points_of(doc, &p1) == 20).await;
    assert!(converged, "offline edit never reached the room");

    client_a.disconnect();
    client_b.disconnect();
}

#[tokio::test]
async fn self_echo_does_not_inflate_the_version() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
    let store = open_store();
    let client = SyncClient::new(Arc::clone(&store), Arc::clone(&backend));
    client.connect("solo", "{}").await.expect("connect");

    let p1 = PlayerId::new("p1");
    store
        .log_activity(&p1, ActivityKind::PersonalRecord, 1, "new deadlift PR")
        .expect("log");
    let version_after_edit = store.document().meta.version;

    // Well past the debounce: the push happens, the echo comes back, and
    // the local document must not move.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(store.document().meta.version, version_after_edit);
    assert_eq!(client.status(), SyncStatus::Connected);

    client.disconnect();
}

#[tokio::test]
async fn disconnected_peer_stops_receiving_updates() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
    let store_a = open_store();
    let store_b = open_store();
    let client_a = SyncClient::new(Arc::clone(&store_a), Arc::clone(&backend));
    let client_b = SyncClient::new(Arc::clone(&store_b), Arc::clone(&backend));

    client_a.connect("drop", "{}").await.expect("connect a");
    client_b.connect("drop", "{}").await.expect("connect b");

    let p1 = PlayerId::new("p1");
    store_a
        .log_activity(&p1, ActivityKind::Workout, 1, "")
        .expect("log 1");
    assert!(wait_for(&store_b, |doc| points_of(doc, &p1) == 20).await);

    client_b.disconnect();
    store_a
        .log_activity(&p1, ActivityKind::Workout, 1, "")
        .expect("log 2");

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(points_of(&store_b.document(), &p1), 20);

    client_a.disconnect();
}
