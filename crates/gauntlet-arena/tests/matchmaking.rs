//! Integration tests for the matchmaking queue.

use std::collections::HashSet;

use gauntlet_arena::{MatchLauncher, MatchPair, MatchmakerConfig, MatchmakerHandle, QueueEntry};
use gauntlet_hub::{HubConfig, HubHandle, OutboundReceiver};
use gauntlet_protocol::ParticipantId;
use gauntlet_transport::ConnectionId;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

// =========================================================================
// Helpers
// =========================================================================

/// Launcher that hands every formed pair back to the test.
struct RecordingLauncher(mpsc::UnboundedSender<MatchPair>);

impl MatchLauncher for RecordingLauncher {
    fn launch(&self, pair: MatchPair) {
        let _ = self.0.send(pair);
    }
}

struct Fixture {
    hub: HubHandle,
    queue: MatchmakerHandle,
    pairs: mpsc::UnboundedReceiver<MatchPair>,
}

impl Fixture {
    fn new() -> Self {
        let hub = HubHandle::spawn(HubConfig {
            snapshot_rate_hz: 0,
            ..HubConfig::default()
        });
        let (tx, pairs) = mpsc::unbounded_channel();
        let queue =
            MatchmakerHandle::spawn(MatchmakerConfig::default(), hub.clone(), RecordingLauncher(tx));
        Self { hub, queue, pairs }
    }

    async fn connect(&self, id: u64, participant: &str) -> OutboundReceiver {
        self.hub
            .register(ConnectionId::new(id), ParticipantId::new(participant))
            .await
            .unwrap()
    }

    async fn join(&self, id: u64, participant: &str, wager: u64) {
        self.queue
            .enqueue(QueueEntry {
                conn: ConnectionId::new(id),
                participant: ParticipantId::new(participant),
                wager,
            })
            .await
            .unwrap();
    }

    /// Returns once the queue has processed every earlier command.
    async fn settle_queue(&self) {
        let sentinel = ConnectionId::new(u64::MAX);
        let mut rx = self
            .hub
            .register(sentinel, ParticipantId::new("sentinel"))
            .await
            .unwrap();
        self.queue.leave(sentinel).await.unwrap();
        assert_eq!(next_type(&mut rx).await, "QUEUE_LEFT");
        self.hub.unregister(sentinel).await.unwrap();
    }
}

async fn next_type(rx: &mut OutboundReceiver) -> String {
    let frame = rx.recv().await.expect("frame expected");
    let value: Value = serde_json::from_slice(&frame).unwrap();
    value["type"].as_str().unwrap().to_string()
}

// =========================================================================
// Pairing
// =========================================================================

#[tokio::test]
async fn test_two_joins_form_one_pair() {
    let mut f = Fixture::new();
    let _a = f.connect(1, "alice").await;
    let _b = f.connect(2, "bob").await;

    f.join(1, "alice", 100).await;
    f.join(2, "bob", 100).await;

    let pair = f.pairs.recv().await.unwrap();
    assert_eq!(pair.player_a.conn, ConnectionId::new(1));
    assert_eq!(pair.player_b.conn, ConnectionId::new(2));
    assert_eq!(pair.wager, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_pair_each_connection_once() {
    const N: u64 = 21;
    let mut f = Fixture::new();
    let mut receivers = Vec::new();
    for id in 1..=N {
        receivers.push(f.connect(id, &format!("p{id}")).await);
    }

    let mut joins = JoinSet::new();
    for id in 1..=N {
        let queue = f.queue.clone();
        joins.spawn(async move {
            queue
                .enqueue(QueueEntry {
                    conn: ConnectionId::new(id),
                    participant: ParticipantId::new(format!("p{id}")),
                    wager: 100,
                })
                .await
        });
    }
    while let Some(joined) = joins.join_next().await {
        joined.unwrap().unwrap();
    }
    f.settle_queue().await;

    let mut pairs = Vec::new();
    while let Ok(pair) = f.pairs.try_recv() {
        pairs.push(pair);
    }
    assert_eq!(pairs.len() as u64, N / 2);

    let mut seen = HashSet::new();
    for pair in &pairs {
        assert_ne!(pair.player_a.conn, pair.player_b.conn, "self-pair");
        assert!(seen.insert(pair.player_a.conn), "paired twice");
        assert!(seen.insert(pair.player_b.conn), "paired twice");
    }
}

#[tokio::test]
async fn test_pair_uses_smaller_wager() {
    let mut f = Fixture::new();
    let _a = f.connect(1, "alice").await;
    let _b = f.connect(2, "bob").await;

    f.join(1, "alice", 100).await;
    f.join(2, "bob", 60).await;

    assert_eq!(f.pairs.recv().await.unwrap().wager, 60);
}

#[tokio::test]
async fn test_duplicate_join_from_same_connection_is_ignored() {
    let mut f = Fixture::new();
    let _a = f.connect(1, "alice").await;
    let _b = f.connect(2, "bob").await;

    f.join(1, "alice", 100).await;
    f.join(1, "alice", 100).await;
    f.settle_queue().await;
    assert!(f.pairs.try_recv().is_err(), "connection paired with itself");

    f.join(2, "bob", 100).await;
    let pair = f.pairs.recv().await.unwrap();
    assert_eq!(pair.player_a.conn, ConnectionId::new(1));
    assert_eq!(pair.player_b.conn, ConnectionId::new(2));
}

#[tokio::test]
async fn test_disconnected_waiter_is_replaced() {
    let mut f = Fixture::new();
    let _stale = f.connect(1, "ghost").await;
    let _b = f.connect(2, "bob").await;
    let _c = f.connect(3, "carol").await;

    f.join(1, "ghost", 100).await;
    f.hub.unregister(ConnectionId::new(1)).await.unwrap();

    f.join(2, "bob", 100).await;
    f.settle_queue().await;
    assert!(f.pairs.try_recv().is_err(), "paired with a departed connection");

    f.join(3, "carol", 100).await;
    let pair = f.pairs.recv().await.unwrap();
    assert_eq!(pair.player_a.participant, ParticipantId::new("bob"));
    assert_eq!(pair.player_b.participant, ParticipantId::new("carol"));
}

#[tokio::test]
async fn test_leave_clears_waiting_entry() {
    let mut f = Fixture::new();
    let mut a = f.connect(1, "alice").await;
    let _b = f.connect(2, "bob").await;
    let _c = f.connect(3, "carol").await;

    f.join(1, "alice", 100).await;
    f.queue.leave(ConnectionId::new(1)).await.unwrap();

    assert_eq!(next_type(&mut a).await, "QUEUE_JOINED");
    assert_eq!(next_type(&mut a).await, "QUEUE_LEFT");

    f.join(2, "bob", 100).await;
    f.join(3, "carol", 100).await;
    let pair = f.pairs.recv().await.unwrap();
    assert_eq!(pair.player_a.conn, ConnectionId::new(2));
    assert_eq!(pair.player_b.conn, ConnectionId::new(3));
}

#[tokio::test]
async fn test_leave_when_not_queued_still_acknowledges() {
    let f = Fixture::new();
    let mut a = f.connect(1, "alice").await;

    f.queue.leave(ConnectionId::new(1)).await.unwrap();
    assert_eq!(next_type(&mut a).await, "QUEUE_LEFT");
}

// =========================================================================
// Notifications
// =========================================================================

#[tokio::test]
async fn test_joined_precedes_match_found() {
    let mut f = Fixture::new();
    let mut a = f.connect(1, "alice").await;
    let mut b = f.connect(2, "bob").await;

    f.join(1, "alice", 100).await;
    f.join(2, "bob", 100).await;
    let pair = f.pairs.recv().await.unwrap();

    assert_eq!(next_type(&mut a).await, "QUEUE_JOINED");
    assert_eq!(next_type(&mut b).await, "QUEUE_JOINED");

    for rx in [&mut a, &mut b] {
        let frame = rx.recv().await.unwrap();
        let found: Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(found["type"], "MATCH_FOUND");
        assert_eq!(found["matchId"], pair.match_id.to_string());
        assert_eq!(found["wagerAmount"], 100);
    }
}
