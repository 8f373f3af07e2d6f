//! Integration tests for the hub actor.

use std::time::Duration;

use gauntlet_hub::{HubConfig, HubError, HubHandle, OutboundReceiver};
use gauntlet_protocol::{ParticipantId, ServerMessage};
use gauntlet_transport::ConnectionId;
use serde_json::Value;

// =========================================================================
// Helpers
// =========================================================================

fn no_snapshots() -> HubConfig {
    HubConfig {
        snapshot_rate_hz: 0,
        ..HubConfig::default()
    }
}

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id)
}

async fn next_json(rx: &mut OutboundReceiver) -> Value {
    let frame = rx.recv().await.expect("frame expected");
    serde_json::from_slice(&frame).expect("frame should be JSON")
}

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_register_and_deliver() {
    let hub = HubHandle::spawn(no_snapshots());
    let mut rx = hub.register(conn(1), pid("alice")).await.unwrap();

    hub.send(conn(1), &ServerMessage::Pong).await.unwrap();

    assert_eq!(next_json(&mut rx).await["type"], "PONG");
    assert!(hub.is_connected(conn(1)).await);
}

#[tokio::test]
async fn test_duplicate_connection_id_is_rejected() {
    let hub = HubHandle::spawn(no_snapshots());
    let _rx = hub.register(conn(1), pid("alice")).await.unwrap();

    let err = hub.register(conn(1), pid("alice")).await.unwrap_err();
    assert!(matches!(err, HubError::AlreadyRegistered(c) if c == conn(1)));
}

#[tokio::test]
async fn test_same_participant_may_hold_two_connections() {
    let hub = HubHandle::spawn(no_snapshots());
    let _a = hub.register(conn(1), pid("alice")).await.unwrap();
    let _b = hub.register(conn(2), pid("alice")).await.unwrap();

    assert_eq!(hub.stats().await.unwrap().connections, 2);
}

#[tokio::test]
async fn test_unregister_closes_queue_and_is_idempotent() {
    let hub = HubHandle::spawn(no_snapshots());
    let mut rx = hub.register(conn(1), pid("alice")).await.unwrap();

    hub.unregister(conn(1)).await.unwrap();
    hub.unregister(conn(1)).await.unwrap();

    assert!(rx.recv().await.is_none(), "queue should be closed");
    assert!(!hub.is_connected(conn(1)).await);
    assert_eq!(hub.stats().await.unwrap().connections, 0);
}

#[tokio::test]
async fn test_send_to_departed_connection_is_dropped() {
    let hub = HubHandle::spawn(no_snapshots());
    hub.send(conn(99), &ServerMessage::QueueJoined).await.unwrap();
    assert!(!hub.is_connected(conn(99)).await);
}

// =========================================================================
// Broadcast and backpressure
// =========================================================================

#[tokio::test]
async fn test_broadcast_reaches_everyone() {
    let hub = HubHandle::spawn(no_snapshots());
    let mut a = hub.register(conn(1), pid("alice")).await.unwrap();
    let mut b = hub.register(conn(2), pid("bob")).await.unwrap();

    hub.broadcast(&ServerMessage::Pong).await.unwrap();

    assert_eq!(next_json(&mut a).await["type"], "PONG");
    assert_eq!(next_json(&mut b).await["type"], "PONG");
}

#[tokio::test]
async fn test_full_buffer_force_unregisters() {
    let hub = HubHandle::spawn(HubConfig {
        snapshot_rate_hz: 0,
        outbound_buffer: 1,
        ..HubConfig::default()
    });
    let mut slow = hub.register(conn(1), pid("slow")).await.unwrap();
    let mut fast = hub.register(conn(2), pid("fast")).await.unwrap();

    hub.broadcast(&ServerMessage::QueueJoined).await.unwrap();
    assert_eq!(next_json(&mut fast).await["type"], "QUEUE_JOINED");

    // `slow` never drained its first frame.
    hub.broadcast(&ServerMessage::Pong).await.unwrap();
    assert_eq!(next_json(&mut fast).await["type"], "PONG");

    assert!(!hub.is_connected(conn(1)).await);
    assert!(hub.is_connected(conn(2)).await);

    // The frame that fit is still delivered, then the queue ends.
    assert_eq!(next_json(&mut slow).await["type"], "QUEUE_JOINED");
    assert!(slow.recv().await.is_none());
}

#[tokio::test]
async fn test_dropped_receiver_is_cleaned_up_on_next_delivery() {
    let hub = HubHandle::spawn(no_snapshots());
    let rx = hub.register(conn(1), pid("alice")).await.unwrap();
    drop(rx);

    hub.send(conn(1), &ServerMessage::Pong).await.unwrap();
    assert!(!hub.is_connected(conn(1)).await);
}

// =========================================================================
// Lobby snapshots
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_snapshot_goes_to_lobby_members_only() {
    let hub = HubHandle::spawn(HubConfig::default());
    let mut lobby = hub.register(conn(1), pid("alice")).await.unwrap();
    let mut outside = hub.register(conn(2), pid("bob")).await.unwrap();

    hub.enter_lobby(conn(1), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let snapshot = next_json(&mut lobby).await;
    assert_eq!(snapshot["type"], "LOBBY_SNAPSHOT");
    let players = snapshot["payload"]["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["id"], "alice");
    assert_eq!(players[0]["x"], 400.0);
    assert_eq!(players[0]["y"], 300.0);
    assert_eq!(players[0]["character"], "fighter");

    assert!(outside.try_recv().is_err(), "non-lobby connection got a snapshot");
}

#[tokio::test(start_paused = true)]
async fn test_no_snapshot_when_lobby_is_empty() {
    let hub = HubHandle::spawn(HubConfig::default());
    let mut rx = hub.register(conn(1), pid("alice")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_lobby_move_updates_given_axes() {
    let hub = HubHandle::spawn(HubConfig::default());
    let mut rx = hub.register(conn(1), pid("alice")).await.unwrap();

    hub.enter_lobby(conn(1), Some("ninja".into())).await.unwrap();
    hub.move_in_lobby(conn(1), Some(10.0), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let snapshot = next_json(&mut rx).await;
    let player = &snapshot["payload"]["players"][0];
    assert_eq!(player["x"], 10.0);
    assert_eq!(player["y"], 300.0);
    assert_eq!(player["character"], "ninja");
    assert_eq!(hub.stats().await.unwrap().in_lobby, 1);
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_repeat_at_ten_hz() {
    let hub = HubHandle::spawn(HubConfig::default());
    let mut rx = hub.register(conn(1), pid("alice")).await.unwrap();
    hub.enter_lobby(conn(1), None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1050)).await;

    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    assert_eq!(count, 10);
}
