//! Match record queries against the in-memory store.

use std::time::SystemTime;

use gauntlet_protocol::{FightScript, FighterInfo, MatchId, ParticipantId, Side};
use gauntlet_store::{Currency, MatchRecord, MatchStatus, MemoryStore, Store, StoreError};

fn fighter(id: &str) -> FighterInfo {
    FighterInfo {
        id: ParticipantId::new(id),
        username: id.to_string(),
        character: "fighter".into(),
        skin: "default".into(),
    }
}

fn record(a: &str, b: &str, status: MatchStatus) -> MatchRecord {
    let id = MatchId::new();
    MatchRecord {
        id,
        player_a: ParticipantId::new(a),
        player_b: ParticipantId::new(b),
        wager_amount: 100,
        currency: Currency::Sol,
        server_seed: "seed".into(),
        server_seed_hashed: "hash".into(),
        client_seed_a: String::new(),
        client_seed_b: String::new(),
        nonce: 0,
        winner_id: Some(ParticipantId::new(a)),
        status,
        fight_script: FightScript {
            match_id: id,
            player_a: fighter(a),
            player_b: fighter(b),
            winner: Side::PlayerA,
            duration: 10.0,
            events: Vec::new(),
        },
        created_at: SystemTime::now(),
        finished_at: Some(SystemTime::now()),
    }
}

#[tokio::test]
async fn test_find_match_by_id() {
    let store = MemoryStore::new();
    let rec = record("alice", "bob", MatchStatus::Completed);
    let id = rec.id;
    store.create_match_record(rec.clone()).await.unwrap();

    assert_eq!(store.find_match(id).await.unwrap(), Some(rec));
    assert_eq!(store.find_match(MatchId::new()).await.unwrap(), None);
}

#[tokio::test]
async fn test_duplicate_match_id_is_rejected() {
    let store = MemoryStore::new();
    let rec = record("alice", "bob", MatchStatus::Completed);
    store.create_match_record(rec.clone()).await.unwrap();

    let err = store.create_match_record(rec).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateMatch(_)));
    assert_eq!(store.match_count().await, 1);
}

#[tokio::test]
async fn test_history_is_newest_first_and_filtered() {
    let store = MemoryStore::new();
    let first = record("alice", "bob", MatchStatus::Completed);
    let other = record("carol", "dave", MatchStatus::Completed);
    let second = record("bob", "alice", MatchStatus::Completed);
    for rec in [first.clone(), other, second.clone()] {
        store.create_match_record(rec).await.unwrap();
    }

    let history = store
        .match_history(&ParticipantId::new("alice"), 10)
        .await
        .unwrap();
    let ids: Vec<_> = history.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let limited = store
        .match_history(&ParticipantId::new("alice"), 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, second.id);
}

#[tokio::test]
async fn test_recent_matches_skips_unfinished() {
    let store = MemoryStore::new();
    let done = record("alice", "bob", MatchStatus::Completed);
    let cancelled = record("carol", "dave", MatchStatus::Cancelled);
    store.create_match_record(done.clone()).await.unwrap();
    store.create_match_record(cancelled).await.unwrap();

    let recent = store.recent_matches(20).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, done.id);
}
