//! Game Flow Integration Tests
//!
//! Tests for full game flows between two sessions sharing one store:
//! - Selection and commit rules
//! - Local moves reaching the other client
//! - Captures and the capture tally
//! - Turn gate
//! - Failure handling without rollback

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use board_engine::{Archetype, BoardState, Color, Coordinate, EngineError, PieceId};
use camelchess::core::SessionSettings;
use camelchess::game::{BoardEvent, GameError, GameSession, MovePhase, NoticeLevel, SelectOutcome};
use camelchess::networking::{
    DocumentKey, DocumentStore, DocumentWatch, MemoryStore, RoomId, StoreError, StoreResult, SyncError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;

async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

fn piece(color: Color, archetype: Archetype, slot: u8) -> PieceId {
    PieceId::new(color, archetype, slot).unwrap()
}

fn drain(events: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn warnings(events: &[BoardEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            BoardEvent::Notice(notice) if notice.level == NoticeLevel::Warning => {
                Some(notice.message.clone())
            }
            _ => None,
        })
        .collect()
}

/// Selects `piece` and commits it to `destination`
async fn play(session: &mut GameSession, piece: PieceId, destination: Coordinate) {
    session.select(piece).unwrap();
    session.choose(destination).await.unwrap();
}

/// White creates `room`, black joins it
async fn paired(store: &Arc<MemoryStore>, room: &str, settings: SessionSettings) -> (GameSession, GameSession) {
    let mut white = GameSession::new(store.clone(), settings.clone());
    let mut black = GameSession::new(store.clone(), settings);
    white.create_room(room).await.unwrap();
    black.join_room(room).await.unwrap();
    (white, black)
}

/// Store where another writer slips in while one chosen field is being written
struct RacingStore {
    inner: Arc<MemoryStore>,
    /// (field that triggers the race, foreign field, foreign value)
    race: Mutex<Option<(String, String, Value)>>,
}

impl RacingStore {
    fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            race: Mutex::new(None),
        }
    }

    fn race_on(&self, trigger: &str, foreign: &str, value: Value) {
        *self.race.lock() = Some((trigger.to_string(), foreign.to_string(), value));
    }
}

#[async_trait]
impl DocumentStore for RacingStore {
    async fn get(&self, key: &DocumentKey) -> StoreResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &DocumentKey, document: Value) -> StoreResult<()> {
        self.inner.set(key, document).await
    }

    async fn update(&self, key: &DocumentKey, path: &str, value: Value) -> StoreResult<()> {
        let race = {
            let mut race = self.race.lock();
            let triggered = matches!(race.as_ref(), Some((trigger, _, _)) if trigger == path);
            if triggered {
                race.take()
            } else {
                None
            }
        };
        if let Some((_, foreign, foreign_value)) = race {
            self.inner.update(key, &foreign, foreign_value).await?;
            // both subscriptions see the foreign write before ours lands
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        self.inner.update(key, path, value).await
    }

    fn watch(&self, key: &DocumentKey) -> StoreResult<DocumentWatch> {
        self.inner.watch(key)
    }
}

fn solo() -> GameSession {
    GameSession::new(Arc::new(MemoryStore::new()), SessionSettings::default())
}

// ============================================================================
// Selection Tests
// ============================================================================

#[tokio::test]
async fn test_select_exposes_candidates() {
    let mut session = solo();
    let mut events = session.events();
    let king = piece(Color::White, Archetype::King, 1);

    let outcome = session.select(king).unwrap();

    let SelectOutcome::Selected(candidates) = outcome else {
        panic!("king should be selected");
    };
    assert_eq!(candidates.len(), 5);
    assert!(matches!(drain(&mut events).as_slice(), [BoardEvent::Selected { .. }]));
}

#[tokio::test]
async fn test_select_same_piece_twice_deselects() {
    let mut session = solo();
    let king = piece(Color::White, Archetype::King, 1);

    session.select(king).unwrap();
    let outcome = session.select(king).unwrap();

    assert_eq!(outcome, SelectOutcome::Deselected);
    assert_eq!(session.selection().phase(), &MovePhase::Idle);
}

#[tokio::test]
async fn test_choose_without_selection() {
    let mut session = solo();

    let err = session.choose(Coordinate::new(5, 0)).await.unwrap_err();

    assert_eq!(err, GameError::NoSelection);
}

// ============================================================================
// Rejection Tests
// ============================================================================

#[tokio::test]
async fn test_blocked_move_keeps_selection() {
    //! Rook (7,0) to (5,0) passes over its own pawn at (6,0)
    let mut session = solo();
    let mut events = session.events();
    let rook = piece(Color::White, Archetype::Rook, 1);
    session.select(rook).unwrap();

    let err = session.choose(Coordinate::new(5, 0)).await.unwrap_err();

    assert_eq!(
        err,
        GameError::Rejected(EngineError::PathBlocked {
            from: Coordinate::new(7, 0),
            to: Coordinate::new(5, 0),
        })
    );
    assert_eq!(session.selection().selected(), Some(rook));
    assert_eq!(session.board(), BoardState::initial());
    assert_eq!(warnings(&drain(&mut events)).len(), 1);
}

#[tokio::test]
async fn test_own_capture_rejected() {
    let mut session = solo();
    let rook = piece(Color::White, Archetype::Rook, 1);
    let pawn = piece(Color::White, Archetype::Pawn, 1);
    session.select(rook).unwrap();

    let err = session.choose(Coordinate::new(6, 0)).await.unwrap_err();

    assert_eq!(
        err,
        GameError::Rejected(EngineError::OwnPieceCapture {
            mover: rook,
            target: pawn,
        })
    );
    assert_eq!(session.board().position_of(pawn), Some(Coordinate::new(6, 0)));
    assert!(session.selection().is_selected());
}

#[tokio::test]
async fn test_non_candidate_rejected() {
    let mut session = solo();
    let king = piece(Color::White, Archetype::King, 1);
    session.select(king).unwrap();

    let err = session.choose(Coordinate::new(4, 4)).await.unwrap_err();

    assert!(matches!(err, GameError::Rejected(EngineError::NotACandidate { .. })));
    assert_eq!(session.selection().selected(), Some(king));
}

// ============================================================================
// Local Commit Without Sync Tests
// ============================================================================

#[tokio::test]
async fn test_move_without_room_applies_locally() {
    let mut session = solo();
    let mut events = session.events();
    let pawn = piece(Color::White, Archetype::Pawn, 1);
    session.select(pawn).unwrap();

    let report = session.choose(Coordinate::new(5, 0)).await.unwrap();

    assert_eq!(report.sync_error, Some(SyncError::NoRoom));
    assert_eq!(session.board().position_of(pawn), Some(Coordinate::new(5, 0)));
    assert_eq!(session.selection().phase(), &MovePhase::Idle);
    assert_eq!(warnings(&drain(&mut events)).last().map(String::as_str), Some("You are not in a room"));
}

#[tokio::test]
async fn test_offline_store_does_not_roll_back() {
    let store = Arc::new(MemoryStore::new());
    let mut session = GameSession::new(store.clone(), SessionSettings::default());
    session.create_room("lobby").await.unwrap();
    let pawn = piece(Color::White, Archetype::Pawn, 2);

    store.set_online(false);
    session.select(pawn).unwrap();
    let report = session.choose(Coordinate::new(5, 1)).await.unwrap();

    assert_eq!(
        report.sync_error,
        Some(SyncError::Push {
            piece: pawn,
            source: StoreError::Unavailable,
        })
    );
    assert!(!report.is_synced());
    assert_eq!(session.board().position_of(pawn), Some(Coordinate::new(5, 1)));
}

#[tokio::test]
async fn test_blank_room_is_refused() {
    let mut session = solo();
    let mut events = session.events();

    let err = session.join_room("   ").await.unwrap_err();

    assert_eq!(err, GameError::Sync(SyncError::NoRoom));
    assert!(session.room().is_none());
    assert_eq!(warnings(&drain(&mut events)), vec!["You are not in a room".to_string()]);
}

// ============================================================================
// Two Client Tests
// ============================================================================

#[tokio::test]
async fn test_move_reaches_opponent() {
    let store = Arc::new(MemoryStore::new());
    let (mut white, black) = paired(&store, "lobby", SessionSettings::default()).await;
    let pawn = piece(Color::White, Archetype::Pawn, 5);

    play(&mut white, pawn, Coordinate::new(5, 4)).await;

    assert!(wait_until(|| black.board().position_of(pawn) == Some(Coordinate::new(5, 4))).await);
    assert_eq!(white.board(), black.board());
}

#[tokio::test]
async fn test_capture_reaches_opponent_and_tallies_once() {
    let store = Arc::new(MemoryStore::new());
    let (mut white, mut black) = paired(&store, "lobby", SessionSettings::default()).await;
    let white_pawn = piece(Color::White, Archetype::Pawn, 5);
    let black_pawn = piece(Color::Black, Archetype::Pawn, 4);

    play(&mut white, white_pawn, Coordinate::new(5, 4)).await;
    assert!(wait_until(|| black.board() == white.board()).await);
    play(&mut black, black_pawn, Coordinate::new(2, 3)).await;
    assert!(wait_until(|| black.board() == white.board()).await);
    play(&mut white, white_pawn, Coordinate::new(4, 4)).await;
    assert!(wait_until(|| black.board() == white.board()).await);
    play(&mut black, black_pawn, Coordinate::new(3, 3)).await;
    assert!(wait_until(|| black.board() == white.board()).await);

    let mut black_events = black.events();
    white.select(white_pawn).unwrap();
    let report = white.choose(Coordinate::new(3, 3)).await.unwrap();
    assert_eq!(report.outcome.captured, Some(black_pawn));
    assert!(report.is_synced());

    assert!(wait_until(|| black.board().position_of(white_pawn) == Some(Coordinate::new(3, 3))).await);
    assert_eq!(black.board().position_of(black_pawn), None);
    assert_eq!(white.board(), black.board());

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(white.captured().white_captured, vec![Archetype::Pawn]);
    assert_eq!(black.captured().white_captured, vec![Archetype::Pawn]);
    assert_eq!(white.captured().total(), 1);
    assert!(drain(&mut black_events)
        .iter()
        .any(|event| *event == BoardEvent::Captured { piece: black_pawn }));
}

#[tokio::test]
async fn test_foreign_write_during_capture_push_still_converges() {
    //! While the capture sentinel is in flight, someone else writes the
    //! mover's field. The mover's own write lands last, so every board and
    //! the store must end with it.
    let store = Arc::new(RacingStore::new());
    let mut white = GameSession::new(store.clone(), SessionSettings::default());
    let mut black = GameSession::new(store.clone(), SessionSettings::default());
    white.create_room("lobby").await.unwrap();
    black.join_room("lobby").await.unwrap();
    let white_pawn = piece(Color::White, Archetype::Pawn, 5);
    let black_pawn = piece(Color::Black, Archetype::Pawn, 4);

    play(&mut white, white_pawn, Coordinate::new(5, 4)).await;
    play(&mut black, black_pawn, Coordinate::new(2, 3)).await;
    play(&mut white, white_pawn, Coordinate::new(4, 4)).await;
    play(&mut black, black_pawn, Coordinate::new(3, 3)).await;
    assert!(wait_until(|| black.board() == white.board()).await);

    store.race_on(
        "playerPosition.blackPawn4",
        "playerPosition.pawn5",
        json!({ "x": 3, "y": 4 }),
    );
    play(&mut white, white_pawn, Coordinate::new(3, 3)).await;

    let landed = Some(Coordinate::new(3, 3));
    assert!(
        wait_until(|| white.board().position_of(white_pawn) == landed
            && black.board().position_of(white_pawn) == landed)
        .await,
        "clients should converge on the last write: white {:?}, black {:?}",
        white.board().position_of(white_pawn),
        black.board().position_of(white_pawn)
    );
    assert_eq!(white.board(), black.board());

    let key = RoomId::parse("lobby").unwrap().data_key();
    let document = store.get(&key).await.unwrap().unwrap();
    assert_eq!(document["playerPosition"]["pawn5"], json!({ "x": 3, "y": 3 }));
    assert_eq!(document["playerPosition"]["blackPawn4"], json!({ "x": -1, "y": -1 }));
}

#[tokio::test]
async fn test_remote_capture_of_selected_piece_blocks_commit() {
    let store = Arc::new(MemoryStore::new());
    let (mut white, _black) = paired(&store, "lobby", SessionSettings::default()).await;
    let pawn = piece(Color::White, Archetype::Pawn, 5);
    white.select(pawn).unwrap();

    let key = RoomId::parse("lobby").unwrap().data_key();
    store
        .update(&key, "playerPosition.pawn5", json!({ "x": -1, "y": -1 }))
        .await
        .unwrap();
    assert!(wait_until(|| white.board().position_of(pawn).is_none()).await);

    let err = white.choose(Coordinate::new(5, 4)).await.unwrap_err();

    assert_eq!(err, GameError::Rejected(EngineError::PieceNotOnBoard { piece: pawn }));
    assert_eq!(white.board().len(), 31);
}

#[tokio::test]
async fn test_disjoint_remote_moves_both_merge() {
    let store = Arc::new(MemoryStore::new());
    let (mut white, black) = paired(&store, "lobby", SessionSettings::default()).await;
    let first = piece(Color::White, Archetype::Pawn, 1);
    let second = piece(Color::White, Archetype::Horse, 2);

    play(&mut white, first, Coordinate::new(5, 0)).await;
    play(&mut white, second, Coordinate::new(5, 7)).await;

    assert!(wait_until(|| black.board() == white.board()).await);
    assert_eq!(black.board().position_of(second), Some(Coordinate::new(5, 7)));
}

#[tokio::test]
async fn test_leave_room_stops_merging() {
    let store = Arc::new(MemoryStore::new());
    let (mut white, mut black) = paired(&store, "lobby", SessionSettings::default()).await;
    let key = RoomId::parse("lobby").unwrap().data_key();
    assert!(wait_until(|| store.subscriber_count(&key) == 2).await);

    black.leave_room();
    assert!(wait_until(|| store.subscriber_count(&key) == 1).await);
    play(&mut white, piece(Color::White, Archetype::Pawn, 3), Coordinate::new(5, 2)).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(black.board(), BoardState::initial());
    assert!(black.room().is_none());
}

#[tokio::test]
async fn test_room_switch_keeps_one_subscription() {
    let store = Arc::new(MemoryStore::new());
    let mut session = GameSession::new(store.clone(), SessionSettings::default());
    let first = RoomId::parse("first").unwrap().data_key();
    let second = RoomId::parse("second").unwrap().data_key();

    session.create_room("first").await.unwrap();
    session.create_room("second").await.unwrap();
    session.join_room("first").await.unwrap();

    assert!(wait_until(|| store.subscriber_count(&first) == 1).await);
    assert!(wait_until(|| store.subscriber_count(&second) == 0).await);
    assert_eq!(session.room().map(RoomId::as_str), Some("first"));
}

#[tokio::test]
async fn test_failed_room_creation_leaves_previous_room() {
    //! The reset board must not keep listening to the old room
    let store = Arc::new(MemoryStore::new());
    let mut session = GameSession::new(store.clone(), SessionSettings::default());
    let first = RoomId::parse("first").unwrap().data_key();
    session.create_room("first").await.unwrap();

    store.set_online(false);
    let err = session.create_room("second").await.unwrap_err();
    store.set_online(true);

    assert_eq!(err, GameError::Sync(SyncError::Store(StoreError::Unavailable)));
    assert!(session.room().is_none());
    assert!(wait_until(|| store.subscriber_count(&first) == 0).await);

    store
        .update(&first, "playerPosition.pawn1", json!({ "x": 5, "y": 0 }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(session.board(), BoardState::initial());
}

// ============================================================================
// Turn Gate Tests
// ============================================================================

#[tokio::test]
async fn test_turn_gate_rejects_out_of_turn_selection() {
    let settings = SessionSettings {
        enforce_turns: true,
        ..Default::default()
    };
    let mut session = GameSession::new(Arc::new(MemoryStore::new()), settings);
    let black_pawn = piece(Color::Black, Archetype::Pawn, 1);
    let white_pawn = piece(Color::White, Archetype::Pawn, 1);

    let err = session.select(black_pawn).unwrap_err();
    assert_eq!(
        err,
        GameError::OutOfTurn {
            piece: black_pawn,
            expected: Color::White,
        }
    );

    session.select(white_pawn).unwrap();
    session.choose(Coordinate::new(5, 0)).await.unwrap();
    assert_eq!(session.next_to_move(), Color::Black);

    assert!(matches!(
        session.select(white_pawn),
        Err(GameError::OutOfTurn { expected: Color::Black, .. })
    ));
    assert!(session.select(black_pawn).is_ok());
}

#[tokio::test]
async fn test_remote_move_hands_over_the_turn() {
    let settings = SessionSettings {
        enforce_turns: true,
        ..Default::default()
    };
    let store = Arc::new(MemoryStore::new());
    let (mut white, mut black) = paired(&store, "lobby", settings).await;

    play(&mut white, piece(Color::White, Archetype::Pawn, 4), Coordinate::new(5, 3)).await;
    assert!(wait_until(|| black.next_to_move() == Color::Black).await);

    play(&mut black, piece(Color::Black, Archetype::Pawn, 4), Coordinate::new(2, 3)).await;
    assert!(wait_until(|| white.next_to_move() == Color::White).await);
}
