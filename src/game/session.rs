//! Game session: the single owner of a client's board
//!
//! Two paths mutate the board:
//!
//! 1. **Local commits** through [`GameSession::select`] and
//!    [`GameSession::choose`], driven by player input.
//! 2. **Remote merges** from the room subscription task.
//!
//! Board, capture tally and turn gate live together in one
//! `parking_lot::Mutex` cell. A commit (validate, capture, place) and a merge
//! each run start to finish under that lock, so neither can interleave with
//! the other. Store writes happen after the lock is released and never roll
//! the local board back.
//!
//! Each room join bumps an epoch stored in the cell. A merge carrying an old
//! epoch (a snapshot from the previous room that raced the switch) is
//! dropped.
//!
//! A commit records its outgoing writes as pending in the same critical
//! section that mutates the board. Locks are always taken pending writes
//! first, then the cell, which is the order the subscription task uses.
//!
//! The first snapshot after a join is the room's whole history, not a move,
//! so it never changes whose turn it is. With the turn gate on, a client
//! joining mid-game keeps its own idea of the next color until the next
//! remote move.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use board_engine::{apply_move, BoardState, Color, Coordinate, EngineError, MoveOutcome, PieceId};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::captured::CapturedPieces;
use super::error::{GameError, GameResult};
use super::events::{BoardEvent, Notice};
use super::selection::{SelectOutcome, Selection};
use super::turn::TurnGate;
use crate::core::SessionSettings;
use crate::networking::{DocumentStore, RemoteChange, RoomId, SyncBridge, SyncError};

/// State shared between the session and its subscription task
#[derive(Debug)]
struct BoardCell {
    board: BoardState,
    captured: CapturedPieces,
    turn: TurnGate,
    epoch: u64,
}

type SharedCell = Arc<Mutex<BoardCell>>;

/// Result of a committed local move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    /// First push failure, if any; the move stays applied locally regardless
    pub sync_error: Option<SyncError>,
}

impl MoveReport {
    pub fn is_synced(&self) -> bool {
        self.sync_error.is_none()
    }
}

pub struct GameSession {
    settings: SessionSettings,
    cell: SharedCell,
    selection: Selection,
    bridge: SyncBridge,
    events: broadcast::Sender<BoardEvent>,
}

impl GameSession {
    /// New session on the starting layout, not yet in a room
    pub fn new(store: Arc<dyn DocumentStore>, settings: SessionSettings) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        let cell = BoardCell {
            board: BoardState::initial(),
            captured: CapturedPieces::default(),
            turn: TurnGate::new(settings.enforce_turns),
            epoch: 0,
        };

        Self {
            settings,
            cell: Arc::new(Mutex::new(cell)),
            selection: Selection::default(),
            bridge: SyncBridge::new(store),
            events,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Receiver for board events emitted from now on
    pub fn events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Copy of the current board
    pub fn board(&self) -> BoardState {
        self.cell.lock().board.clone()
    }

    pub fn captured(&self) -> CapturedPieces {
        self.cell.lock().captured.clone()
    }

    pub fn next_to_move(&self) -> Color {
        self.cell.lock().turn.next_to_move()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.bridge.room()
    }

    /// Creates a room: resets to the starting layout, writes it as the room
    /// document and joins the room
    pub async fn create_room(&mut self, room: &str) -> GameResult<()> {
        let room = self.parse_room(room)?;
        self.leave_room();

        {
            let mut cell = self.cell.lock();
            cell.board = BoardState::initial();
            cell.captured.clear();
            cell.turn = TurnGate::new(self.settings.enforce_turns);
        }
        self.selection.clear();

        let board = self.board();
        if let Err(err) = self.bridge.seed_room(&room, &board).await {
            return Err(self.sync_failure(err));
        }
        self.subscribe(room).await
    }

    /// Joins an existing room; the room document's positions are merged once
    /// the first snapshot arrives
    pub async fn join_room(&mut self, room: &str) -> GameResult<()> {
        let room = self.parse_room(room)?;
        self.subscribe(room).await
    }

    /// Stops listening to the current room; the local board is kept
    pub fn leave_room(&mut self) {
        self.cell.lock().epoch += 1;
        self.bridge.unsubscribe();
    }

    /// Selects `piece`, or deselects it if it is already selected
    pub fn select(&mut self, piece: PieceId) -> GameResult<SelectOutcome> {
        let result = {
            let cell = self.cell.lock();
            if self.selection.selected() != Some(piece) && !cell.turn.permits(piece.color) {
                Err(GameError::OutOfTurn {
                    piece,
                    expected: cell.turn.next_to_move(),
                })
            } else {
                self.selection.toggle(piece, &cell.board).map_err(GameError::from)
            }
        };

        match result {
            Ok(SelectOutcome::Selected(candidates)) => {
                debug!("[MOVE] Selected {} with {} candidate(s)", piece, candidates.len());
                self.emit(BoardEvent::Selected {
                    piece,
                    candidates: candidates.clone(),
                });
                Ok(SelectOutcome::Selected(candidates))
            }
            Ok(SelectOutcome::Deselected) => {
                self.emit(BoardEvent::Deselected);
                Ok(SelectOutcome::Deselected)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Moves the selected piece to `destination`
    ///
    /// Rejections keep the selection and leave the board untouched. On
    /// success the selection is cleared, the capture (if any) is pushed as
    /// the sentinel and then the mover's new square is pushed.
    pub async fn choose(&mut self, destination: Coordinate) -> GameResult<MoveReport> {
        let Some(piece) = self.selection.selected() else {
            return Err(self.reject(GameError::NoSelection));
        };

        if !self.selection.candidates().contains(&destination) {
            let err = EngineError::NotACandidate {
                piece,
                square: destination,
            };
            return Err(self.reject(err.into()));
        }

        let in_room = self.bridge.room().is_some();
        let committed = {
            let mut pending = self.bridge.pending().lock();
            let mut guard = self.cell.lock();
            let cell = &mut *guard;
            if !cell.turn.permits(piece.color) {
                Err(GameError::OutOfTurn {
                    piece,
                    expected: cell.turn.next_to_move(),
                })
            } else {
                apply_move(piece, destination, &mut cell.board)
                    .map(|outcome| {
                        if let Some(captured) = outcome.captured {
                            cell.captured.add_capture(captured);
                        }
                        cell.turn.record_move(piece.color);
                        if in_room {
                            for (piece, square) in outcome_writes(&outcome) {
                                pending.record(piece, square);
                            }
                        }
                        outcome
                    })
                    .map_err(GameError::from)
            }
        };

        let outcome = match committed {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.reject(err)),
        };

        self.selection.clear();
        info!(
            "[MOVE] {} {} -> {}{}",
            piece,
            outcome.from,
            outcome.to,
            if outcome.captured.is_some() { " (capture)" } else { "" }
        );
        if let Some(captured) = outcome.captured {
            self.emit(BoardEvent::Captured { piece: captured });
        }
        self.emit(BoardEvent::Moved(outcome));

        let sync_error = self.push_outcome(&outcome).await;
        Ok(MoveReport {
            outcome,
            sync_error,
        })
    }

    async fn push_outcome(&self, outcome: &MoveOutcome) -> Option<SyncError> {
        if self.bridge.room().is_none() {
            self.notify(Notice::warning(SyncError::NoRoom.to_string()));
            return Some(SyncError::NoRoom);
        }

        let mut first_error = None;
        for (piece, square) in outcome_writes(outcome) {
            if let Err(err) = self.bridge.push_recorded(piece, square).await {
                self.notify(Notice::warning(err.to_string()));
                first_error.get_or_insert(err);
            }
        }
        first_error
    }

    async fn subscribe(&mut self, room: RoomId) -> GameResult<()> {
        let epoch = {
            let mut cell = self.cell.lock();
            cell.epoch += 1;
            cell.epoch
        };

        let handler = remote_handler(self.cell.clone(), self.events.clone(), epoch);
        if let Err(err) = self.bridge.subscribe(room.clone(), handler).await {
            return Err(self.sync_failure(err));
        }
        self.notify(Notice::info(format!("Joined room {room}")));
        Ok(())
    }

    fn parse_room(&self, room: &str) -> GameResult<RoomId> {
        RoomId::parse(room).map_err(|err| self.sync_failure(err))
    }

    fn sync_failure(&self, err: SyncError) -> GameError {
        self.reject(GameError::Sync(err))
    }

    /// Logs a rejection, shows it to the player and hands it back
    fn reject(&self, err: GameError) -> GameError {
        warn!("[MOVE] {}", err);
        self.notify(Notice::warning(err.to_string()));
        err
    }

    fn notify(&self, notice: Notice) {
        self.emit(BoardEvent::Notice(notice));
    }

    fn emit(&self, event: BoardEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }
}

/// Store writes for a committed move: the capture sentinel, then the mover
fn outcome_writes(outcome: &MoveOutcome) -> Vec<(PieceId, Coordinate)> {
    let mut writes = Vec::with_capacity(2);
    if let Some(captured) = outcome.captured {
        writes.push((captured, Coordinate::SENTINEL));
    }
    writes.push((outcome.piece, outcome.to));
    writes
}

/// Callback run by the subscription task for every remote change
fn remote_handler(
    cell: SharedCell,
    events: broadcast::Sender<BoardEvent>,
    epoch: u64,
) -> impl Fn(RemoteChange) + Send + Sync + 'static {
    let initial_load = AtomicBool::new(true);

    move |change| match change {
        RemoteChange::DocumentMissing => {
            let _ = events.send(BoardEvent::Notice(Notice::warning("Room data not found")));
        }
        RemoteChange::Positions(delta) => {
            let report = {
                let mut guard = cell.lock();
                let cell = &mut *guard;
                if cell.epoch != epoch {
                    debug!("[SYNC] Dropping delta from a previous room");
                    return;
                }

                let first_snapshot = initial_load.swap(false, Ordering::SeqCst);
                let report = cell.board.merge(&delta);
                for piece in report.removed.iter().chain(&report.displaced) {
                    cell.captured.add_capture(*piece);
                }
                if !first_snapshot {
                    if let Some(mover) = report.moved.last() {
                        cell.turn.record_move(mover.color);
                    }
                }
                report
            };

            if !report.ignored.is_empty() {
                warn!("[SYNC] Ignored {} invalid remote position(s)", report.ignored.len());
            }
            if report.is_empty() {
                return;
            }

            debug!(
                "[SYNC] Merged remote delta: {} moved, {} removed, {} displaced",
                report.moved.len(),
                report.removed.len(),
                report.displaced.len()
            );
            for piece in report.removed.iter().chain(&report.displaced) {
                let _ = events.send(BoardEvent::Captured { piece: *piece });
            }
            let _ = events.send(BoardEvent::RemoteMerged(report));
        }
    }
}
