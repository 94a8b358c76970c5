//! Sync bridge between the local board and the room document
//!
//! # Subscription lifecycle
//!
//! [`SyncBridge::subscribe`] opens a store watch and spawns one tokio task
//! that turns snapshots into [`RemoteChange`]s. The task is owned by a
//! [`Subscription`] guard: dropping the guard aborts the task, which drops
//! the watch. Subscribing again, unsubscribing and dropping the bridge all go
//! through that guard, so at most one subscription per bridge is ever alive.
//!
//! # Echoes
//!
//! Every push is recorded as a pending write before it is sent. When the
//! store later reports that same value for that piece, the entry is
//! acknowledged and not delivered. This keeps an older echo from briefly
//! overwriting a newer optimistic move. A remote value that matches no
//! pending write clears the piece's pending list and is delivered.
//!
//! The subscription task holds the [`PendingWrites`] lock while it settles a
//! snapshot and runs the callback. A caller that records its writes under
//! that same lock, in the same critical section as its local mutation (see
//! [`SyncBridge::pending`] and [`SyncBridge::push_recorded`]), can never have
//! a remote value merged between the mutation and the record.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use board_engine::{BoardState, Coordinate, PieceId, PositionDelta};
use parking_lot::{Mutex, MutexGuard};
use shared::{position_path, DATA_DOCUMENT};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::snapshot::{decode_positions, encode_board, to_wire, SnapshotDiff};
use super::store::{DocumentKey, DocumentStore, DocumentWatch, StoreError};

/// Errors raised while talking to the room document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No room joined, or an empty room id was supplied
    #[error("You are not in a room")]
    NoRoom,

    /// Writing one piece's position failed
    #[error("Failed to update {piece} position: {source}")]
    Push {
        piece: PieceId,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Name of a shared room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Parses a room id; empty or blank ids mean "not in a room"
    pub fn parse(value: &str) -> SyncResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SyncError::NoRoom);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Board document of this room
    pub fn data_key(&self) -> DocumentKey {
        DocumentKey::new(self.0.clone(), DATA_DOCUMENT)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RoomId {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// What the subscription task hands to its callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteChange {
    /// Entries that changed remotely since the previous snapshot
    Positions(PositionDelta),
    /// The room document does not exist
    DocumentMissing,
}

/// Local writes not yet seen coming back from the store
#[derive(Debug, Clone, Default)]
pub struct PendingWrites {
    inner: Arc<Mutex<PendingQueue>>,
}

impl PendingWrites {
    /// Locks the queue; the subscription task cannot settle or deliver a
    /// snapshot while the guard is alive
    pub fn lock(&self) -> MutexGuard<'_, PendingQueue> {
        self.inner.lock()
    }
}

/// Per-piece queue of written squares, oldest first
#[derive(Debug, Default)]
pub struct PendingQueue {
    writes: HashMap<PieceId, VecDeque<Coordinate>>,
}

impl PendingQueue {
    pub fn record(&mut self, piece: PieceId, square: Coordinate) {
        self.writes.entry(piece).or_default().push_back(square);
    }

    /// Drops a write that never reached the store
    pub fn forget(&mut self, piece: PieceId, square: Coordinate) {
        if let Some(queue) = self.writes.get_mut(&piece) {
            if let Some(index) = queue.iter().rposition(|pending| *pending == square) {
                queue.remove(index);
            }
            if queue.is_empty() {
                self.writes.remove(&piece);
            }
        }
    }

    /// True when `square` is the echo of a pending write for `piece`
    pub fn settle(&mut self, piece: PieceId, square: Coordinate) -> bool {
        let Some(queue) = self.writes.get_mut(&piece) else {
            return false;
        };

        let echo = match queue.iter().position(|pending| *pending == square) {
            Some(index) => {
                queue.drain(..=index);
                true
            }
            None => {
                queue.clear();
                false
            }
        };
        if queue.is_empty() {
            self.writes.remove(&piece);
        }
        echo
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

/// Live subscription to one room; aborts its task when dropped
#[derive(Debug)]
pub struct Subscription {
    room: RoomId,
    watch_id: Uuid,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn room(&self) -> &RoomId {
        &self.room
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!("[SYNC] Subscription {} to room {} released", self.watch_id, self.room);
    }
}

/// Pushes local moves to the room document and delivers remote changes
pub struct SyncBridge {
    store: Arc<dyn DocumentStore>,
    subscription: Option<Subscription>,
    pending: PendingWrites,
}

impl SyncBridge {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            subscription: None,
            pending: PendingWrites::default(),
        }
    }

    /// Room currently subscribed to
    pub fn room(&self) -> Option<&RoomId> {
        self.subscription.as_ref().map(Subscription::room)
    }

    /// Replaces any current subscription with one on `room`
    ///
    /// The previous subscription is released before the new watch opens, even
    /// if opening it fails. `on_remote_change` runs with the pending writes
    /// locked and must not push.
    pub async fn subscribe<F>(&mut self, room: RoomId, on_remote_change: F) -> SyncResult<()>
    where
        F: Fn(RemoteChange) + Send + Sync + 'static,
    {
        self.unsubscribe();

        let watch = self.store.watch(&room.data_key())?;
        let watch_id = watch.id();
        let task = tokio::spawn(run_subscription(
            room.clone(),
            watch,
            self.pending.clone(),
            on_remote_change,
        ));

        info!("[SYNC] Subscribed to room {}", room);
        self.subscription = Some(Subscription {
            room,
            watch_id,
            task,
        });
        Ok(())
    }

    /// Releases the current subscription, if any
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            info!("[SYNC] Leaving room {}", subscription.room());
        }
        self.pending.lock().clear();
    }

    /// Echo queue shared with the subscription task
    pub fn pending(&self) -> &PendingWrites {
        &self.pending
    }

    /// Records one piece's position as pending and writes it to the
    /// subscribed room
    ///
    /// Local state is never rolled back on failure.
    pub async fn push_move(&self, piece: PieceId, square: Coordinate) -> SyncResult<()> {
        if self.room().is_none() {
            return Err(SyncError::NoRoom);
        }
        self.pending.lock().record(piece, square);
        self.push_recorded(piece, square).await
    }

    /// Writes a position the caller already recorded in [`Self::pending`]
    ///
    /// The record is withdrawn if the write fails.
    pub async fn push_recorded(&self, piece: PieceId, square: Coordinate) -> SyncResult<()> {
        let room = self.room().ok_or(SyncError::NoRoom)?;
        let key = room.data_key();

        let result = self
            .store
            .update(&key, &position_path(&piece.key()), to_wire(square).to_value())
            .await;

        match result {
            Ok(()) => {
                debug!("[SYNC] Pushed {} -> {} to {}", piece, square, key);
                Ok(())
            }
            Err(source) => {
                self.pending.lock().forget(piece, square);
                warn!("[SYNC] Failed to push {} -> {}: {}", piece, square, source);
                Err(SyncError::Push { piece, source })
            }
        }
    }

    /// Writes the full board as a new room document
    pub async fn seed_room(&self, room: &RoomId, board: &BoardState) -> SyncResult<()> {
        self.store.set(&room.data_key(), encode_board(board)).await?;
        info!("[SYNC] Seeded room {} with {} pieces", room, board.len());
        Ok(())
    }

    pub async fn room_exists(&self, room: &RoomId) -> SyncResult<bool> {
        Ok(self.store.get(&room.data_key()).await?.is_some())
    }
}

async fn run_subscription<F>(room: RoomId, mut watch: DocumentWatch, pending: PendingWrites, on_remote_change: F)
where
    F: Fn(RemoteChange) + Send + Sync + 'static,
{
    let mut diff = SnapshotDiff::new();

    while let Some(snapshot) = watch.next().await {
        let Some(document) = snapshot else {
            warn!("[SYNC] Room {} has no board document", room);
            on_remote_change(RemoteChange::DocumentMissing);
            continue;
        };

        let positions = decode_positions(&document);
        if positions.is_empty() {
            debug!("[SYNC] Room {} has no recorded positions yet", room);
            continue;
        }

        let changed = diff.advance(positions);

        // settle and deliver as one step against local commits
        let mut queue = pending.lock();
        let delta: PositionDelta = changed
            .into_iter()
            .filter(|(piece, square)| !queue.settle(*piece, *square))
            .collect();

        if delta.is_empty() {
            continue;
        }

        debug!("[SYNC] Room {}: {} remote change(s)", room, delta.len());
        on_remote_change(RemoteChange::Positions(delta));
    }

    debug!("[SYNC] Watch on room {} closed", room);
}
