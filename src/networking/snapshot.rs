//! Room document <-> board positions
//!
//! The room document carries every piece's last written position. Each
//! snapshot is diffed against the previous one so only entries that actually
//! changed remotely reach the board.

use std::collections::BTreeMap;

use board_engine::{BoardState, Coordinate, PieceId, PositionDelta};
use serde_json::Value;
use shared::{RoomDocument, WirePosition};
use tracing::{debug, warn};

pub fn to_wire(square: Coordinate) -> WirePosition {
    WirePosition {
        x: i32::from(square.rank),
        y: i32::from(square.file),
    }
}

/// Converts a wire position, accepting on-board squares and the sentinel
pub fn from_wire(position: WirePosition) -> Option<Coordinate> {
    let rank = i8::try_from(position.x).ok()?;
    let file = i8::try_from(position.y).ok()?;
    let square = Coordinate::new(rank, file);
    (square.is_on_board() || square.is_sentinel()).then_some(square)
}

/// Full room document for a board, captured pieces written as the sentinel
pub fn encode_board(board: &BoardState) -> Value {
    let mut document = RoomDocument::default();
    for piece in PieceId::all() {
        let position = board
            .position_of(piece)
            .map(to_wire)
            .unwrap_or(WirePosition::CAPTURED);
        document.player_position.insert(piece.key(), position);
    }
    document.to_value()
}

/// Typed positions found in a raw room document
///
/// Unknown piece keys, malformed entries and out-of-range coordinates are
/// skipped with a log line; one bad entry never discards the rest.
pub fn decode_positions(document: &Value) -> PositionDelta {
    let (decoded, malformed) = RoomDocument::decode_lenient(document);
    for key in malformed {
        warn!("[SYNC] Ignoring malformed position entry '{}'", key);
    }

    let mut positions = PositionDelta::new();
    for (key, wire) in decoded.player_position {
        let piece = match key.parse::<PieceId>() {
            Ok(piece) => piece,
            Err(_) => {
                debug!("[SYNC] Ignoring unknown piece key '{}'", key);
                continue;
            }
        };
        match from_wire(wire) {
            Some(square) => {
                positions.insert(piece, square);
            }
            None => warn!(
                "[SYNC] Ignoring out-of-range position ({}, {}) for {}",
                wire.x, wire.y, piece
            ),
        }
    }
    positions
}

/// Remembers the last remote snapshot and yields what changed since
#[derive(Debug, Default)]
pub struct SnapshotDiff {
    last_seen: BTreeMap<PieceId, Coordinate>,
}

impl SnapshotDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of `positions` that differ from the previous snapshot
    pub fn advance(&mut self, positions: PositionDelta) -> PositionDelta {
        let changed: PositionDelta = positions
            .iter()
            .filter(|(piece, square)| self.last_seen.get(*piece) != Some(*square))
            .map(|(piece, square)| (*piece, *square))
            .collect();
        self.last_seen.extend(positions);
        changed
    }
}
