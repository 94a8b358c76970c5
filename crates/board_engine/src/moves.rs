//! Move commit
//!
//! [`apply_move`] is the only place a local move mutates the board. It runs
//! every check against the board it is given, so a caller holding a stale
//! candidate list (selection made before a remote merge) is still safe.

use crate::board::BoardState;
use crate::capture::resolve_capture;
use crate::error::{EngineError, EngineResult};
use crate::legality::{candidate_destinations, is_path_blocked};
use crate::types::{Coordinate, PieceId};

/// Result of a committed move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub piece: PieceId,
    pub from: Coordinate,
    pub to: Coordinate,
    pub captured: Option<PieceId>,
}

/// Checks a move without touching the board
pub fn validate_move(piece: PieceId, to: Coordinate, board: &BoardState) -> EngineResult<Coordinate> {
    let from = board
        .position_of(piece)
        .ok_or(EngineError::PieceNotOnBoard { piece })?;

    if !to.is_on_board() {
        return Err(EngineError::OutOfBounds { square: to });
    }

    if !candidate_destinations(piece, board).contains(&to) {
        return Err(EngineError::NotACandidate { piece, square: to });
    }

    if is_path_blocked(from, to, board) {
        return Err(EngineError::PathBlocked { from, to });
    }

    if let Some(occupant) = board.piece_at(to) {
        if occupant.color == piece.color {
            return Err(EngineError::OwnPieceCapture {
                mover: piece,
                target: occupant,
            });
        }
    }

    Ok(from)
}

/// Validates and applies a move, resolving any capture
///
/// On error the board is unchanged.
pub fn apply_move(piece: PieceId, to: Coordinate, board: &mut BoardState) -> EngineResult<MoveOutcome> {
    let from = validate_move(piece, to, board)?;
    let captured = resolve_capture(piece, to, board)?;
    board.place(piece, to)?;

    Ok(MoveOutcome {
        piece,
        from,
        to,
        captured,
    })
}
