//! Capture resolution

use crate::board::BoardState;
use crate::error::{EngineError, EngineResult};
use crate::types::{Coordinate, PieceId};

/// Clears `destination` for `mover`
///
/// An opposing occupant is removed from the board and returned. An occupant
/// of the mover's own color rejects the move and leaves the board unchanged.
/// An empty square yields `Ok(None)`.
pub fn resolve_capture(
    mover: PieceId,
    destination: Coordinate,
    board: &mut BoardState,
) -> EngineResult<Option<PieceId>> {
    let Some(occupant) = board.piece_at(destination) else {
        return Ok(None);
    };

    if occupant == mover {
        return Ok(None);
    }

    if occupant.color == mover.color {
        return Err(EngineError::OwnPieceCapture {
            mover,
            target: occupant,
        });
    }

    board.remove(occupant);
    Ok(Some(occupant))
}
