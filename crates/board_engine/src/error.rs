//! Error types for the board engine
//!
//! Every variant is an input rejection: the board is left exactly as it was
//! before the rejected call.

use thiserror::Error;

use crate::types::{Coordinate, PieceId};

/// Errors that can occur while validating or applying a move
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Piece was captured or never placed
    #[error("Piece {piece} is not on the board")]
    PieceNotOnBoard { piece: PieceId },

    /// Destination outside the 8x8 board
    #[error("Square {square} is off the board")]
    OutOfBounds { square: Coordinate },

    /// Destination not produced by the piece's movement table
    #[error("{piece} cannot reach {square}")]
    NotACandidate { piece: PieceId, square: Coordinate },

    /// A piece stands between origin and destination
    #[error("Move blocked by another piece between {from} and {to}")]
    PathBlocked { from: Coordinate, to: Coordinate },

    /// Destination holds a piece of the mover's own color
    #[error("{mover} cannot capture its own side's {target}")]
    OwnPieceCapture { mover: PieceId, target: PieceId },

    /// Room document key that names no piece
    #[error("Unknown piece key: {key}")]
    UnknownPiece { key: String },
}

/// Result type alias for board engine operations
pub type EngineResult<T> = Result<T, EngineError>;
