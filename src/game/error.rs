//! Error types for game module
//!
//! None of these are fatal. Each one is also surfaced to the player as a
//! warning notice and leaves the board as it was.

use board_engine::{Color, EngineError, PieceId};

use crate::networking::SyncError;

/// Errors that can occur while selecting or committing a move
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Move rejected by the board engine
    #[error(transparent)]
    Rejected(#[from] EngineError),

    /// Destination chosen with no piece selected
    #[error("No piece selected")]
    NoSelection,

    /// Turn gate is on and the other side is to move
    #[error("It is {expected}'s turn, {piece} cannot move")]
    OutOfTurn { piece: PieceId, expected: Color },

    /// Room document unreachable or no room joined
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
