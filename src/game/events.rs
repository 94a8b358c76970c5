use board_engine::{Coordinate, MergeReport, MoveOutcome, PieceId};

/// Severity of a player-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Dismissable message for the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Everything presentation code (board view, audio, toasts) reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Selected {
        piece: PieceId,
        candidates: Vec<Coordinate>,
    },
    Deselected,
    /// Local move committed
    Moved(MoveOutcome),
    /// A piece left the board, locally or remotely
    Captured { piece: PieceId },
    /// Remote delta merged into the board
    RemoteMerged(MergeReport),
    Notice(Notice),
}
