//! Selection state for the move commit machine
//!
//! Only the two resting phases are stored. `MoveChosen` and `Committed` are
//! transient steps inside `GameSession::choose` and always end back in
//! `Idle` (success) or `Selected` (rejection).

use board_engine::{candidate_destinations, BoardState, Coordinate, EngineError, EngineResult, PieceId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MovePhase {
    #[default]
    Idle,
    Selected {
        piece: PieceId,
        origin: Coordinate,
        candidates: Vec<Coordinate>,
    },
}

/// Result of clicking a piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(Vec<Coordinate>),
    Deselected,
}

#[derive(Debug, Default)]
pub struct Selection {
    phase: MovePhase,
}

impl Selection {
    pub fn phase(&self) -> &MovePhase {
        &self.phase
    }

    pub fn selected(&self) -> Option<PieceId> {
        match self.phase {
            MovePhase::Selected { piece, .. } => Some(piece),
            MovePhase::Idle => None,
        }
    }

    pub fn candidates(&self) -> &[Coordinate] {
        match &self.phase {
            MovePhase::Selected { candidates, .. } => candidates,
            MovePhase::Idle => &[],
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected().is_some()
    }

    /// Selects `piece`, or deselects it when it is already selected
    ///
    /// Selecting a different piece replaces the selection.
    pub fn toggle(&mut self, piece: PieceId, board: &BoardState) -> EngineResult<SelectOutcome> {
        if self.selected() == Some(piece) {
            self.clear();
            return Ok(SelectOutcome::Deselected);
        }

        let origin = board
            .position_of(piece)
            .ok_or(EngineError::PieceNotOnBoard { piece })?;
        let candidates = candidate_destinations(piece, board);

        self.phase = MovePhase::Selected {
            piece,
            origin,
            candidates: candidates.clone(),
        };
        Ok(SelectOutcome::Selected(candidates))
    }

    pub fn clear(&mut self) {
        self.phase = MovePhase::Idle;
    }
}
