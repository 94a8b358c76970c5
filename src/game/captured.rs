//! Captured pieces tally
//!
//! Fed by both local captures and captures that arrive from the room
//! document, so both clients converge on the same tally.
//!
//! # Material Values
//!
//! - Pawn: 1
//! - Horse/Camel: 3
//! - Rook: 5
//! - Queen: 9
//! - King: 0
//!
//! Positive advantage means White is ahead, negative means Black is ahead.

use board_engine::{Archetype, Color, PieceId};

/// Pieces captured by each side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPieces {
    /// Black pieces taken by white
    pub white_captured: Vec<Archetype>,
    /// White pieces taken by black
    pub black_captured: Vec<Archetype>,
}

impl CapturedPieces {
    /// Record a capture; the opposite side of `captured` gets the credit
    pub fn add_capture(&mut self, captured: PieceId) {
        match captured.color {
            Color::White => self.black_captured.push(captured.archetype),
            Color::Black => self.white_captured.push(captured.archetype),
        }
    }

    /// Material difference in pawn units
    pub fn material_advantage(&self) -> i32 {
        let white_score: i32 = self.white_captured.iter().map(|a| piece_value(*a)).sum();
        let black_score: i32 = self.black_captured.iter().map(|a| piece_value(*a)).sum();
        white_score - black_score
    }

    pub fn total(&self) -> usize {
        self.white_captured.len() + self.black_captured.len()
    }

    pub fn clear(&mut self) {
        self.white_captured.clear();
        self.black_captured.clear();
    }
}

fn piece_value(archetype: Archetype) -> i32 {
    match archetype {
        Archetype::Pawn => 1,
        Archetype::Horse => 3,
        Archetype::Camel => 3,
        Archetype::Rook => 5,
        Archetype::Queen => 9,
        Archetype::King => 0,
    }
}
