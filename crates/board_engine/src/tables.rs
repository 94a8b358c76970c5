//! Movement tables
//!
//! Each archetype/color pair has a fixed, ordered list of `(Δrank, Δfile)`
//! vectors and a [`Reach`] telling the engine how to use them:
//!
//! - **Step** pieces (king, horse, pawn) land exactly one vector away.
//! - **Slide** pieces (queen, rook, camel) treat each vector as a direction
//!   and may travel any number of squares along it. The table only stores
//!   the unit direction; `legality::candidate_destinations` walks it.
//!
//! White starts on ranks 6-7 and advances toward rank 0. Black tables are
//! the white tables mirrored on the rank axis, so pawns are the only pieces
//! whose two tables actually differ.

use crate::types::{Archetype, Color, Offset, PieceId};

/// How far a piece may travel along one of its vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Step,
    Slide,
}

/// Vectors plus reach for one archetype/color pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementTable {
    pub reach: Reach,
    pub vectors: &'static [Offset],
}

pub const KING_DIRS: [Offset; 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
pub const BLACK_KING_DIRS: [Offset; 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub const QUEEN_DIRS: [Offset; 8] = KING_DIRS;
pub const BLACK_QUEEN_DIRS: [Offset; 8] = BLACK_KING_DIRS;

pub const ROOK_DIRS: [Offset; 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
pub const BLACK_ROOK_DIRS: [Offset; 4] = [(1, 0), (0, -1), (0, 1), (-1, 0)];

pub const HORSE_DIRS: [Offset; 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
pub const BLACK_HORSE_DIRS: [Offset; 8] = [
    (2, -1),
    (2, 1),
    (1, -2),
    (1, 2),
    (-1, -2),
    (-1, 2),
    (-2, -1),
    (-2, 1),
];

pub const CAMEL_DIRS: [Offset; 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub const BLACK_CAMEL_DIRS: [Offset; 4] = [(1, -1), (1, 1), (-1, -1), (-1, 1)];

/// Forward, forward-left, forward-right
pub const PAWN_DIRS: [Offset; 3] = [(-1, 0), (-1, -1), (-1, 1)];
pub const BLACK_PAWN_DIRS: [Offset; 3] = [(1, 0), (1, -1), (1, 1)];

/// Movement table for a piece
pub fn table_for(piece: PieceId) -> MovementTable {
    use Archetype::*;
    use Color::*;

    let (reach, vectors): (Reach, &'static [Offset]) = match (piece.archetype, piece.color) {
        (King, White) => (Reach::Step, &KING_DIRS),
        (King, Black) => (Reach::Step, &BLACK_KING_DIRS),
        (Queen, White) => (Reach::Slide, &QUEEN_DIRS),
        (Queen, Black) => (Reach::Slide, &BLACK_QUEEN_DIRS),
        (Rook, White) => (Reach::Slide, &ROOK_DIRS),
        (Rook, Black) => (Reach::Slide, &BLACK_ROOK_DIRS),
        (Horse, White) => (Reach::Step, &HORSE_DIRS),
        (Horse, Black) => (Reach::Step, &BLACK_HORSE_DIRS),
        (Camel, White) => (Reach::Slide, &CAMEL_DIRS),
        (Camel, Black) => (Reach::Slide, &BLACK_CAMEL_DIRS),
        (Pawn, White) => (Reach::Step, &PAWN_DIRS),
        (Pawn, Black) => (Reach::Step, &BLACK_PAWN_DIRS),
    };

    MovementTable { reach, vectors }
}

/// Ordered vector list for a piece
pub fn vectors_for(piece: PieceId) -> &'static [Offset] {
    table_for(piece).vectors
}
