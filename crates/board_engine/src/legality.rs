//! Candidate generation and path obstruction
//!
//! The two checks are deliberately separate. Candidates are produced when a
//! piece is selected and only respect the board edge; obstruction is checked
//! once a destination is chosen.

use crate::board::BoardState;
use crate::tables::{table_for, Reach};
use crate::types::{Coordinate, PieceId, BOARD_SIZE};

/// On-board squares the piece's movement table reaches from its current square
///
/// Own-occupied squares and blocked squares are still included. A captured
/// piece has no candidates.
pub fn candidate_destinations(piece: PieceId, board: &BoardState) -> Vec<Coordinate> {
    let Some(origin) = board.position_of(piece) else {
        return Vec::new();
    };

    let table = table_for(piece);
    let mut candidates = Vec::new();

    for &vector in table.vectors {
        match table.reach {
            Reach::Step => {
                let to = origin.offset(vector, 1);
                if to.is_on_board() {
                    candidates.push(to);
                }
            }
            Reach::Slide => {
                for distance in 1..BOARD_SIZE {
                    let to = origin.offset(vector, distance);
                    if !to.is_on_board() {
                        break;
                    }
                    candidates.push(to);
                }
            }
        }
    }

    candidates
}

/// Whether any piece stands strictly between `from` and `to`
///
/// Only straight and diagonal lines are walked. Any other displacement (a
/// horse jump) is never blocked, and neither is a one-square move.
pub fn is_path_blocked(from: Coordinate, to: Coordinate, board: &BoardState) -> bool {
    let d_rank = to.rank - from.rank;
    let d_file = to.file - from.file;

    let straight = d_rank == 0 || d_file == 0;
    let diagonal = d_rank.abs() == d_file.abs();
    if from == to || !(straight || diagonal) {
        return false;
    }

    let step = (d_rank.signum(), d_file.signum());
    let mut current = from.offset(step, 1);

    while current != to {
        if board.is_occupied(current) {
            return true;
        }
        current = current.offset(step, 1);
    }

    false
}
