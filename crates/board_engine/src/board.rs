//! Board state: where every active piece sits
//!
//! Captured pieces are simply absent. The wire sentinel `(-1, -1)` and a
//! missing key are both normalized to "absent" on the way in, so callers
//! never have to distinguish them.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::types::{Archetype, Color, Coordinate, PieceId, BOARD_SIZE};

/// Partial mapping delivered by a remote change
pub type PositionDelta = BTreeMap<PieceId, Coordinate>;

/// What a remote merge actually changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Pieces now standing on a different square than before
    pub moved: Vec<PieceId>,
    /// Pieces the remote marked as captured that were still on the board
    pub removed: Vec<PieceId>,
    /// Local pieces knocked off because a remote piece landed on their square
    pub displaced: Vec<PieceId>,
    /// Entries with a coordinate that is neither on the board nor the sentinel
    pub ignored: Vec<PieceId>,
}

impl MergeReport {
    /// True when the merge left the board untouched
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.removed.is_empty() && self.displaced.is_empty()
    }
}

/// Mapping from piece to coordinate for every active piece
///
/// At most one piece occupies a square; [`BoardState::place`] and
/// [`BoardState::merge`] both preserve that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    positions: BTreeMap<PieceId, Coordinate>,
}

impl BoardState {
    /// Empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting layout: white on ranks 6-7, black on ranks 0-1
    pub fn initial() -> Self {
        let mut positions = BTreeMap::new();
        for piece in PieceId::all() {
            positions.insert(piece, starting_square(piece));
        }
        Self { positions }
    }

    /// Builds a board from explicit placements, later entries winning a
    /// contested square
    pub fn with_pieces<I>(pieces: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (PieceId, Coordinate)>,
    {
        let mut board = Self::new();
        for (piece, square) in pieces {
            board.place(piece, square)?;
        }
        Ok(board)
    }

    pub fn position_of(&self, piece: PieceId) -> Option<Coordinate> {
        self.positions.get(&piece).copied()
    }

    pub fn piece_at(&self, square: Coordinate) -> Option<PieceId> {
        self.positions
            .iter()
            .find(|(_, pos)| **pos == square)
            .map(|(piece, _)| *piece)
    }

    pub fn is_occupied(&self, square: Coordinate) -> bool {
        self.positions.values().any(|pos| *pos == square)
    }

    pub fn color_at(&self, square: Coordinate) -> Option<Color> {
        self.piece_at(square).map(|piece| piece.color)
    }

    /// Active pieces in id order
    pub fn pieces(&self) -> impl Iterator<Item = (PieceId, Coordinate)> + '_ {
        self.positions.iter().map(|(piece, pos)| (*piece, *pos))
    }

    /// Pieces of the standard set that are no longer on the board
    pub fn captured(&self) -> impl Iterator<Item = PieceId> + '_ {
        PieceId::all().filter(|piece| !self.positions.contains_key(piece))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Puts `piece` on `square`, returning whichever other piece had to leave
    ///
    /// The sentinel removes the piece instead.
    pub fn place(&mut self, piece: PieceId, square: Coordinate) -> EngineResult<Option<PieceId>> {
        if square.is_sentinel() {
            self.positions.remove(&piece);
            return Ok(None);
        }
        if !square.is_on_board() {
            return Err(EngineError::OutOfBounds { square });
        }

        let displaced = self.piece_at(square).filter(|occupant| *occupant != piece);
        if let Some(occupant) = displaced {
            self.positions.remove(&occupant);
        }
        self.positions.insert(piece, square);
        Ok(displaced)
    }

    pub fn remove(&mut self, piece: PieceId) -> Option<Coordinate> {
        self.positions.remove(&piece)
    }

    /// Shallow-merges a remote delta
    ///
    /// Entries in the delta overwrite local entries for the same piece;
    /// pieces absent from the delta keep their square unless a delta piece
    /// lands on it, in which case the local piece is displaced.
    pub fn merge(&mut self, delta: &PositionDelta) -> MergeReport {
        let mut report = MergeReport::default();

        // lift every mentioned piece first so pieces swapping squares within
        // one delta do not displace each other
        let mut lifted = BTreeMap::new();
        for (&piece, &square) in delta {
            if !square.is_sentinel() && !square.is_on_board() {
                report.ignored.push(piece);
                continue;
            }
            if let Some(previous) = self.positions.remove(&piece) {
                lifted.insert(piece, previous);
            }
        }

        for (&piece, &square) in delta {
            if square.is_sentinel() {
                if lifted.contains_key(&piece) {
                    report.removed.push(piece);
                }
                continue;
            }
            if !square.is_on_board() {
                continue;
            }

            if let Some(occupant) = self.piece_at(square) {
                self.positions.remove(&occupant);
                report.displaced.push(occupant);
            }
            self.positions.insert(piece, square);
            if lifted.get(&piece) != Some(&square) {
                report.moved.push(piece);
            }
        }

        report
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in 0..BOARD_SIZE {
            write!(f, "{rank} ")?;
            for file in 0..BOARD_SIZE {
                let glyph = self
                    .piece_at(Coordinate::new(rank, file))
                    .map(|piece| piece.glyph())
                    .unwrap_or('.');
                write!(f, " {glyph}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for file in 0..BOARD_SIZE {
            write!(f, " {file}")?;
        }
        writeln!(f)
    }
}

fn starting_square(piece: PieceId) -> Coordinate {
    let (back_rank, pawn_rank) = match piece.color {
        Color::White => (7, 6),
        Color::Black => (0, 1),
    };
    let second = piece.slot == 2;
    let file = match piece.archetype {
        Archetype::Rook => if second { 7 } else { 0 },
        Archetype::Horse => if second { 6 } else { 1 },
        Archetype::Camel => if second { 5 } else { 2 },
        Archetype::Queen => 3,
        Archetype::King => 4,
        Archetype::Pawn => return Coordinate::new(pawn_rank, piece.slot as i8 - 1),
    };
    Coordinate::new(back_rank, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(color: Color, archetype: Archetype, slot: u8) -> PieceId {
        PieceId::new(color, archetype, slot).unwrap()
    }

    #[test]
    fn test_initial_layout() {
        let board = BoardState::initial();
        assert_eq!(board.len(), 32);
        assert_eq!(
            board.position_of(piece(Color::White, Archetype::King, 1)),
            Some(Coordinate::new(7, 4))
        );
        assert_eq!(
            board.position_of(piece(Color::Black, Archetype::Horse, 2)),
            Some(Coordinate::new(0, 6))
        );
        assert_eq!(
            board.position_of(piece(Color::White, Archetype::Pawn, 8)),
            Some(Coordinate::new(6, 7))
        );
        assert_eq!(board.captured().count(), 0);
    }

    #[test]
    fn test_initial_layout_one_piece_per_square() {
        let board = BoardState::initial();
        let mut squares: Vec<Coordinate> = board.pieces().map(|(_, sq)| sq).collect();
        squares.sort();
        squares.dedup();
        assert_eq!(squares.len(), 32);
    }

    #[test]
    fn test_place_displaces_occupant() {
        let rook = piece(Color::White, Archetype::Rook, 1);
        let pawn = piece(Color::Black, Archetype::Pawn, 3);
        let mut board = BoardState::with_pieces([(pawn, Coordinate::new(3, 3))]).unwrap();

        let displaced = board.place(rook, Coordinate::new(3, 3)).unwrap();

        assert_eq!(displaced, Some(pawn));
        assert_eq!(board.piece_at(Coordinate::new(3, 3)), Some(rook));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_place_sentinel_removes() {
        let mut board = BoardState::initial();
        let queen = piece(Color::Black, Archetype::Queen, 1);
        board.place(queen, Coordinate::SENTINEL).unwrap();
        assert_eq!(board.position_of(queen), None);
        assert_eq!(board.captured().collect::<Vec<_>>(), vec![queen]);
    }

    #[test]
    fn test_place_off_board_rejected() {
        let mut board = BoardState::initial();
        let before = board.clone();
        let king = piece(Color::White, Archetype::King, 1);
        let err = board.place(king, Coordinate::new(8, 2)).unwrap_err();
        assert_eq!(err, EngineError::OutOfBounds { square: Coordinate::new(8, 2) });
        assert_eq!(board, before);
    }

    #[test]
    fn test_merge_swap_within_delta() {
        let a = piece(Color::White, Archetype::Rook, 1);
        let b = piece(Color::White, Archetype::Rook, 2);
        let mut board =
            BoardState::with_pieces([(a, Coordinate::new(4, 0)), (b, Coordinate::new(4, 7))]).unwrap();

        let delta = PositionDelta::from([(a, Coordinate::new(4, 7)), (b, Coordinate::new(4, 0))]);
        let report = board.merge(&delta);

        assert!(report.displaced.is_empty());
        assert_eq!(report.moved.len(), 2);
        assert_eq!(board.position_of(a), Some(Coordinate::new(4, 7)));
        assert_eq!(board.position_of(b), Some(Coordinate::new(4, 0)));
    }

    #[test]
    fn test_merge_displaces_unmentioned_occupant() {
        let mover = piece(Color::Black, Archetype::Camel, 1);
        let local = piece(Color::White, Archetype::Pawn, 4);
        let mut board =
            BoardState::with_pieces([(mover, Coordinate::new(0, 2)), (local, Coordinate::new(5, 7))])
                .unwrap();

        let report = board.merge(&PositionDelta::from([(mover, Coordinate::new(5, 7))]));

        assert_eq!(report.displaced, vec![local]);
        assert_eq!(board.position_of(local), None);
        assert_eq!(board.piece_at(Coordinate::new(5, 7)), Some(mover));
    }

    #[test]
    fn test_merge_ignores_invalid_coordinates() {
        let mut board = BoardState::initial();
        let before = board.clone();
        let king = piece(Color::White, Archetype::King, 1);

        let report = board.merge(&PositionDelta::from([(king, Coordinate::new(9, 9))]));

        assert_eq!(report.ignored, vec![king]);
        assert!(report.is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_display_renders_glyphs() {
        let rendered = BoardState::initial().to_string();
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows[0], "0  r h c q k c h r");
        assert_eq!(rows[6], "6  P P P P P P P P");
        assert_eq!(rows[3], "3  . . . . . . . .");
    }
}
