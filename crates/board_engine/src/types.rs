//! Core board types
//!
//! Pieces are identified by an explicit tag (`color`, `archetype`, `slot`)
//! rather than by inspecting name substrings. The string form produced by
//! [`PieceId::key`] is the key used in room documents, so it keeps the naming
//! existing rooms were created with (`"rook2"`, `"blackHorse1"`, ...).

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Board edge length
pub const BOARD_SIZE: i8 = 8;

/// Side a piece belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Movement archetype of a piece
///
/// `Horse` moves like a knight and `Camel` like a bishop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Archetype {
    King,
    Queen,
    Rook,
    Horse,
    Camel,
    Pawn,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::King,
        Archetype::Queen,
        Archetype::Rook,
        Archetype::Horse,
        Archetype::Camel,
        Archetype::Pawn,
    ];

    /// Number of pieces of this archetype each side starts with
    pub fn count_per_side(self) -> u8 {
        match self {
            Archetype::King | Archetype::Queen => 1,
            Archetype::Rook | Archetype::Horse | Archetype::Camel => 2,
            Archetype::Pawn => 8,
        }
    }

    fn stem(self) -> &'static str {
        match self {
            Archetype::King => "King",
            Archetype::Queen => "Queen",
            Archetype::Rook => "Rook",
            Archetype::Horse => "Horse",
            Archetype::Camel => "Camel",
            Archetype::Pawn => "Pawn",
        }
    }

    fn glyph(self) -> char {
        match self {
            Archetype::King => 'K',
            Archetype::Queen => 'Q',
            Archetype::Rook => 'R',
            Archetype::Horse => 'H',
            Archetype::Camel => 'C',
            Archetype::Pawn => 'P',
        }
    }
}

/// Identity of one of the 32 pieces
///
/// `slot` is 1-based and distinguishes pieces of the same color and
/// archetype (rook 1 and 2, pawns 1 to 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId {
    pub color: Color,
    pub archetype: Archetype,
    pub slot: u8,
}

impl PieceId {
    /// Builds a piece id, rejecting slots the archetype does not have
    pub fn new(color: Color, archetype: Archetype, slot: u8) -> Option<Self> {
        if slot == 0 || slot > archetype.count_per_side() {
            return None;
        }
        Some(Self {
            color,
            archetype,
            slot,
        })
    }

    /// All 32 pieces, white first, in archetype then slot order
    pub fn all() -> impl Iterator<Item = PieceId> {
        [Color::White, Color::Black].into_iter().flat_map(|color| {
            Archetype::ALL.into_iter().flat_map(move |archetype| {
                (1..=archetype.count_per_side()).map(move |slot| PieceId {
                    color,
                    archetype,
                    slot,
                })
            })
        })
    }

    /// Room document key for this piece
    pub fn key(&self) -> String {
        let stem = self.archetype.stem();
        match (self.color, self.archetype) {
            (Color::White, Archetype::Pawn) => format!("pawn{}", self.slot),
            (Color::White, _) => {
                let lower = stem.to_ascii_lowercase();
                if self.slot == 1 {
                    lower
                } else {
                    format!("{lower}{}", self.slot)
                }
            }
            (Color::Black, Archetype::King | Archetype::Queen) => format!("black{stem}"),
            (Color::Black, _) => format!("black{stem}{}", self.slot),
        }
    }

    /// Single-letter board glyph, lowercase for black
    pub fn glyph(&self) -> char {
        let glyph = self.archetype.glyph();
        match self.color {
            Color::White => glyph,
            Color::Black => glyph.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for PieceId {
    type Err = EngineError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let unknown = || EngineError::UnknownPiece {
            key: key.to_string(),
        };

        let (color, rest) = match key.strip_prefix("black") {
            Some(rest) => (Color::Black, rest),
            None => (Color::White, key),
        };

        let archetype = Archetype::ALL
            .into_iter()
            .find(|a| match color {
                Color::White => rest.starts_with(&a.stem().to_ascii_lowercase()),
                Color::Black => rest.starts_with(a.stem()),
            })
            .ok_or_else(unknown)?;

        let digits = &rest[archetype.stem().len()..];
        let slot = match (color, archetype, digits) {
            // white pawns always carry a number; every other white piece
            // omits it for slot 1
            (Color::White, Archetype::Pawn, "") => return Err(unknown()),
            (Color::White, _, "") => 1,
            (Color::White, Archetype::Pawn, _) => digits.parse().map_err(|_| unknown())?,
            (Color::White, _, "1") => return Err(unknown()),
            (Color::Black, Archetype::King | Archetype::Queen, "") => 1,
            (Color::Black, Archetype::King | Archetype::Queen, _) => return Err(unknown()),
            (Color::Black, _, "") => return Err(unknown()),
            _ => digits.parse().map_err(|_| unknown())?,
        };

        // "pawn01" or "blackRook+2" parse to a slot but are not wire keys
        PieceId::new(color, archetype, slot)
            .filter(|piece| piece.key() == key)
            .ok_or_else(unknown)
    }
}

/// Relative displacement `(Δrank, Δfile)`
pub type Offset = (i8, i8);

/// Board square as `(rank, file)`
///
/// Rank 0 is black's back rank, rank 7 is white's. `(-1, -1)` is the
/// captured sentinel used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub rank: i8,
    pub file: i8,
}

impl Coordinate {
    pub const SENTINEL: Coordinate = Coordinate { rank: -1, file: -1 };

    pub const fn new(rank: i8, file: i8) -> Self {
        Self { rank, file }
    }

    pub fn is_on_board(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.rank) && (0..BOARD_SIZE).contains(&self.file)
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Adds `scale` times `offset`; the result may be off the board
    pub fn offset(&self, offset: Offset, scale: i8) -> Coordinate {
        Coordinate {
            rank: self.rank.saturating_add(offset.0.saturating_mul(scale)),
            file: self.file.saturating_add(offset.1.saturating_mul(scale)),
        }
    }
}

impl From<(i8, i8)> for Coordinate {
    fn from((rank, file): (i8, i8)) -> Self {
        Self { rank, file }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rank, self.file)
    }
}
