//! Optional turn gate
//!
//! Off by default: either client may move either color at any time. When
//! enabled, only the color to move may be selected or committed, and the
//! color to move flips after every move, local or remote.

use board_engine::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnGate {
    enforce: bool,
    next: Color,
}

impl TurnGate {
    /// White moves first
    pub fn new(enforce: bool) -> Self {
        Self {
            enforce,
            next: Color::White,
        }
    }

    pub fn is_enforced(&self) -> bool {
        self.enforce
    }

    pub fn next_to_move(&self) -> Color {
        self.next
    }

    pub fn permits(&self, mover: Color) -> bool {
        !self.enforce || mover == self.next
    }

    /// Hands the move to the other side of `mover`
    pub fn record_move(&mut self, mover: Color) {
        self.next = mover.opposite();
    }
}

impl Default for TurnGate {
    fn default() -> Self {
        Self::new(false)
    }
}
