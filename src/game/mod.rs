//! Game module - one client's view of a shared board
//!
//! # Module Organization
//!
//! - `selection` - select/deselect state of the move commit machine
//! - `session` - [`GameSession`], owner of the board; commits local moves and
//!   merges remote ones
//! - `turn` - optional turn gate
//! - `captured` - capture tally and material advantage
//! - `events` - [`BoardEvent`]s for presentation code
//! - `error` - [`GameError`]
//!
//! # Move Flow
//!
//! 1. [`GameSession::select`] computes candidates for a piece
//! 2. [`GameSession::choose`] validates against the current board, resolves
//!    the capture, places the mover
//! 3. The capture sentinel and the mover's square are pushed to the room
//! 4. The other client's subscription merges the change into its board

pub mod captured;
pub mod error;
pub mod events;
pub mod selection;
pub mod session;
pub mod turn;

pub use captured::CapturedPieces;
pub use error::{GameError, GameResult};
pub use events::{BoardEvent, Notice, NoticeLevel};
pub use selection::{MovePhase, SelectOutcome, Selection};
pub use session::{GameSession, MoveReport};
pub use turn::TurnGate;
