//! Board engine - pure move legality for the horse/camel board
//!
//! No I/O, no async, no logging. Everything here is a plain function over a
//! [`BoardState`] value so the sync layer can call it while holding a lock.
//!
//! # Module Structure
//!
//! - `types` - piece identity, colors, coordinates
//! - `tables` - movement vectors per archetype and color
//! - `board` - piece placement and remote merge
//! - `legality` - candidate generation and path obstruction
//! - `capture` - capture resolution
//! - `moves` - validated move commit

pub mod board;
pub mod capture;
pub mod error;
pub mod legality;
pub mod moves;
pub mod tables;
pub mod types;


pub use board::{BoardState, MergeReport, PositionDelta};
pub use capture::resolve_capture;
pub use error::{EngineError, EngineResult};
pub use legality::{candidate_destinations, is_path_blocked};
pub use moves::{apply_move, validate_move, MoveOutcome};
pub use tables::{table_for, vectors_for, MovementTable, Reach};
pub use types::{Archetype, Color, Coordinate, Offset, PieceId, BOARD_SIZE};
