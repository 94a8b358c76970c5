//! Two-player board sync for a camel chess variant
//!
//! Move legality lives in the `board_engine` crate and the room document
//! format in `shared`. This crate wires them into a client session that
//! commits local moves and merges the opponent's moves from a shared store.

pub mod core;
pub mod game;
pub mod networking;

pub use board_engine;
