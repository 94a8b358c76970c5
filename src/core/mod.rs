//! Core module - session settings and their persistence
//!
//! - [`SessionSettings`] - per-client preferences (turn gate, event buffer,
//!   default room)
//! - [`load_settings`] / [`save_settings`] - `settings.json` in the user's
//!   config directory, with environment overrides on load
//! - [`CoreError`] - settings I/O and validation errors

pub mod config;
pub mod error;

pub use config::{
    load_settings, load_settings_from, save_settings, save_settings_to, settings_path, SessionSettings,
};
pub use error::{CoreError, CoreResult};
