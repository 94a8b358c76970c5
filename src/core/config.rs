//! Session settings and their persistence
//!
//! Settings are stored as `settings.json` in the user's configuration
//! directory (resolved through `directories::ProjectDirs`), falling back to a
//! local `settings.json` when no config directory exists.
//!
//! Loading never fails: a missing or unreadable file yields the defaults.
//! Environment variables are applied on top of whatever was loaded:
//!
//! - `CAMELCHESS_ENFORCE_TURNS`: `true`/`false` (also `1`/`0`, `yes`/`no`)
//! - `CAMELCHESS_ROOM`: room joined by default

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::error::{CoreError, CoreResult};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

pub const ENV_ENFORCE_TURNS: &str = "CAMELCHESS_ENFORCE_TURNS";
pub const ENV_ROOM: &str = "CAMELCHESS_ROOM";

/// Per-client session preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Reject moves by the side that is not next to move
    pub enforce_turns: bool,
    /// Buffered board events per receiver before the slowest one lags
    pub event_capacity: usize,
    /// Room joined when none is given on the command line
    pub default_room: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            enforce_turns: false,
            event_capacity: 64,
            default_room: None,
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> CoreResult<()> {
        if self.event_capacity == 0 {
            return Err(CoreError::InvalidSetting {
                field: "event_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(room) = &self.default_room {
            if room.trim().is_empty() {
                return Err(CoreError::InvalidSetting {
                    field: "default_room",
                    message: "must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Applies overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ENFORCE_TURNS) {
            match parse_flag(&raw) {
                Some(enforce) => self.enforce_turns = enforce,
                None => warn!("[SETTINGS] Ignoring {}={:?}: not a boolean", ENV_ENFORCE_TURNS, raw),
            }
        }
        if let Some(room) = lookup(ENV_ROOM) {
            let room = room.trim();
            self.default_room = (!room.is_empty()).then(|| room.to_string());
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolves the settings file path
pub fn settings_path() -> PathBuf {
    match ProjectDirs::from("com", "camelchess", "CamelChess") {
        Some(dirs) => dirs.config_dir().join(SETTINGS_FILENAME),
        None => PathBuf::from(SETTINGS_FILENAME),
    }
}

/// Loads settings from the default location, then applies the environment
pub fn load_settings() -> SessionSettings {
    let mut settings = load_settings_from(&settings_path());
    settings.apply_env_overrides();
    settings
}

/// Loads settings from `path`, using defaults if the file is missing,
/// unreadable or invalid
pub fn load_settings_from(path: &Path) -> SessionSettings {
    if !path.exists() {
        info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
        return SessionSettings::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("[SETTINGS] Failed to read settings file at {:?}: {}. Using defaults.", path, e);
            return SessionSettings::default();
        }
    };

    match serde_json::from_str::<SessionSettings>(&contents) {
        Ok(settings) => match settings.validate() {
            Ok(()) => {
                info!("[SETTINGS] Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("[SETTINGS] {} in {:?}. Using defaults.", e, path);
                SessionSettings::default()
            }
        },
        Err(e) => {
            warn!("[SETTINGS] Failed to parse settings file at {:?}: {}. Using defaults.", path, e);
            SessionSettings::default()
        }
    }
}

/// Saves settings to the default location
pub fn save_settings(settings: &SessionSettings) -> CoreResult<()> {
    save_settings_to(&settings_path(), settings)
}

/// Writes settings to `path` as pretty JSON, creating parent directories
pub fn save_settings_to(path: &Path, settings: &SessionSettings) -> CoreResult<()> {
    settings.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                error!("[SETTINGS] Failed to create settings directory at {:?}: {}", parent, e);
                CoreError::from(e)
            })?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!("[SETTINGS] Saved settings to {:?}", path);
    Ok(())
}
