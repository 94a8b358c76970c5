use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the per-room document holding board state
pub const DATA_DOCUMENT: &str = "data";

/// Field of the room document mapping piece keys to positions
pub const POSITIONS_FIELD: &str = "playerPosition";

/// Dot-path used for a partial update of one piece
pub fn position_path(piece_key: &str) -> String {
    format!("{POSITIONS_FIELD}.{piece_key}")
}

/// A piece position as stored in the room document
///
/// `x` is the rank, `y` the file. `(-1, -1)` marks a captured piece.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WirePosition {
    pub x: i32,
    pub y: i32,
}

impl WirePosition {
    pub const CAPTURED: WirePosition = WirePosition { x: -1, y: -1 };

    pub fn to_value(self) -> Value {
        serde_json::json!({ "x": self.x, "y": self.y })
    }
}

/// Board-relevant view of a room document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RoomDocument {
    #[serde(rename = "playerPosition", default)]
    pub player_position: BTreeMap<String, WirePosition>,
}

impl RoomDocument {
    /// Extracts positions from a raw document, entry by entry
    ///
    /// Entries that do not decode as `{x, y}` are returned in the second
    /// list instead of failing the whole document. A missing or non-object
    /// `playerPosition` field yields no positions.
    pub fn decode_lenient(document: &Value) -> (Self, Vec<String>) {
        let mut decoded = RoomDocument::default();
        let mut malformed = Vec::new();

        let Some(entries) = document.get(POSITIONS_FIELD).and_then(Value::as_object) else {
            return (decoded, malformed);
        };

        for (key, raw) in entries {
            match serde_json::from_value::<WirePosition>(raw.clone()) {
                Ok(position) => {
                    decoded.player_position.insert(key.clone(), position);
                }
                Err(_) => malformed.push(key.clone()),
            }
        }

        (decoded, malformed)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
