pub mod protocol;

pub use protocol::{position_path, RoomDocument, WirePosition, DATA_DOCUMENT, POSITIONS_FIELD};
