//! Networking - room document sync
//!
//! - `store` - the hosted document store seam and its in-process implementation
//! - `snapshot` - conversion between the room document and board positions
//! - `sync` - subscription lifecycle and move pushes

pub mod snapshot;
pub mod store;
pub mod sync;

pub use store::{DocumentKey, DocumentStore, DocumentWatch, MemoryStore, StoreError, StoreResult};
pub use sync::{PendingQueue, PendingWrites, RemoteChange, RoomId, Subscription, SyncBridge, SyncError, SyncResult};
