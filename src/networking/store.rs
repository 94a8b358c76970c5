//! Hosted document store seam
//!
//! The board only needs four operations from the backing service: read a
//! document, overwrite it, update one field by dot-path, and watch it for
//! changes. [`DocumentStore`] is that surface; [`MemoryStore`] implements it
//! in-process for the CLI demo and the integration tests.
//!
//! Watches deliver the full current document on every change, starting with
//! the state at the moment the watch is opened. `None` means the document
//! does not exist (yet).

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Address of one document: `(collection, document)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub collection: String,
    pub document: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document)
    }
}

/// Errors reported by a document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or refusing writes
    #[error("Document store unavailable")]
    Unavailable,

    /// Partial update against a document that does not exist
    #[error("Document {key} not found")]
    NotFound { key: DocumentKey },

    /// Empty segment or a non-object on the way down the path
    #[error("Invalid update path '{path}'")]
    InvalidPath { path: String },
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Live feed of one document's contents
///
/// Dropping the watch ends the subscription on the store side.
#[derive(Debug)]
pub struct DocumentWatch {
    id: Uuid,
    receiver: mpsc::UnboundedReceiver<Option<Value>>,
}

impl DocumentWatch {
    pub fn new(id: Uuid, receiver: mpsc::UnboundedReceiver<Option<Value>>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next snapshot; `None` once the store side has gone away
    pub async fn next(&mut self) -> Option<Option<Value>> {
        self.receiver.recv().await
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &DocumentKey) -> StoreResult<Option<Value>>;

    async fn set(&self, key: &DocumentKey, document: Value) -> StoreResult<()>;

    /// Sets one field addressed by a dot-path such as `playerPosition.king`
    async fn update(&self, key: &DocumentKey, path: &str, value: Value) -> StoreResult<()>;

    fn watch(&self, key: &DocumentKey) -> StoreResult<DocumentWatch>;
}

type Watcher = (Uuid, mpsc::UnboundedSender<Option<Value>>);

#[derive(Default)]
struct MemoryInner {
    documents: HashMap<DocumentKey, Value>,
    watchers: HashMap<DocumentKey, Vec<Watcher>>,
}

impl MemoryInner {
    /// Pushes the current document to every live watcher, dropping closed ones
    fn notify(&mut self, key: &DocumentKey) {
        let current = self.documents.get(key).cloned();
        if let Some(watchers) = self.watchers.get_mut(key) {
            watchers.retain(|(id, sender)| {
                let delivered = sender.send(current.clone()).is_ok();
                if !delivered {
                    trace!("[STORE] Dropping closed watcher {} on {}", id, key);
                }
                delivered
            });
        }
    }
}

/// In-process document store
///
/// Writes are delivered to watchers while the store lock is held, so every
/// watcher sees changes to a document in write order.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    online: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            online: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing or regaining the backend; offline stores reject
    /// every operation with [`StoreError::Unavailable`]
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        debug!("[STORE] Memory store online={}", online);
    }

    /// Number of watches on `key` whose receiving side is still alive
    pub fn subscriber_count(&self, key: &DocumentKey) -> usize {
        let mut inner = self.inner.lock();
        match inner.watchers.get_mut(key) {
            Some(watchers) => {
                watchers.retain(|(_, sender)| !sender.is_closed());
                watchers.len()
            }
            None => 0,
        }
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &DocumentKey) -> StoreResult<Option<Value>> {
        self.ensure_online()?;
        Ok(self.inner.lock().documents.get(key).cloned())
    }

    async fn set(&self, key: &DocumentKey, document: Value) -> StoreResult<()> {
        self.ensure_online()?;
        let mut inner = self.inner.lock();
        inner.documents.insert(key.clone(), document);
        inner.notify(key);
        Ok(())
    }

    async fn update(&self, key: &DocumentKey, path: &str, value: Value) -> StoreResult<()> {
        self.ensure_online()?;

        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
            });
        }

        let mut inner = self.inner.lock();
        let document = inner
            .documents
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })?;

        set_path(document, &segments, value).ok_or_else(|| StoreError::InvalidPath {
            path: path.to_string(),
        })?;
        inner.notify(key);
        Ok(())
    }

    fn watch(&self, key: &DocumentKey) -> StoreResult<DocumentWatch> {
        self.ensure_online()?;

        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let current = inner.documents.get(key).cloned();
        // receiver is alive, the initial send cannot fail
        let _ = sender.send(current);
        inner.watchers.entry(key.clone()).or_default().push((id, sender));

        debug!("[STORE] Watch {} opened on {}", id, key);
        Ok(DocumentWatch::new(id, receiver))
    }
}

/// Writes `value` at `segments`, creating intermediate objects
///
/// Returns `None` when an intermediate value exists but is not an object.
fn set_path(document: &mut Value, segments: &[&str], value: Value) -> Option<()> {
    let (last, parents) = segments.split_last()?;
    let mut current = document.as_object_mut()?;

    for segment in parents {
        current = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?;
    }

    current.insert(last.to_string(), value);
    Some(())
}
