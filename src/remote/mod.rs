//! Remote document service boundary.
//!
//! The wire protocol is not owned here: repositories are constructed with a
//! concrete [`RemoteDocumentStore`] binding and the algorithms above it stay
//! agnostic to which binding is in use. Failures cross this seam raw (as
//! [`RemoteFailure`]) and are classified exactly once, by
//! `AppError::from_remote_store`.

pub mod memory;
pub mod timestamps;

pub use memory::MemoryDocumentStore;
pub use timestamps::normalize_timestamps;

use crate::keypath::KeyPath;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Raw, unclassified failure from the platform's document store.
///
/// Bindings put whatever diagnostic text the platform gave them into the
/// message; classification by substring happens in the error mapper, not
/// here.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RemoteFailure {
    pub message: String,
}

impl RemoteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, RemoteFailure>;

/// Write semantics: merge into an existing document or replace it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Merge,
    Overwrite,
}

/// Callback invoked per inbound snapshot: the document (or `None` when it
/// does not exist yet) or a raw delivery failure.
pub type SnapshotHandler = Box<dyn FnMut(StoreResult<Option<JsonValue>>) + Send>;

/// Opaque token for a live push listener.
///
/// Listeners are long-lived; owners must call [`unsubscribe`] when the
/// owning context goes away. Dropping the handle also stops delivery (this
/// is Rust, not a garbage-collected runtime), but a drop without an explicit
/// unsubscribe is logged as a likely listener leak.
///
/// [`unsubscribe`]: SubscriptionHandle::unsubscribe
pub struct SubscriptionHandle {
    stop: Option<Box<dyn FnOnce() + Send>>,
    label: String,
}

impl SubscriptionHandle {
    pub fn new(label: impl Into<String>, stop: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            stop: Some(stop),
            label: label.into(),
        }
    }

    /// Stops snapshot delivery. Idempotent by construction: consumes self.
    pub fn unsubscribe(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            log::warn!(
                "subscription '{}' dropped without explicit unsubscribe",
                self.label
            );
            stop();
        }
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("label", &self.label)
            .field("active", &self.stop.is_some())
            .finish()
    }
}

/// Key-path read/write/subscribe service over raw JSON documents.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Reads the document at `path`; `Ok(None)` means it does not exist.
    async fn read(&self, path: &KeyPath) -> StoreResult<Option<JsonValue>>;

    /// Writes `data` at `path` with the given semantics.
    async fn write(&self, path: &KeyPath, data: JsonValue, mode: WriteMode) -> StoreResult<()>;

    /// Deletes the document at `path`; deleting an absent document is a
    /// no-op.
    async fn delete(&self, path: &KeyPath) -> StoreResult<()>;

    /// Registers a push listener at `path`. The handler is invoked with the
    /// current document immediately and again on every subsequent change.
    async fn subscribe(
        &self,
        path: &KeyPath,
        on_snapshot: SnapshotHandler,
    ) -> StoreResult<SubscriptionHandle>;
}
