//! In-memory store binding.
//!
//! Serves as the crate's own test double and as an embedded/offline
//! binding: documents live in a keyed map under a `tokio` lock, and
//! subscriptions fan out over broadcast channels. Per-path fault injection
//! lets tests drive the error-classification paths without a real backend.

use super::{RemoteDocumentStore, RemoteFailure, SnapshotHandler, StoreResult, SubscriptionHandle, WriteMode};
use crate::keypath::KeyPath;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, JsonValue>>>,
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<Option<JsonValue>>>>>,
    faults: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation on `path` fail with `message` until cleared.
    pub async fn inject_failure(&self, path: &KeyPath, message: impl Into<String>) {
        self.faults
            .write()
            .await
            .insert(path.joined(), message.into());
    }

    pub async fn clear_failure(&self, path: &KeyPath) {
        self.faults.write().await.remove(&path.joined());
    }

    /// Raw stored payload, for assertions on what actually hit the store.
    pub async fn raw_document(&self, path: &KeyPath) -> Option<JsonValue> {
        self.documents.read().await.get(&path.joined()).cloned()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    async fn check_fault(&self, path: &KeyPath) -> StoreResult<()> {
        if let Some(message) = self.faults.read().await.get(&path.joined()) {
            return Err(RemoteFailure::new(message.clone()));
        }
        Ok(())
    }

    async fn notify(&self, key: &str, snapshot: Option<JsonValue>) {
        if let Some(sender) = self.channels.read().await.get(key) {
            // No receivers is fine; delivery is best-effort fan-out.
            let _ = sender.send(snapshot);
        }
    }
}

#[async_trait]
impl RemoteDocumentStore for MemoryDocumentStore {
    async fn read(&self, path: &KeyPath) -> StoreResult<Option<JsonValue>> {
        self.check_fault(path).await?;
        Ok(self.documents.read().await.get(&path.joined()).cloned())
    }

    async fn write(&self, path: &KeyPath, data: JsonValue, mode: WriteMode) -> StoreResult<()> {
        self.check_fault(path).await?;
        let key = path.joined();
        let stored = {
            let mut documents = self.documents.write().await;
            let next = match (mode, documents.get(&key)) {
                (WriteMode::Merge, Some(existing)) => {
                    let mut merged = existing.clone();
                    deep_merge(&mut merged, data);
                    merged
                }
                _ => data,
            };
            documents.insert(key.clone(), next.clone());
            next
        };
        self.notify(&key, Some(stored)).await;
        Ok(())
    }

    async fn delete(&self, path: &KeyPath) -> StoreResult<()> {
        self.check_fault(path).await?;
        let key = path.joined();
        self.documents.write().await.remove(&key);
        self.notify(&key, None).await;
        Ok(())
    }

    async fn subscribe(
        &self,
        path: &KeyPath,
        mut on_snapshot: SnapshotHandler,
    ) -> StoreResult<SubscriptionHandle> {
        self.check_fault(path).await?;
        let key = path.joined();

        let mut receiver = {
            let mut channels = self.channels.write().await;
            channels
                .entry(key.clone())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe()
        };
        let initial = self.documents.read().await.get(&key).cloned();

        let forwarder = tokio::spawn(async move {
            on_snapshot(Ok(initial));
            loop {
                match receiver.recv().await {
                    Ok(snapshot) => on_snapshot(Ok(snapshot)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("subscription lagged, skipped {} snapshot(s)", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(SubscriptionHandle::new(
            key,
            Box::new(move || forwarder.abort()),
        ))
    }
}

/// Recursive merge: object fields merge per key, everything else replaces.
fn deep_merge(base: &mut JsonValue, patch: JsonValue) {
    match (base, patch) {
        (JsonValue::Object(base_map), JsonValue::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(base_value) if base_value.is_object() && patch_value.is_object() => {
                        deep_merge(base_value, patch_value);
                    }
                    _ => {
                        base_map.insert(key, patch_value);
                    }
                }
            }
        }
        (base_slot, patch_value) => {
            *base_slot = patch_value;
        }
    }
}
