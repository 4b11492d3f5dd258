// ── Playback queue ──
//
// Ordered list of tracks behind an async RwLock. Index 0 is the track that
// is playing, or about to. Cheap to clone; clones share the same list.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, RwLockWriteGuard};

/// One playable track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueItem {
    /// Stream URI handed to the engine.
    pub uri: String,
    pub title: String,
    pub artist: String,
    /// Seconds.
    pub duration: u32,
    /// Server id of the originating entity, for scrobbling.
    pub entity_id: String,
}

/// Shared handle to the playback queue.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    items: Arc<RwLock<Vec<QueueItem>>>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, item: QueueItem) {
        self.items.write().await.push(item);
    }

    pub async fn extend(&self, items: impl IntoIterator<Item = QueueItem>) {
        self.items.write().await.extend(items);
    }

    /// Remove the item at `index`. Out of range is a no-op.
    pub async fn remove(&self, index: usize) -> Option<QueueItem> {
        let mut items = self.items.write().await;
        (index < items.len()).then(|| items.remove(index))
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    /// Drop the head, returning it.
    pub async fn pop_front(&self) -> Option<QueueItem> {
        let mut items = self.items.write().await;
        (!items.is_empty()).then(|| items.remove(0))
    }

    pub async fn head(&self) -> Option<QueueItem> {
        self.items.read().await.first().cloned()
    }

    pub async fn snapshot(&self) -> Vec<QueueItem> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Replace the whole queue with `items`.
    pub async fn replace_with(&self, items: Vec<QueueItem>) {
        *self.items.write().await = items;
    }

    /// Exclusive access for multi-step updates that must not interleave
    /// with other writers.
    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, Vec<QueueItem>> {
        self.items.write().await
    }
}
