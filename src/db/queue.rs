// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable offline queue of changes awaiting remote confirmation.
//!
//! The whole queue is stored as one JSON array under
//! [`keys::PENDING_CHANGES`]. Every mutation rewrites that array before the
//! in-memory copy is updated, so a crash never leaves memory ahead of disk.

use super::{keys, KeyValueStore, StoreError};
use crate::models::{EntityType, PendingChange};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Ordered, write-through persisted list of [`PendingChange`]s.
pub struct PendingChangeQueue {
    store: Arc<dyn KeyValueStore>,
    changes: Mutex<Vec<PendingChange>>,
}

impl PendingChangeQueue {
    /// Open the queue, loading whatever was persisted previously.
    pub fn open(store: Arc<dyn KeyValueStore>) -> QueueResult<Self> {
        let changes: Vec<PendingChange> = match store.get(keys::PENDING_CHANGES)? {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)?,
            _ => Vec::new(),
        };

        if !changes.is_empty() {
            tracing::info!(count = changes.len(), "Loaded pending changes");
        }

        Ok(Self {
            store,
            changes: Mutex::new(changes),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingChange>> {
        // The list is only replaced after a successful persist, so a panic
        // elsewhere cannot leave it half-updated.
        self.changes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, changes: &[PendingChange]) -> QueueResult<()> {
        let bytes = serde_json::to_vec(changes)?;
        self.store.set(keys::PENDING_CHANGES, &bytes)?;
        Ok(())
    }

    /// Append a change and persist immediately.
    pub fn enqueue(&self, change: PendingChange) -> QueueResult<()> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        let (id, entity_type, action) = (change.id, change.entity_type, change.action);
        next.push(change);
        self.persist(&next)?;
        *guard = next;

        tracing::debug!(
            change_id = %id,
            entity_type = %entity_type,
            action = %action,
            pending = guard.len(),
            "Change queued"
        );
        Ok(())
    }

    /// Copy of the current queue contents, oldest first.
    pub fn snapshot(&self) -> Vec<PendingChange> {
        self.lock().clone()
    }

    /// Remove every change matching `predicate` and persist.
    ///
    /// Returns the number of changes removed. Nothing is written when no
    /// change matches.
    pub fn remove_all<F>(&self, mut predicate: F) -> QueueResult<usize>
    where
        F: FnMut(&PendingChange) -> bool,
    {
        let mut guard = self.lock();
        let next: Vec<PendingChange> = guard.iter().filter(|c| !predicate(c)).cloned().collect();
        let removed = guard.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.persist(&next)?;
        *guard = next;

        tracing::debug!(removed, pending = guard.len(), "Changes removed from queue");
        Ok(removed)
    }

    /// Whether any queued change targets this entity.
    pub fn has_pending_for(&self, entity_type: EntityType, entity_id: Uuid) -> bool {
        self.lock()
            .iter()
            .any(|c| c.entity_type == entity_type && c.entity_id == entity_id)
    }

    pub fn contains(&self, change_id: Uuid) -> bool {
        self.lock().iter().any(|c| c.id == change_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileStore, MemoryStore};
    use crate::models::{ChangeAction, EntityChange, EntityType};
    use chrono::Utc;
    use uuid::Uuid;

    fn make_change(entity_type: EntityType) -> PendingChange {
        let change = EntityChange {
            entity_type,
            entity_id: Uuid::new_v4(),
            action: ChangeAction::Delete,
            record: None,
        };
        PendingChange::from_change(&change, Utc::now()).unwrap()
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_enqueue_preserves_order() {
        let queue = PendingChangeQueue::open(Arc::new(MemoryStore::new())).unwrap();
        let a = make_change(EntityType::Journey);
        let b = make_change(EntityType::Mood);

        queue.enqueue(a.clone()).unwrap();
        queue.enqueue(b.clone()).unwrap();

        assert_eq!(queue.snapshot(), vec![a, b]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_every_mutation_is_written_through() {
        let store = MemoryStore::new();
        let queue = PendingChangeQueue::open(Arc::new(store.clone())).unwrap();
        let a = make_change(EntityType::Journey);
        queue.enqueue(a.clone()).unwrap();

        let on_disk: Vec<PendingChange> =
            serde_json::from_slice(&store.get(keys::PENDING_CHANGES).unwrap().unwrap()).unwrap();
        assert_eq!(on_disk, vec![a.clone()]);

        queue.remove_all(|c| c.id == a.id).unwrap();
        let on_disk: Vec<PendingChange> =
            serde_json::from_slice(&store.get(keys::PENDING_CHANGES).unwrap().unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }

    #[test]
    fn test_remove_all_by_predicate() {
        let queue = PendingChangeQueue::open(Arc::new(MemoryStore::new())).unwrap();
        queue.enqueue(make_change(EntityType::Journey)).unwrap();
        queue.enqueue(make_change(EntityType::Mood)).unwrap();
        queue.enqueue(make_change(EntityType::Journey)).unwrap();

        let removed = queue
            .remove_all(|c| c.entity_type == EntityType::Journey)
            .unwrap();

        assert_eq!(removed, 2);
        let left = queue.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].entity_type, EntityType::Mood);
    }

    #[test]
    fn test_has_pending_for_matches_type_and_id() {
        let queue = PendingChangeQueue::open(Arc::new(MemoryStore::new())).unwrap();
        let a = make_change(EntityType::Mood);
        queue.enqueue(a.clone()).unwrap();

        assert!(queue.has_pending_for(EntityType::Mood, a.entity_id));
        assert!(!queue.has_pending_for(EntityType::Event, a.entity_id));
        assert!(!queue.has_pending_for(EntityType::Mood, Uuid::new_v4()));
        assert!(queue.contains(a.id));

        queue.remove_all(|c| c.id == a.id).unwrap();
        assert!(!queue.has_pending_for(EntityType::Mood, a.entity_id));
        assert!(!queue.contains(a.id));
    }

    #[test]
    fn test_failed_persist_leaves_memory_unchanged() {
        let queue = PendingChangeQueue::open(Arc::new(BrokenStore)).unwrap();
        let result = queue.enqueue(make_change(EntityType::Event));

        assert!(matches!(result, Err(QueueError::Store(_))));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reopen_from_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let a = make_change(EntityType::Journey);
        {
            let store = Arc::new(FileStore::open(dir.path()).unwrap());
            let queue = PendingChangeQueue::open(store).unwrap();
            queue.enqueue(a.clone()).unwrap();
        }

        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let queue = PendingChangeQueue::open(store).unwrap();
        assert_eq!(queue.snapshot(), vec![a]);
    }

    #[test]
    fn test_corrupt_storage_is_reported() {
        let store = MemoryStore::new();
        store.set(keys::PENDING_CHANGES, b"{not an array").unwrap();

        let result = PendingChangeQueue::open(Arc::new(store));
        assert!(matches!(result, Err(QueueError::Serialization(_))));
    }
}
