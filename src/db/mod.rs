// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local persistence layer (key-value storage and the offline queue).

pub mod file_store;
pub mod memory_store;
pub mod queue;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use queue::{PendingChangeQueue, QueueError};

/// Remote table names as constants.
pub mod tables {
    pub const JOURNEYS: &str = "journeys";
    pub const MOODS: &str = "moods";
    pub const EVENTS: &str = "events";
}

/// Well-known keys in local storage.
pub mod keys {
    /// Serialized array of pending changes
    pub const PENDING_CHANGES: &str = "pending_changes";
}

/// Errors from local key-value storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Synchronous key-value storage for small blobs.
///
/// Writes must be durable when `set` returns.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
