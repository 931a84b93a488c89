// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregate synchronization state exposed to observers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of the sync engine, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncState {
    pub is_online: bool,
    pub is_syncing: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Number of changes waiting in the offline queue
    pub pending_count: usize,
}
