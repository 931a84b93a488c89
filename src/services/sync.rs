// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline-first synchronization with the remote store.
//!
//! Handles:
//! - Direct writes while online, falling back to the offline queue
//! - Draining the queue in single-flight passes
//! - Bounded timeouts on every remote call
//! - Publishing aggregate [`SyncState`] to observers

use crate::config::Config;
use crate::db::{PendingChangeQueue, QueueError};
use crate::error::SyncError;
use crate::models::{
    ChangeAction, EntityChange, EntityType, PendingChange, Record, SyncState, Syncable,
};
use crate::services::gateway::{GatewayError, RemoteGateway};
use chrono::Utc;
use futures_util::{stream, StreamExt};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Default bound on a single remote call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(20);

/// Default number of queued changes replayed concurrently.
pub const DEFAULT_SYNC_CONCURRENCY: usize = 8;

/// Tuning for the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub remote_timeout: Duration,
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            concurrency: DEFAULT_SYNC_CONCURRENCY,
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            remote_timeout: config.remote_timeout,
            concurrency: config.sync_concurrency.max(1),
        }
    }
}

/// What a call to [`SyncCoordinator::sync_all`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not attempted: no connectivity
    Offline,
    /// Not attempted: another pass is in flight
    AlreadySyncing,
    Completed(SyncReport),
}

/// Counts from one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    /// Failed and kept for the next pass
    pub failed: usize,
    /// Undecodable and discarded
    pub dropped: usize,
}

/// Where a saved change ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    Queued,
}

/// Clears the single-flight flag when a pass ends, however it ends.
struct SyncingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drains the offline queue against a [`RemoteGateway`].
pub struct SyncCoordinator {
    gateway: Arc<dyn RemoteGateway>,
    queue: Arc<PendingChangeQueue>,
    online: watch::Receiver<bool>,
    syncing: AtomicBool,
    state: watch::Sender<SyncState>,
    options: SyncOptions,
}

impl SyncCoordinator {
    /// Create a coordinator.
    ///
    /// `online` is the connectivity signal, usually from
    /// [`NetworkMonitor::subscribe`](crate::services::NetworkMonitor::subscribe).
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        queue: Arc<PendingChangeQueue>,
        online: watch::Receiver<bool>,
        options: SyncOptions,
    ) -> Self {
        let initial = SyncState {
            is_online: *online.borrow(),
            is_syncing: false,
            last_sync_time: None,
            pending_count: queue.len(),
        };
        let (state, _) = watch::channel(initial);

        Self {
            gateway,
            queue,
            online,
            syncing: AtomicBool::new(false),
            state,
            options,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Subscribe to sync state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Re-publish derived state (connectivity, syncing flag, queue length).
    pub fn refresh_state(&self) {
        let is_online = self.is_online();
        let is_syncing = self.is_syncing();
        let pending_count = self.queue.len();
        self.state.send_if_modified(|s| {
            let changed = s.is_online != is_online
                || s.is_syncing != is_syncing
                || s.pending_count != pending_count;
            s.is_online = is_online;
            s.is_syncing = is_syncing;
            s.pending_count = pending_count;
            changed
        });
    }

    fn try_begin(&self) -> Option<SyncingGuard<'_>> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncingGuard {
                flag: &self.syncing,
            })
    }

    /// Run a remote call under the configured timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.options.remote_timeout, call).await {
            Ok(result) => result.map_err(SyncError::from),
            Err(_) => Err(SyncError::Timeout(self.options.remote_timeout)),
        }
    }

    async fn send(
        &self,
        change_action: ChangeAction,
        table: &str,
        entity_id: Uuid,
        record: Option<&Record>,
    ) -> Result<(), SyncError> {
        match change_action {
            ChangeAction::Delete => {
                let id = entity_id.to_string();
                self.bounded(self.gateway.delete(table, &id)).await
            }
            ChangeAction::Create | ChangeAction::Update => {
                let record = record
                    .ok_or_else(|| SyncError::DecodeFailure("missing payload".to_string()))?;
                self.bounded(self.gateway.upsert(table, record)).await
            }
        }
    }

    /// Replay one queued change.
    async fn replay(&self, change: &PendingChange) -> Result<(), SyncError> {
        let record = change
            .decode_record()
            .map_err(|e| SyncError::DecodeFailure(e.to_string()))?;

        self.send(
            change.action,
            change.entity_type.table(),
            change.entity_id,
            record.as_ref(),
        )
        .await
    }

    /// Replay one entity's changes in queue order.
    ///
    /// After a retryable failure the rest of the group is deferred (`None`)
    /// so a later update can never land before an earlier create.
    async fn replay_group(
        &self,
        group: Vec<PendingChange>,
    ) -> Vec<(PendingChange, Option<Result<(), SyncError>>)> {
        let mut results = Vec::with_capacity(group.len());
        let mut blocked = false;

        for change in group {
            if blocked {
                results.push((change, None));
                continue;
            }
            let result = self.replay(&change).await;
            if matches!(&result, Err(e) if e.is_retryable()) {
                blocked = true;
            }
            results.push((change, Some(result)));
        }
        results
    }

    /// Drain the offline queue once.
    ///
    /// Returns immediately when offline or when a pass is already running;
    /// overlapping calls are dropped, not queued. Each change succeeds or
    /// fails independently. Failed changes stay queued for the next pass;
    /// undecodable ones are dropped with a warning. Changes to different
    /// entities run concurrently; changes to the same entity run in order.
    pub async fn sync_all(&self) -> SyncOutcome {
        if !self.is_online() {
            tracing::debug!("Skipping sync: offline");
            return SyncOutcome::Offline;
        }

        let Some(guard) = self.try_begin() else {
            tracing::debug!("Skipping sync: pass already in flight");
            return SyncOutcome::AlreadySyncing;
        };
        self.refresh_state();

        let snapshot = self.queue.snapshot();
        let mut report = SyncReport {
            attempted: snapshot.len(),
            ..SyncReport::default()
        };

        let groups = group_by_entity(snapshot);
        let results: Vec<Vec<(PendingChange, Option<Result<(), SyncError>>)>> =
            stream::iter(groups)
                .map(|group| self.replay_group(group))
                .buffer_unordered(self.options.concurrency.max(1))
                .collect()
                .await;

        let mut finished: HashSet<Uuid> = HashSet::new();
        for (change, result) in results.into_iter().flatten() {
            match result {
                Some(Ok(())) => {
                    report.synced += 1;
                    finished.insert(change.id);
                }
                Some(Err(e)) if !e.is_retryable() => {
                    tracing::warn!(
                        change_id = %change.id,
                        entity_type = %change.entity_type,
                        entity_id = %change.entity_id,
                        error = %e,
                        "Dropping undecodable queued change"
                    );
                    report.dropped += 1;
                    finished.insert(change.id);
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        change_id = %change.id,
                        entity_type = %change.entity_type,
                        action = %change.action,
                        error = %e,
                        transient = e.is_transient(),
                        "Queued change failed, will retry"
                    );
                    report.failed += 1;
                }
                None => {
                    tracing::debug!(
                        change_id = %change.id,
                        entity_id = %change.entity_id,
                        "Deferred behind an earlier failed change"
                    );
                    report.failed += 1;
                }
            }
        }

        if !finished.is_empty() {
            if let Err(e) = self.queue.remove_all(|c| finished.contains(&c.id)) {
                // Changes stay queued and are re-sent next pass; upserts are idempotent.
                tracing::error!(error = %e, "Failed to remove synced changes from queue");
            }
        }

        self.state.send_modify(|s| s.last_sync_time = Some(Utc::now()));
        drop(guard);
        self.refresh_state();

        tracing::info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            dropped = report.dropped,
            pending = self.queue.len(),
            "Sync pass complete"
        );

        SyncOutcome::Completed(report)
    }

    /// Apply a change, writing directly when online and queueing otherwise.
    ///
    /// A change for an entity that still has queued changes goes to the back
    /// of the queue, followed by a sync pass, so it never lands before them.
    /// Remote failures are absorbed into the queue; only local persistence
    /// failures are returned.
    pub async fn save(&self, change: EntityChange) -> Result<SaveOutcome, QueueError> {
        let online = self.is_online();
        let behind_queued = self
            .queue
            .has_pending_for(change.entity_type, change.entity_id);

        if online && !behind_queued {
            let result = self
                .send(
                    change.action,
                    change.entity_type.table(),
                    change.entity_id,
                    change.record.as_ref(),
                )
                .await;

            match result {
                Ok(()) => {
                    tracing::debug!(
                        entity_type = %change.entity_type,
                        entity_id = %change.entity_id,
                        action = %change.action,
                        "Change written directly"
                    );
                    return Ok(SaveOutcome::Written);
                }
                Err(e) => {
                    tracing::warn!(
                        entity_type = %change.entity_type,
                        entity_id = %change.entity_id,
                        error = %e,
                        transient = e.is_transient(),
                        "Direct write failed, queueing change"
                    );
                }
            }
        }

        let pending = PendingChange::from_change(&change, Utc::now())?;
        let change_id = pending.id;
        self.queue.enqueue(pending)?;
        self.refresh_state();

        if online && behind_queued {
            tracing::debug!(
                entity_type = %change.entity_type,
                entity_id = %change.entity_id,
                "Entity has queued changes, replaying in order"
            );
            self.sync_all().await;
            if !self.queue.contains(change_id) {
                return Ok(SaveOutcome::Written);
            }
        }
        Ok(SaveOutcome::Queued)
    }

    /// Create or update an entity.
    pub async fn upsert_entity<T: Syncable>(
        &self,
        entity: &T,
        action: ChangeAction,
    ) -> Result<SaveOutcome, QueueError> {
        let change = match action {
            ChangeAction::Update => EntityChange::update(entity),
            _ => EntityChange::create(entity),
        };
        self.save(change).await
    }

    pub async fn delete_entity<T: Syncable>(&self, entity_id: Uuid) -> Result<SaveOutcome, QueueError> {
        self.save(EntityChange::delete::<T>(entity_id)).await
    }

    /// Read all rows of an entity's table.
    ///
    /// Rows that fail to decode are skipped with a warning.
    pub async fn fetch<T: Syncable>(&self) -> Result<Vec<T>, SyncError> {
        let table = T::ENTITY.table();
        let records = self.bounded(self.gateway.query(table)).await?;

        let mut entities = Vec::with_capacity(records.len());
        for record in &records {
            match T::from_record(record) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    tracing::warn!(table, error = %e, "Skipping malformed remote record");
                }
            }
        }
        Ok(entities)
    }
}

/// Split a queue snapshot into per-entity groups, keeping queue order
/// within each group and first-seen order across groups.
fn group_by_entity(changes: Vec<PendingChange>) -> Vec<Vec<PendingChange>> {
    let mut groups: Vec<Vec<PendingChange>> = Vec::new();
    let mut index: HashMap<(EntityType, Uuid), usize> = HashMap::new();

    for change in changes {
        match index.entry((change.entity_type, change.entity_id)) {
            Entry::Occupied(slot) => groups[*slot.get()].push(change),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push(vec![change]);
            }
        }
    }
    groups
}
