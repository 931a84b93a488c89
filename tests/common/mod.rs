// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use journey_tracker::db::{MemoryStore, PendingChangeQueue};
use journey_tracker::models::{LocationFix, Record};
use journey_tracker::services::{
    GatewayError, NetworkMonitor, RemoteGateway, SyncCoordinator, SyncOptions,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory remote store with scripted failures.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockGateway {
    rows: Mutex<HashMap<String, Vec<Record>>>,
    failing_ids: Mutex<HashSet<String>>,
    failing_tables: Mutex<HashSet<String>>,
    deletes: Mutex<Vec<(String, String)>>,
    latency: Option<std::time::Duration>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps first, so concurrent callers overlap.
    pub fn with_latency(latency: std::time::Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Fail every call for this entity id until cleared.
    pub fn fail_id(&self, id: impl ToString) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    /// Fail every write to this table until cleared.
    pub fn fail_table(&self, table: &str) {
        self.failing_tables.lock().unwrap().insert(table.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_ids.lock().unwrap().clear();
        self.failing_tables.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.deletes.lock().unwrap().clone()
    }

    /// Insert a row directly, bypassing the failure script.
    pub fn seed(&self, table: &str, record: Record) {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record);
    }

    async fn begin(&self, table: &str, id: &str) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing_ids.lock().unwrap().contains(id)
            || self.failing_tables.lock().unwrap().contains(table)
        {
            return Err(GatewayError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[allow(dead_code)]
fn record_id(record: &Record) -> String {
    record
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn upsert(&self, table: &str, record: &Record) -> Result<(), GatewayError> {
        let id = record_id(record);
        self.begin(table, &id).await?;

        let mut rows = self.rows.lock().unwrap();
        let table_rows = rows.entry(table.to_string()).or_default();
        table_rows.retain(|r| record_id(r) != id);
        table_rows.push(record.clone());
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), GatewayError> {
        self.begin(table, id).await?;

        self.deletes
            .lock()
            .unwrap()
            .push((table.to_string(), id.to_string()));
        if let Some(rows) = self.rows.lock().unwrap().get_mut(table) {
            rows.retain(|r| record_id(r) != id);
        }
        Ok(())
    }

    async fn query(&self, table: &str) -> Result<Vec<Record>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows(table))
    }
}

/// Coordinator over a fresh in-memory store.
#[allow(dead_code)]
pub struct TestSync {
    pub gateway: Arc<MockGateway>,
    pub store: MemoryStore,
    pub network: NetworkMonitor,
    pub sync: Arc<SyncCoordinator>,
}

#[allow(dead_code)]
pub fn test_sync(gateway: MockGateway, online: bool) -> TestSync {
    test_sync_with_store(gateway, MemoryStore::new(), online)
}

#[allow(dead_code)]
pub fn test_sync_with_store(gateway: MockGateway, store: MemoryStore, online: bool) -> TestSync {
    let gateway = Arc::new(gateway);
    let queue =
        PendingChangeQueue::open(Arc::new(store.clone())).expect("Failed to open queue");
    let network = NetworkMonitor::new(online);
    let sync = Arc::new(SyncCoordinator::new(
        gateway.clone(),
        Arc::new(queue),
        network.subscribe(),
        SyncOptions::default(),
    ));

    TestSync {
        gateway,
        store,
        network,
        sync,
    }
}

/// 2024-01-15 10:00:00 UTC
#[allow(dead_code)]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

/// A good-accuracy fix `ms` milliseconds after [`base_time`].
#[allow(dead_code)]
pub fn fix(latitude: f64, longitude: f64, ms: i64, speed: f64) -> LocationFix {
    LocationFix {
        latitude,
        longitude,
        horizontal_accuracy: 5.0,
        speed,
        timestamp: base_time() + Duration::milliseconds(ms),
    }
}

/// Latitude offset (degrees) that moves `meters` due north.
///
/// Great-circle distance along a meridian is linear in latitude, so a
/// measured reference step scales exactly.
#[allow(dead_code)]
pub fn north_offset_deg(meters: f64) -> f64 {
    const STEP_DEG: f64 = 0.001;
    let reference = fix(37.0, -122.0, 0, 1.0).distance_to(&fix(37.0 + STEP_DEG, -122.0, 0, 1.0));
    STEP_DEG * meters / reference
}

/// Walking-speed fixes spaced `spacing_m` apart and two seconds apart.
#[allow(dead_code)]
pub fn walking_track(count: usize, spacing_m: f64) -> Vec<LocationFix> {
    let step = north_offset_deg(spacing_m);
    (0..count)
        .map(|i| fix(37.0 + step * i as f64, -122.0, i as i64 * 2000, 1.4))
        .collect()
}
