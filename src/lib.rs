// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey Tracker: offline-first trajectory capture and sync
//!
//! This crate records GPS journeys (sampling raw fixes, classifying the
//! travel mode, accumulating distance) and synchronizes journeys, moods and
//! events with a remote store through a durable offline queue.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{KeyValueStore, PendingChangeQueue, QueueError};
use models::PermissionState;
use services::{
    JourneyService, NetworkMonitor, RemoteGateway, SamplingProfile, SyncCoordinator, SyncOptions,
    TrackingHandle, TrackingService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub network: NetworkMonitor,
    pub sync: Arc<SyncCoordinator>,
    pub journeys: JourneyService,
}

impl AppState {
    /// Wire up the capture and sync engines.
    ///
    /// Spawns the tracking actor and the reconnect trigger, so this must be
    /// called from within a tokio runtime.
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn RemoteGateway>,
        initially_online: bool,
        permission: PermissionState,
    ) -> Result<Self, QueueError> {
        let queue = Arc::new(PendingChangeQueue::open(store)?);
        tracing::info!(pending = queue.len(), "Offline queue loaded");

        let network = NetworkMonitor::new(initially_online);
        let sync = Arc::new(SyncCoordinator::new(
            gateway,
            queue,
            network.subscribe(),
            SyncOptions::from(&config),
        ));
        network.spawn_sync_trigger(sync.clone());

        let profile = SamplingProfile::active();
        let tracking = TrackingService::spawn(config.user_id.clone(), profile, permission);
        let journeys = JourneyService::new(config.user_id.clone(), tracking, sync.clone());

        tracing::info!(
            user_id = %config.user_id,
            profile = profile.name,
            online = initially_online,
            "Journey tracker initialized"
        );

        Ok(Self {
            config,
            network,
            sync,
            journeys,
        })
    }

    pub fn tracking(&self) -> &TrackingHandle {
        self.journeys.tracking()
    }
}
