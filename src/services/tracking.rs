// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking actor.
//!
//! One task owns the [`TrackingSession`]. Commands arrive over an mpsc
//! channel and are applied in order, so fixes are never reordered; the
//! duration tick runs on the same task. Observers subscribe to
//! [`TrackingEvent`]s.

use crate::error::{TrackingError, TrackingResult};
use crate::models::{Journey, LocationEvent, LocationFix, PermissionState, TrackPoint, TransportMode};
use crate::services::sampling::SamplingProfile;
use crate::services::session::{IngestOutcome, SessionSnapshot, SessionState, TrackingSession};
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

/// Duration refresh period while recording.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Published by the tracking actor.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    Started {
        start_time: DateTime<Utc>,
    },
    PointAccepted {
        point: TrackPoint,
        point_count: usize,
        total_distance_meters: f64,
    },
    ModeChanged {
        mode: TransportMode,
    },
    Tick {
        duration_seconds: f64,
    },
    Paused,
    Resumed,
    Stopped {
        journey_id: Uuid,
        distance_meters: f64,
    },
    PermissionChanged {
        permission: PermissionState,
    },
}

enum Command {
    Start {
        reply: oneshot::Sender<TrackingResult<()>>,
    },
    Pause {
        reply: oneshot::Sender<TrackingResult<()>>,
    },
    Resume {
        reply: oneshot::Sender<TrackingResult<()>>,
    },
    Stop {
        name: Option<String>,
        reply: oneshot::Sender<TrackingResult<Journey>>,
    },
    Ingest {
        fix: LocationFix,
        reply: Option<oneshot::Sender<TrackingResult<IngestOutcome>>>,
    },
    SetPermission {
        permission: PermissionState,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cloneable handle to a running tracking actor.
#[derive(Clone)]
pub struct TrackingHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<TrackingEvent>,
}

impl TrackingHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> TrackingResult<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| TrackingError::EngineClosed)?;
        rx.await.map_err(|_| TrackingError::EngineClosed)
    }

    pub async fn start(&self) -> TrackingResult<()> {
        self.request(|reply| Command::Start { reply }).await?
    }

    pub async fn pause(&self) -> TrackingResult<()> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    pub async fn resume(&self) -> TrackingResult<()> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    /// Stop recording and return the finished journey.
    pub async fn stop(&self, name: Option<String>) -> TrackingResult<Journey> {
        self.request(|reply| Command::Stop { name, reply }).await?
    }

    /// Offer a fix and wait for the sampling decision.
    pub async fn ingest(&self, fix: LocationFix) -> TrackingResult<IngestOutcome> {
        self.request(|reply| Command::Ingest {
            fix,
            reply: Some(reply),
        })
        .await?
    }

    /// Offer a fix without waiting. Fixes that arrive outside a recording
    /// are discarded.
    pub async fn push_fix(&self, fix: LocationFix) -> TrackingResult<()> {
        self.commands
            .send(Command::Ingest { fix, reply: None })
            .await
            .map_err(|_| TrackingError::EngineClosed)
    }

    pub async fn set_permission(&self, permission: PermissionState) -> TrackingResult<()> {
        self.commands
            .send(Command::SetPermission { permission })
            .await
            .map_err(|_| TrackingError::EngineClosed)
    }

    pub async fn snapshot(&self) -> TrackingResult<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.events.subscribe()
    }

    /// Forward a location source into the actor.
    ///
    /// The task ends when the source ends or the actor shuts down.
    pub fn attach_source<S>(&self, source: S) -> JoinHandle<()>
    where
        S: Stream<Item = LocationEvent> + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            let mut source = std::pin::pin!(source);
            while let Some(event) = source.next().await {
                let sent = match event {
                    LocationEvent::Fix(fix) => handle.push_fix(fix).await,
                    LocationEvent::Permission(p) => handle.set_permission(p).await,
                };
                if sent.is_err() {
                    tracing::debug!("Tracking actor gone, detaching location source");
                    break;
                }
            }
        })
    }
}

/// Spawns and runs the tracking actor.
pub struct TrackingService {
    session: TrackingSession,
    permission: PermissionState,
    events: broadcast::Sender<TrackingEvent>,
}

impl TrackingService {
    /// Spawn the actor on the current runtime.
    pub fn spawn(
        user_id: impl Into<String>,
        profile: SamplingProfile,
        permission: PermissionState,
    ) -> TrackingHandle {
        let (commands, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let service = TrackingService {
            session: TrackingSession::new(user_id, profile),
            permission,
            events: events.clone(),
        };
        tokio::spawn(service.run(rx));

        TrackingHandle { commands, events }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        tracing::debug!(profile = self.session.profile().name, "Tracking actor started");
        let mut ticker: Option<Interval> = None;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = next_tick(&mut ticker) => self.on_tick(),
            }
            self.sync_ticker(&mut ticker);
        }

        tracing::debug!(state = %self.session.state(), "Tracking actor stopped");
    }

    fn emit(&self, event: TrackingEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Keep the tick alive exactly while recording.
    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        let recording = self.session.state() == SessionState::Recording;
        match (recording, ticker.is_some()) {
            (true, false) => {
                let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                *ticker = Some(interval);
            }
            (false, true) => *ticker = None,
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        if let Some(duration_seconds) = self.session.tick(Utc::now()) {
            self.emit(TrackingEvent::Tick { duration_seconds });
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::Pause { reply } => {
                let result = self.session.pause();
                if result.is_ok() {
                    tracing::info!("Tracking paused");
                    self.emit(TrackingEvent::Paused);
                }
                let _ = reply.send(result);
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::Stop { name, reply } => {
                let _ = reply.send(self.stop(name));
            }
            Command::Ingest { fix, reply } => {
                let result = self.ingest(&fix);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            tracing::trace!(error = %e, "Discarding fix");
                        }
                    }
                }
            }
            Command::SetPermission { permission } => self.set_permission(permission),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
        }
    }

    fn start(&mut self) -> TrackingResult<()> {
        let now = Utc::now();
        self.session.start(self.permission, now)?;
        tracing::info!(start_time = %now, "Tracking started");
        self.emit(TrackingEvent::Started { start_time: now });
        Ok(())
    }

    fn resume(&mut self) -> TrackingResult<()> {
        if !self.permission.allows_tracking() {
            return Err(TrackingError::PermissionDenied(self.permission));
        }
        self.session.resume()?;
        tracing::info!("Tracking resumed");
        self.emit(TrackingEvent::Resumed);
        Ok(())
    }

    fn stop(&mut self, name: Option<String>) -> TrackingResult<Journey> {
        let journey = self.session.stop(name, Utc::now()).map_err(|e| {
            tracing::info!(error = %e, "Stop refused");
            e
        })?;

        tracing::info!(
            journey_id = %journey.id,
            points = journey.path.len(),
            distance_m = journey.distance_meters,
            mode = %journey.transport_mode,
            "Journey recorded"
        );
        self.emit(TrackingEvent::Stopped {
            journey_id: journey.id,
            distance_meters: journey.distance_meters,
        });
        Ok(journey)
    }

    fn ingest(&mut self, fix: &LocationFix) -> TrackingResult<IngestOutcome> {
        let previous_mode = self.session.current_mode();
        let outcome = self.session.ingest(fix, Utc::now())?;

        let mode = self.session.current_mode();
        if mode != previous_mode {
            tracing::debug!(from = %previous_mode, to = %mode, "Transport mode changed");
            self.emit(TrackingEvent::ModeChanged { mode });
        }

        match outcome {
            IngestOutcome::Accepted { distance_added_m } => {
                tracing::trace!(distance_added_m, "Fix accepted");
                self.emit(TrackingEvent::PointAccepted {
                    point: TrackPoint::from(fix),
                    point_count: self.session.points().len(),
                    total_distance_meters: self.session.total_distance_meters(),
                });
            }
            IngestOutcome::Rejected(reason) => {
                tracing::trace!(reason = %reason, "Fix rejected");
            }
        }
        Ok(outcome)
    }

    fn set_permission(&mut self, permission: PermissionState) {
        if permission == self.permission {
            return;
        }
        tracing::info!(from = %self.permission, to = %permission, "Location permission changed");
        self.permission = permission;
        self.emit(TrackingEvent::PermissionChanged { permission });

        if !permission.allows_tracking()
            && self.session.state() == SessionState::Recording
            && self.session.pause().is_ok()
        {
            tracing::warn!("Permission revoked while recording, pausing");
            self.emit(TrackingEvent::Paused);
        }
    }
}

/// Resolve on the next tick, or never when no tick is running.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fix(step: u32, secs: i64) -> LocationFix {
        LocationFix {
            latitude: 37.0 + f64::from(step) * 0.0001,
            longitude: -122.0,
            horizontal_accuracy: 5.0,
            speed: 1.4,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
                + chrono::Duration::seconds(secs),
        }
    }

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let handle = TrackingService::spawn(
            "user-1",
            SamplingProfile::PRODUCTION,
            PermissionState::Authorized,
        );
        handle.start().await.unwrap();

        for step in 0..5 {
            handle.push_fix(fix(step, i64::from(step) * 2)).await.unwrap();
        }
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.point_count, 5);
        assert_eq!(snapshot.state, SessionState::Recording);
    }

    #[tokio::test]
    async fn test_revoked_permission_pauses() {
        let handle = TrackingService::spawn(
            "user-1",
            SamplingProfile::PRODUCTION,
            PermissionState::Authorized,
        );
        let mut events = handle.subscribe();
        handle.start().await.unwrap();
        handle.set_permission(PermissionState::Denied).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Paused);

        assert!(matches!(events.recv().await.unwrap(), TrackingEvent::Started { .. }));
        assert_eq!(
            events.recv().await.unwrap(),
            TrackingEvent::PermissionChanged {
                permission: PermissionState::Denied
            }
        );
        assert_eq!(events.recv().await.unwrap(), TrackingEvent::Paused);

        assert_eq!(
            handle.resume().await,
            Err(TrackingError::PermissionDenied(PermissionState::Denied))
        );
    }
}
