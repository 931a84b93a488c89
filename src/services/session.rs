// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording session state machine.
//!
//! `Idle → Recording ⇄ Paused`, and `Recording → Idle` via a successful
//! stop. Every operation takes the current time explicitly so the machine is
//! deterministic; the tracking actor supplies the clock.

use crate::error::{TrackingError, TrackingResult};
use crate::models::{classify, Journey, LocationFix, PermissionState, TrackPoint, TransportMode};
use crate::services::sampling::{Rejection, SamplingFilter, SamplingProfile};
use crate::time_utils::seconds_between;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Result of offering a fix to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    Accepted { distance_added_m: f64 },
    Rejected(Rejection),
}

/// Read-only view of a session for observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub start_time: Option<DateTime<Utc>>,
    pub point_count: usize,
    pub total_distance_meters: f64,
    pub duration_seconds: f64,
    pub current_mode: TransportMode,
    pub last_point: Option<TrackPoint>,
}

/// A single user's recording session.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    user_id: String,
    filter: SamplingFilter,
    state: SessionState,
    start_time: Option<DateTime<Utc>>,
    points: Vec<TrackPoint>,
    total_distance_meters: f64,
    duration_seconds: f64,
    current_mode: TransportMode,
    last_accepted_fix: Option<LocationFix>,
    last_accepted_time: Option<DateTime<Utc>>,
}

impl TrackingSession {
    pub fn new(user_id: impl Into<String>, profile: SamplingProfile) -> Self {
        Self {
            user_id: user_id.into(),
            filter: SamplingFilter::new(profile),
            state: SessionState::Idle,
            start_time: None,
            points: Vec::new(),
            total_distance_meters: 0.0,
            duration_seconds: 0.0,
            current_mode: TransportMode::default(),
            last_accepted_fix: None,
            last_accepted_time: None,
        }
    }

    fn require(&self, expected: SessionState, operation: &'static str) -> TrackingResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TrackingError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.start_time = None;
        self.points = Vec::new();
        self.total_distance_meters = 0.0;
        self.duration_seconds = 0.0;
        self.current_mode = TransportMode::default();
        self.last_accepted_fix = None;
        self.last_accepted_time = None;
    }

    /// Begin recording. Only legal from `Idle`.
    pub fn start(&mut self, permission: PermissionState, now: DateTime<Utc>) -> TrackingResult<()> {
        self.require(SessionState::Idle, "start")?;
        if !permission.allows_tracking() {
            return Err(TrackingError::PermissionDenied(permission));
        }

        self.reset();
        self.state = SessionState::Recording;
        self.start_time = Some(now);
        Ok(())
    }

    /// Offer a raw fix. Only legal while `Recording`.
    ///
    /// The travel mode is re-classified from the fix speed before sampling,
    /// even if the fix is then rejected.
    pub fn ingest(&mut self, fix: &LocationFix, now: DateTime<Utc>) -> TrackingResult<IngestOutcome> {
        self.require(SessionState::Recording, "ingest")?;

        self.current_mode = classify(fix.speed * 3.6);

        if let Err(rejection) =
            self.filter
                .evaluate(fix, self.last_accepted_fix.as_ref(), self.current_mode)
        {
            return Ok(IngestOutcome::Rejected(rejection));
        }

        let distance_added_m = self
            .last_accepted_fix
            .as_ref()
            .map_or(0.0, |last| fix.distance_to(last));

        self.points.push(TrackPoint::from(fix));
        self.total_distance_meters += distance_added_m;
        self.last_accepted_fix = Some(*fix);
        self.last_accepted_time = Some(now);

        Ok(IngestOutcome::Accepted { distance_added_m })
    }

    /// Suspend ingestion, keeping accumulated state.
    pub fn pause(&mut self) -> TrackingResult<()> {
        self.require(SessionState::Recording, "pause")?;
        self.state = SessionState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> TrackingResult<()> {
        self.require(SessionState::Paused, "resume")?;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Recompute the elapsed duration (wall clock since start).
    ///
    /// Returns the new duration, or `None` when not recording.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<f64> {
        if self.state != SessionState::Recording {
            return None;
        }
        let start = self.start_time?;
        self.duration_seconds = seconds_between(start, now).max(0.0);
        Some(self.duration_seconds)
    }

    /// Finish recording and build a journey.
    ///
    /// Fails without changing state when too few points were accepted.
    pub fn stop(&mut self, name: Option<String>, now: DateTime<Utc>) -> TrackingResult<Journey> {
        self.require(SessionState::Recording, "stop")?;

        let need = self.filter.profile().min_points_to_save;
        if self.points.len() < need {
            return Err(TrackingError::InsufficientPoints {
                have: self.points.len(),
                need,
            });
        }

        // start_time is always set while recording
        let start_time = self.start_time.unwrap_or(now);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| Journey::default_name(self.current_mode, start_time));

        let journey = Journey {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            name,
            start_time,
            end_time: now,
            transport_mode: self.current_mode,
            distance_meters: self.total_distance_meters,
            duration_seconds: seconds_between(start_time, now).max(0.0),
            path: std::mem::take(&mut self.points),
            created_at: now,
        };

        self.reset();
        Ok(journey)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &SamplingProfile {
        self.filter.profile()
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.total_distance_meters
    }

    pub fn current_mode(&self) -> TransportMode {
        self.current_mode
    }

    pub fn last_accepted_time(&self) -> Option<DateTime<Utc>> {
        self.last_accepted_time
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            start_time: self.start_time,
            point_count: self.points.len(),
            total_distance_meters: self.total_distance_meters,
            duration_seconds: self.duration_seconds,
            current_mode: self.current_mode,
            last_point: self.points.last().copied(),
        }
    }
}
