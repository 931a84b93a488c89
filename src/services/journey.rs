// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey persistence and entries attached to a recording.
//!
//! Moods and events are saved as soon as they are recorded. Those recorded
//! during an active session have no journey yet; once the journey is saved
//! they are linked to it with an update.

use crate::error::{JourneyError, SyncError};
use crate::models::{ChangeAction, EventEntry, Journey, MoodEntry, TrackPoint};
use crate::services::session::SessionState;
use crate::services::sync::{SaveOutcome, SyncCoordinator};
use crate::services::tracking::TrackingHandle;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Entries waiting for the current session's journey id.
#[derive(Debug, Default)]
struct SessionEntries {
    moods: Vec<MoodEntry>,
    events: Vec<EventEntry>,
}

/// Records journeys, moods and events for one user.
pub struct JourneyService {
    user_id: String,
    tracking: TrackingHandle,
    sync: Arc<SyncCoordinator>,
    session_entries: Mutex<SessionEntries>,
}

impl JourneyService {
    pub fn new(user_id: impl Into<String>, tracking: TrackingHandle, sync: Arc<SyncCoordinator>) -> Self {
        Self {
            user_id: user_id.into(),
            tracking,
            sync,
            session_entries: Mutex::new(SessionEntries::default()),
        }
    }

    pub fn tracking(&self) -> &TrackingHandle {
        &self.tracking
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, SessionEntries> {
        self.session_entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn session_active(&self) -> bool {
        matches!(
            self.tracking.snapshot().await,
            Ok(snapshot) if snapshot.state != SessionState::Idle
        )
    }

    /// Record a mood check-in.
    pub async fn record_mood(
        &self,
        mood: impl Into<String>,
        note: Option<String>,
        location: Option<TrackPoint>,
    ) -> Result<MoodEntry, JourneyError> {
        let entry = MoodEntry {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            journey_id: None,
            mood: mood.into(),
            note,
            latitude: location.map(|p| p.latitude),
            longitude: location.map(|p| p.longitude),
            created_at: Utc::now(),
        };

        let outcome = self.sync.upsert_entity(&entry, ChangeAction::Create).await?;
        tracing::info!(mood_id = %entry.id, mood = %entry.mood, ?outcome, "Mood recorded");

        if self.session_active().await {
            self.entries().moods.push(entry.clone());
        }
        Ok(entry)
    }

    /// Record a notable event.
    pub async fn record_event(
        &self,
        title: impl Into<String>,
        description: Option<String>,
        location: Option<TrackPoint>,
        occurred_at: DateTime<Utc>,
    ) -> Result<EventEntry, JourneyError> {
        let entry = EventEntry {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            journey_id: None,
            title: title.into(),
            description,
            latitude: location.map(|p| p.latitude),
            longitude: location.map(|p| p.longitude),
            occurred_at,
            created_at: Utc::now(),
        };

        let outcome = self.sync.upsert_entity(&entry, ChangeAction::Create).await?;
        tracing::info!(event_id = %entry.id, title = %entry.title, ?outcome, "Event recorded");

        if self.session_active().await {
            self.entries().events.push(entry.clone());
        }
        Ok(entry)
    }

    /// Stop the session, save the journey and link the session's entries.
    ///
    /// If the session cannot stop (e.g. too few points) nothing is saved
    /// and the entries stay pending.
    pub async fn finish(&self, name: Option<String>) -> Result<Journey, JourneyError> {
        let journey = self.tracking.stop(name).await?;

        let outcome = self.sync.upsert_entity(&journey, ChangeAction::Create).await?;
        tracing::info!(journey_id = %journey.id, ?outcome, "Journey saved");

        let SessionEntries { moods, events } = std::mem::take(&mut *self.entries());
        let mut linked = 0usize;

        for mut mood in moods {
            mood.journey_id = Some(journey.id);
            match self.sync.upsert_entity(&mood, ChangeAction::Update).await {
                Ok(_) => linked += 1,
                Err(e) => {
                    tracing::error!(mood_id = %mood.id, error = %e, "Failed to link mood to journey");
                }
            }
        }
        for mut event in events {
            event.journey_id = Some(journey.id);
            match self.sync.upsert_entity(&event, ChangeAction::Update).await {
                Ok(_) => linked += 1,
                Err(e) => {
                    tracing::error!(event_id = %event.id, error = %e, "Failed to link event to journey");
                }
            }
        }

        if linked > 0 {
            tracing::debug!(journey_id = %journey.id, linked, "Linked session entries");
        }
        Ok(journey)
    }

    pub async fn delete_journey(&self, journey_id: Uuid) -> Result<SaveOutcome, JourneyError> {
        let outcome = self.sync.delete_entity::<Journey>(journey_id).await?;
        tracing::info!(journey_id = %journey_id, ?outcome, "Journey deleted");
        Ok(outcome)
    }

    /// The user's journeys from the remote store.
    pub async fn journeys(&self) -> Result<Vec<Journey>, SyncError> {
        let mut journeys: Vec<Journey> = self
            .sync
            .fetch::<Journey>()
            .await?
            .into_iter()
            .filter(|j| j.user_id == self.user_id)
            .collect();
        journeys.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(journeys)
    }
}
