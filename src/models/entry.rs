// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-generated entries (moods and events) that can attach to a journey.

use crate::models::change::{EntityType, Syncable};
use crate::models::record::{Record, RecordError, RecordExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A mood check-in, optionally tied to a place and a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: String,
    /// Journey this mood belongs to, backfilled once the journey is saved
    pub journey_id: Option<Uuid>,
    pub mood: String,
    pub note: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Syncable for MoodEntry {
    const ENTITY: EntityType = EntityType::Mood;

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.insert("id".into(), self.id.into());
        r.insert("user_id".into(), self.user_id.clone().into());
        r.insert("journey_id".into(), self.journey_id.into());
        r.insert("mood".into(), self.mood.clone().into());
        r.insert("note".into(), self.note.clone().into());
        r.insert("latitude".into(), self.latitude.into());
        r.insert("longitude".into(), self.longitude.into());
        r.insert("created_at".into(), self.created_at.into());
        r
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.uuid_field("id")?,
            user_id: record.str_field("user_id")?.to_string(),
            journey_id: record.opt_uuid("journey_id")?,
            mood: record.str_field("mood")?.to_string(),
            note: record.opt_str("note")?.map(str::to_string),
            latitude: record.opt_f64("latitude")?,
            longitude: record.opt_f64("longitude")?,
            created_at: record.time_field("created_at")?,
        })
    }
}

/// Something noteworthy that happened, e.g. a photo stop or a landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub id: Uuid,
    pub user_id: String,
    pub journey_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Syncable for EventEntry {
    const ENTITY: EntityType = EntityType::Event;

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.insert("id".into(), self.id.into());
        r.insert("user_id".into(), self.user_id.clone().into());
        r.insert("journey_id".into(), self.journey_id.into());
        r.insert("title".into(), self.title.clone().into());
        r.insert("description".into(), self.description.clone().into());
        r.insert("latitude".into(), self.latitude.into());
        r.insert("longitude".into(), self.longitude.into());
        r.insert("occurred_at".into(), self.occurred_at.into());
        r.insert("created_at".into(), self.created_at.into());
        r
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.uuid_field("id")?,
            user_id: record.str_field("user_id")?.to_string(),
            journey_id: record.opt_uuid("journey_id")?,
            title: record.str_field("title")?.to_string(),
            description: record.opt_str("description")?.map(str::to_string),
            latitude: record.opt_f64("latitude")?,
            longitude: record.opt_f64("longitude")?,
            occurred_at: record.time_field("occurred_at")?,
            created_at: record.time_field("created_at")?,
        })
    }
}
