// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mutations headed for the remote store, and their queued form.

use crate::db::tables;
use crate::models::record::{Record, RecordError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of entity that are synchronized with the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Journey,
    Mood,
    Event,
}

impl EntityType {
    /// Remote table holding this entity.
    pub fn table(self) -> &'static str {
        match self {
            EntityType::Journey => tables::JOURNEYS,
            EntityType::Mood => tables::MOODS,
            EntityType::Event => tables::EVENTS,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Journey => "journey",
            EntityType::Mood => "mood",
            EntityType::Event => "event",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// An entity that maps to a row in a remote table.
pub trait Syncable: Sized {
    const ENTITY: EntityType;

    fn entity_id(&self) -> Uuid;

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> Result<Self, RecordError>;
}

/// A write the application wants applied remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChange {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: ChangeAction,
    /// Full row for create/update; `None` for delete
    pub record: Option<Record>,
}

impl EntityChange {
    pub fn create<T: Syncable>(entity: &T) -> Self {
        Self::write(entity, ChangeAction::Create)
    }

    pub fn update<T: Syncable>(entity: &T) -> Self {
        Self::write(entity, ChangeAction::Update)
    }

    pub fn delete<T: Syncable>(entity_id: Uuid) -> Self {
        Self {
            entity_type: T::ENTITY,
            entity_id,
            action: ChangeAction::Delete,
            record: None,
        }
    }

    fn write<T: Syncable>(entity: &T, action: ChangeAction) -> Self {
        Self {
            entity_type: T::ENTITY,
            entity_id: entity.entity_id(),
            action,
            record: Some(entity.to_record()),
        }
    }
}

/// A mutation persisted in the offline queue until the remote confirms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: ChangeAction,
    /// Serialized record bytes (JSON), base64 on disk
    #[serde(with = "base64_payload")]
    pub payload: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

impl PendingChange {
    /// Freeze an entity change into its queued form.
    pub fn from_change(change: &EntityChange, now: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        let payload = change
            .record
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()?;

        Ok(Self {
            id: Uuid::new_v4(),
            entity_type: change.entity_type,
            entity_id: change.entity_id,
            action: change.action,
            payload,
            created_at: now,
        })
    }

    /// Decode the payload back into a record.
    ///
    /// Returns `Ok(None)` when there is no payload (e.g. deletes).
    pub fn decode_record(&self) -> Result<Option<Record>, serde_json::Error> {
        self.payload
            .as_deref()
            .map(serde_json::from_slice)
            .transpose()
    }
}

mod base64_payload {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_some(&BASE64.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| BASE64.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::Value;

    #[test]
    fn test_persisted_format_field_names() {
        let mut record = Record::new();
        record.insert("name".into(), Value::from("Morning walk"));
        let change = EntityChange {
            entity_type: EntityType::Journey,
            entity_id: Uuid::new_v4(),
            action: ChangeAction::Create,
            record: Some(record),
        };
        let pending = PendingChange::from_change(&change, Utc::now()).unwrap();

        let json: serde_json::Value = serde_json::to_value(&pending).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["id", "entityType", "entityId", "action", "payload", "createdAt"] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj["action"], "create");
        assert_eq!(obj["entityType"], "journey");
        assert!(obj["payload"].is_string());
    }

    #[test]
    fn test_delete_has_null_payload() {
        let change = EntityChange {
            entity_type: EntityType::Mood,
            entity_id: Uuid::new_v4(),
            action: ChangeAction::Delete,
            record: None,
        };
        let pending = PendingChange::from_change(&change, Utc::now()).unwrap();
        let json = serde_json::to_value(&pending).unwrap();
        assert!(json["payload"].is_null());
        assert_eq!(pending.decode_record().unwrap(), None);
    }

    #[test]
    fn test_payload_survives_serialization() {
        let mut record = Record::new();
        record.insert("distance".into(), Value::Double(1234.5));
        let change = EntityChange {
            entity_type: EntityType::Event,
            entity_id: Uuid::new_v4(),
            action: ChangeAction::Update,
            record: Some(record.clone()),
        };
        let pending = PendingChange::from_change(&change, Utc::now()).unwrap();
        let text = serde_json::to_string(&pending).unwrap();
        let restored: PendingChange = serde_json::from_str(&text).unwrap();

        assert_eq!(restored, pending);
        assert_eq!(restored.decode_record().unwrap(), Some(record));
    }

    #[test]
    fn test_garbage_payload_fails_to_decode() {
        let pending = PendingChange {
            id: Uuid::new_v4(),
            entity_type: EntityType::Journey,
            entity_id: Uuid::new_v4(),
            action: ChangeAction::Create,
            payload: Some(b"not json".to_vec()),
            created_at: Utc::now(),
        };
        assert!(pending.decode_record().is_err());
    }

    #[test]
    fn test_entity_tables() {
        assert_eq!(EntityType::Journey.table(), "journeys");
        assert_eq!(EntityType::Mood.table(), "moods");
        assert_eq!(EntityType::Event.table(), "events");
    }
}
