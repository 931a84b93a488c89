// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Finalized journey record.

use crate::models::change::{EntityType, Syncable};
use crate::models::location::TrackPoint;
use crate::models::record::{Record, RecordError, RecordExt, Value};
use crate::models::transport::TransportMode;
use chrono::{DateTime, Utc};
use geo::LineString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Polyline precision used for the stored path (same as Google/Strava).
pub const PATH_PRECISION: u32 = 5;

/// A recorded journey, produced when a tracking session stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub transport_mode: TransportMode,
    /// Total great-circle distance in meters
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub path: Vec<TrackPoint>,
    pub created_at: DateTime<Utc>,
}

impl Journey {
    /// Default name, e.g. "Cycling journey on 2024-01-15".
    pub fn default_name(mode: TransportMode, start_time: DateTime<Utc>) -> String {
        format!("{} journey on {}", mode.label(), start_time.format("%Y-%m-%d"))
    }

    pub fn line_string(&self) -> LineString<f64> {
        self.path.iter().copied().map(geo::Coord::from).collect()
    }

    /// Path encoded as a Google polyline.
    pub fn encoded_path(&self) -> Result<String, String> {
        polyline::encode_coordinates(self.line_string(), PATH_PRECISION).map_err(|e| e.to_string())
    }

    /// GeoJSON feature with the path as a LineString and summary properties.
    pub fn to_geojson_feature(&self) -> geojson::Feature {
        let geometry = geojson::Geometry::new(geojson::Value::from(&self.line_string()));

        let mut properties = serde_json::Map::new();
        properties.insert("id".into(), self.id.to_string().into());
        properties.insert("name".into(), self.name.clone().into());
        properties.insert("transport_mode".into(), self.transport_mode.as_str().into());
        properties.insert("distance".into(), self.distance_meters.into());
        properties.insert("duration".into(), self.duration_seconds.into());

        geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

impl Syncable for Journey {
    const ENTITY: EntityType = EntityType::Journey;

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.insert("id".into(), self.id.into());
        r.insert("user_id".into(), self.user_id.clone().into());
        r.insert("name".into(), self.name.clone().into());
        r.insert("start_time".into(), self.start_time.into());
        r.insert("end_time".into(), self.end_time.into());
        r.insert("transport_mode".into(), self.transport_mode.as_str().into());
        r.insert("distance".into(), self.distance_meters.into());
        r.insert("duration".into(), self.duration_seconds.into());
        r.insert("created_at".into(), self.created_at.into());

        match self.encoded_path() {
            Ok(encoded) => {
                r.insert("path".into(), encoded.into());
            }
            Err(e) => {
                tracing::warn!(journey_id = %self.id, error = %e, "Failed to encode journey path");
                r.insert("path".into(), Value::Null);
            }
        }
        r
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let transport_mode = record
            .str_field("transport_mode")?
            .parse::<TransportMode>()
            .map_err(|reason| RecordError::InvalidField {
                field: "transport_mode",
                reason,
            })?;

        // Older rows carry no path; treat as an empty trajectory.
        let path = match record.opt_str("path")? {
            None => Vec::new(),
            Some(encoded) => polyline::decode_polyline(encoded, PATH_PRECISION)
                .map_err(|e| RecordError::InvalidField {
                    field: "path",
                    reason: e.to_string(),
                })?
                .0
                .into_iter()
                .map(|c| TrackPoint {
                    latitude: c.y,
                    longitude: c.x,
                })
                .collect(),
        };

        let end_time = record.time_field("end_time")?;
        let created_at = match record.opt_str("created_at")? {
            None => end_time,
            Some(_) => record.time_field("created_at")?,
        };

        Ok(Self {
            id: record.uuid_field("id")?,
            user_id: record.str_field("user_id")?.to_string(),
            name: record.str_field("name")?.to_string(),
            start_time: record.time_field("start_time")?,
            end_time,
            transport_mode,
            distance_meters: record.f64_field("distance")?,
            duration_seconds: record.f64_field("duration")?,
            path,
            created_at,
        })
    }
}
