// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw position fixes and the points derived from them.

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw position reading from the location subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in meters
    pub horizontal_accuracy: f64,
    /// Instantaneous speed in m/s (negative when unknown)
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    /// Position as a geo point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Great-circle distance to another fix, in meters.
    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        Haversine.distance(self.point(), other.point())
    }

    /// Speed in km/h, or `None` if the source reported it as unknown.
    pub fn speed_kmh(&self) -> Option<f64> {
        (self.speed >= 0.0).then(|| self.speed * 3.6)
    }
}

/// A point on a recorded trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&LocationFix> for TrackPoint {
    fn from(fix: &LocationFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
        }
    }
}

impl From<TrackPoint> for geo::Coord<f64> {
    fn from(p: TrackPoint) -> Self {
        geo::coord! { x: p.longitude, y: p.latitude }
    }
}

/// Location authorization as reported by the host OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Denied,
    Restricted,
    Authorized,
}

impl PermissionState {
    /// Whether recording may start under this permission state.
    ///
    /// `NotDetermined` is allowed: the OS prompts on first use.
    pub fn allows_tracking(self) -> bool {
        !matches!(self, PermissionState::Denied | PermissionState::Restricted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::NotDetermined => "not_determined",
            PermissionState::Denied => "denied",
            PermissionState::Restricted => "restricted",
            PermissionState::Authorized => "authorized",
        };
        f.write_str(s)
    }
}

/// Events pushed by a location source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Fix(LocationFix),
    Permission(PermissionState),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lon: f64, speed: f64) -> LocationFix {
        LocationFix {
            latitude: lat,
            longitude: lon,
            horizontal_accuracy: 5.0,
            speed,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = fix(37.0, -122.0, 0.0);
        let b = fix(38.0, -122.0, 0.0);
        let d = a.distance_to(&b);
        // One degree of latitude is roughly 111.2 km on the mean sphere
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_speed_kmh_unknown() {
        assert_eq!(fix(0.0, 0.0, -1.0).speed_kmh(), None);
        assert_eq!(fix(0.0, 0.0, 10.0).speed_kmh(), Some(36.0));
    }

    #[test]
    fn test_permission_allows_tracking() {
        assert!(PermissionState::NotDetermined.allows_tracking());
        assert!(PermissionState::Authorized.allows_tracking());
        assert!(!PermissionState::Denied.allows_tracking());
        assert!(!PermissionState::Restricted.allows_tracking());
    }
}
