// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fix sampling policy.
//!
//! Decides whether a raw fix becomes part of the trajectory. Accuracy and
//! speed gates remove sensor noise; the interval and distance gates thin the
//! point density to match the current travel mode.

use crate::models::{LocationFix, TransportMode};
use std::fmt;

/// Fixes with accuracy at or beyond this radius are always discarded.
pub const MAX_HORIZONTAL_ACCURACY_M: f64 = 50.0;

/// Speeds at or above this are treated as GPS jumps.
pub const MAX_PLAUSIBLE_SPEED_KMH: f64 = 200.0;

/// Slack for the distance gate so a point exactly on the threshold is not
/// lost to floating-point rounding in the haversine computation.
const DISTANCE_EPSILON_M: f64 = 1e-6;

/// Sampling constants for a build profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingProfile {
    pub name: &'static str,
    /// Minimum spacing between accepted fixes
    pub min_interval_ms: i64,
    /// Minimum movement per mode: walking, cycling, driving, flying
    pub distance_thresholds_m: [f64; 4],
    /// Accepted points required before a session may stop
    pub min_points_to_save: usize,
}

impl SamplingProfile {
    pub const PRODUCTION: SamplingProfile = SamplingProfile {
        name: "production",
        min_interval_ms: 1000,
        distance_thresholds_m: [5.0, 15.0, 50.0, 500.0],
        min_points_to_save: 2,
    };

    pub const DIAGNOSTIC: SamplingProfile = SamplingProfile {
        name: "diagnostic",
        min_interval_ms: 500,
        distance_thresholds_m: [1.0, 5.0, 10.0, 50.0],
        min_points_to_save: 1,
    };

    /// Profile selected for this build (`diagnostic` feature).
    pub const fn active() -> SamplingProfile {
        if cfg!(feature = "diagnostic") {
            Self::DIAGNOSTIC
        } else {
            Self::PRODUCTION
        }
    }

    pub fn distance_threshold_m(&self, mode: TransportMode) -> f64 {
        let idx = match mode {
            TransportMode::Walking => 0,
            TransportMode::Cycling => 1,
            TransportMode::Driving => 2,
            TransportMode::Flying => 3,
        };
        self.distance_thresholds_m[idx]
    }
}

impl Default for SamplingProfile {
    fn default() -> Self {
        Self::active()
    }
}

/// Why a fix was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    Accuracy { accuracy_m: f64 },
    TooSoon { elapsed_ms: i64 },
    TooClose { distance_m: f64, threshold_m: f64 },
    ImplausibleSpeed { speed_kmh: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Accuracy { accuracy_m } => write!(f, "accuracy {:.1}m", accuracy_m),
            Rejection::TooSoon { elapsed_ms } => write!(f, "only {}ms since last fix", elapsed_ms),
            Rejection::TooClose {
                distance_m,
                threshold_m,
            } => write!(f, "moved {:.2}m of {:.0}m", distance_m, threshold_m),
            Rejection::ImplausibleSpeed { speed_kmh } => write!(f, "speed {:.0}km/h", speed_kmh),
        }
    }
}

/// Pure accept/reject decision for candidate fixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplingFilter {
    profile: SamplingProfile,
}

impl SamplingFilter {
    pub fn new(profile: SamplingProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &SamplingProfile {
        &self.profile
    }

    /// Evaluate a candidate against the last accepted fix.
    ///
    /// The first fix of a session (`last == None`) only has to pass the
    /// accuracy gate.
    pub fn evaluate(
        &self,
        candidate: &LocationFix,
        last: Option<&LocationFix>,
        mode: TransportMode,
    ) -> Result<(), Rejection> {
        if candidate.horizontal_accuracy.is_nan()
            || candidate.horizontal_accuracy >= MAX_HORIZONTAL_ACCURACY_M
        {
            return Err(Rejection::Accuracy {
                accuracy_m: candidate.horizontal_accuracy,
            });
        }

        let Some(last) = last else {
            return Ok(());
        };

        let elapsed_ms = (candidate.timestamp - last.timestamp).num_milliseconds();
        if elapsed_ms < self.profile.min_interval_ms {
            return Err(Rejection::TooSoon { elapsed_ms });
        }

        let distance_m = candidate.distance_to(last);
        let threshold_m = self.profile.distance_threshold_m(mode);
        if distance_m + DISTANCE_EPSILON_M < threshold_m {
            return Err(Rejection::TooClose {
                distance_m,
                threshold_m,
            });
        }

        if let Some(speed_kmh) = candidate.speed_kmh() {
            if speed_kmh >= MAX_PLAUSIBLE_SPEED_KMH {
                return Err(Rejection::ImplausibleSpeed { speed_kmh });
            }
        }

        Ok(())
    }

    /// Boolean form of [`evaluate`](Self::evaluate).
    pub fn accept(
        &self,
        candidate: &LocationFix,
        last: Option<&LocationFix>,
        mode: TransportMode,
    ) -> bool {
        self.evaluate(candidate, last, mode).is_ok()
    }
}
