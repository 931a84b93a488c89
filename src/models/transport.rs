// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel modes and the speed classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete travel mode derived from instantaneous speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Walking,
    Cycling,
    Driving,
    Flying,
}

impl TransportMode {
    /// All modes ordered fastest first (classification order).
    pub const FASTEST_FIRST: [TransportMode; 4] = [
        TransportMode::Flying,
        TransportMode::Driving,
        TransportMode::Cycling,
        TransportMode::Walking,
    ];

    /// Half-open speed interval `[min, max)` in km/h.
    pub fn speed_range_kmh(self) -> (f64, f64) {
        match self {
            TransportMode::Walking => (0.0, 10.0),
            TransportMode::Cycling => (10.0, 30.0),
            TransportMode::Driving => (30.0, 120.0),
            TransportMode::Flying => (120.0, 1000.0),
        }
    }

    /// Classify an instantaneous speed in km/h.
    ///
    /// Negative speeds clamp to walking, anything at or above 1000 km/h to flying.
    pub fn classify(speed_kmh: f64) -> TransportMode {
        if speed_kmh.is_nan() || speed_kmh < 0.0 {
            return TransportMode::Walking;
        }
        for mode in Self::FASTEST_FIRST {
            let (min, _) = mode.speed_range_kmh();
            if speed_kmh >= min {
                return mode;
            }
        }
        TransportMode::Walking
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Cycling => "cycling",
            TransportMode::Driving => "driving",
            TransportMode::Flying => "flying",
        }
    }

    /// Capitalized label for display and default journey names.
    pub fn label(self) -> &'static str {
        match self {
            TransportMode::Walking => "Walking",
            TransportMode::Cycling => "Cycling",
            TransportMode::Driving => "Driving",
            TransportMode::Flying => "Flying",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walking" => Ok(TransportMode::Walking),
            "cycling" => Ok(TransportMode::Cycling),
            "driving" => Ok(TransportMode::Driving),
            "flying" => Ok(TransportMode::Flying),
            other => Err(format!("unknown transport mode '{}'", other)),
        }
    }
}

/// Map a speed in km/h to a travel mode.
pub fn classify(speed_kmh: f64) -> TransportMode {
    TransportMode::classify(speed_kmh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_boundaries() {
        assert_eq!(classify(9.999), TransportMode::Walking);
        assert_eq!(classify(10.0), TransportMode::Cycling);
        assert_eq!(classify(29.999), TransportMode::Cycling);
        assert_eq!(classify(30.0), TransportMode::Driving);
        assert_eq!(classify(120.0), TransportMode::Flying);
    }

    #[test]
    fn test_classifier_clamps() {
        assert_eq!(classify(-5.0), TransportMode::Walking);
        assert_eq!(classify(1500.0), TransportMode::Flying);
        assert_eq!(classify(f64::NAN), TransportMode::Walking);
    }

    #[test]
    fn test_intervals_are_contiguous() {
        let mut modes = TransportMode::FASTEST_FIRST;
        modes.reverse();
        assert_eq!(modes[0].speed_range_kmh().0, 0.0);
        for pair in modes.windows(2) {
            assert_eq!(pair[0].speed_range_kmh().1, pair[1].speed_range_kmh().0);
        }
        assert_eq!(modes[3].speed_range_kmh().1, 1000.0);
    }

    #[test]
    fn test_round_trip_names() {
        for mode in TransportMode::FASTEST_FIRST {
            assert_eq!(mode.as_str().parse::<TransportMode>(), Ok(mode));
        }
        assert!("teleporting".parse::<TransportMode>().is_err());
    }
}
