//! Mission profiles and the edge costs they induce.
//!
//! | Mission | Cost |
//! |---------|------|
//! | stealth | segment length |
//! | speed   | travel time, or length when no speed is known |
//! | safety  | segment length until a risk attribute exists |
//!
//! Every cost is clamped to be non-negative so shortest-path search stays
//! correct regardless of the input data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::Edge;

/// Named cost policy selecting which edge attribute drives routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissionProfile {
    /// Shortest distance.
    #[default]
    Stealth,
    /// Shortest travel time.
    Speed,
    /// Safest route. Currently distance-based.
    Safety,
}

impl MissionProfile {
    pub const ALL: [MissionProfile; 3] = [
        MissionProfile::Stealth,
        MissionProfile::Speed,
        MissionProfile::Safety,
    ];

    /// Cost of traversing `edge` under this mission.
    pub fn weight(&self, edge: &Edge) -> f64 {
        match self {
            MissionProfile::Stealth => stealth_weight(edge),
            MissionProfile::Speed => speed_weight(edge),
            MissionProfile::Safety => safety_weight(edge),
        }
    }

    /// Whether the mission needs speed and travel-time attributes on edges.
    pub fn uses_travel_time(&self) -> bool {
        matches!(self, MissionProfile::Speed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionProfile::Stealth => "stealth",
            MissionProfile::Speed => "speed",
            MissionProfile::Safety => "safety",
        }
    }
}

impl fmt::Display for MissionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionProfile {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stealth" => Ok(MissionProfile::Stealth),
            "speed" => Ok(MissionProfile::Speed),
            "safety" => Ok(MissionProfile::Safety),
            _ => Err(Error::InvalidMission {
                value: value.to_string(),
            }),
        }
    }
}

/// Anything that can score an edge for shortest-path search.
pub trait EdgeWeight {
    fn weight(&self, edge: &Edge) -> f64;
}

impl EdgeWeight for MissionProfile {
    fn weight(&self, edge: &Edge) -> f64 {
        MissionProfile::weight(self, edge)
    }
}

impl<F> EdgeWeight for F
where
    F: Fn(&Edge) -> f64,
{
    fn weight(&self, edge: &Edge) -> f64 {
        non_negative(self(edge))
    }
}

/// Distance-only cost.
pub fn stealth_weight(edge: &Edge) -> f64 {
    non_negative(edge.length_m)
}

/// Travel-time cost, falling back to length when the edge has no speed.
pub fn speed_weight(edge: &Edge) -> f64 {
    non_negative(edge.derived_travel_time().unwrap_or(edge.length_m))
}

/// Risk cost. No risk attribute is modeled yet, so this mirrors distance.
pub fn safety_weight(edge: &Edge) -> f64 {
    non_negative(edge.length_m)
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}
