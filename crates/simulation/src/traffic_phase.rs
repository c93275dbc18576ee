use std::fmt;

use serde::{Deserialize, Serialize};

/// Signal state shown to one direction group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficPhase {
    Green,
    Yellow,
    #[default]
    Red,
    Off,
}

impl TrafficPhase {
    pub const ALL: [TrafficPhase; 4] = [
        TrafficPhase::Green,
        TrafficPhase::Yellow,
        TrafficPhase::Red,
        TrafficPhase::Off,
    ];

    /// Parse a wire label. Labels are lower case; anything else is rejected.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "green" => Some(TrafficPhase::Green),
            "yellow" => Some(TrafficPhase::Yellow),
            "red" => Some(TrafficPhase::Red),
            "off" => Some(TrafficPhase::Off),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrafficPhase::Green => "green",
            TrafficPhase::Yellow => "yellow",
            TrafficPhase::Red => "red",
            TrafficPhase::Off => "off",
        }
    }

    /// Whether an approaching vehicle must hold at its stop line.
    /// Yellow is treated as red for motion.
    pub fn forbids_entry(self) -> bool {
        matches!(self, TrafficPhase::Red | TrafficPhase::Yellow)
    }
}

impl fmt::Display for TrafficPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two perpendicular direction groups of the intersection.
///
/// `Primary` is the north-south road (controller light 1), `Secondary` the
/// east-west road (controller light 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseGroup {
    Primary,
    Secondary,
}

impl PhaseGroup {
    pub fn label(self) -> &'static str {
        match self {
            PhaseGroup::Primary => "N/S (light 1)",
            PhaseGroup::Secondary => "E/W (light 2)",
        }
    }

    pub fn other(self) -> Self {
        match self {
            PhaseGroup::Primary => PhaseGroup::Secondary,
            PhaseGroup::Secondary => PhaseGroup::Primary,
        }
    }
}
