//! Wire format of the intersection controller.
//!
//! The controller pushes one JSON object per phase change. Two shapes are in
//! the field:
//!
//! ```text
//! {"light1State": "green", "light2State": "red"}                      (labels)
//! {"current_light": 2, "light_timer_seconds": 12, "fast_speed": false} (numeric)
//! ```
//!
//! Both are translated into a single [`PhaseUpdate`] here so nothing downstream
//! has to know which controller generation sent the message.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::traffic_phase::TrafficPhase;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A controller message as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseMessage {
    Labels {
        #[serde(rename = "light1State")]
        light1_state: String,
        #[serde(rename = "light2State")]
        light2_state: String,
    },
    Numeric {
        current_light: i64,
        light_timer_seconds: f64,
        fast_speed: SpeedFlag,
    },
}

/// `fast_speed` arrives as a JSON boolean from newer bridges and as `0`/`1`
/// straight off the serial line from older ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeedFlag {
    Bool(bool),
    Int(i64),
}

impl SpeedFlag {
    fn to_bool(self) -> Result<bool, PayloadError> {
        match self {
            SpeedFlag::Bool(value) => Ok(value),
            SpeedFlag::Int(0) => Ok(false),
            SpeedFlag::Int(1) => Ok(true),
            SpeedFlag::Int(other) => Err(PayloadError::InvalidSpeedFlag(other)),
        }
    }
}

impl PhaseMessage {
    pub fn labels(primary: TrafficPhase, secondary: TrafficPhase) -> Self {
        PhaseMessage::Labels {
            light1_state: primary.label().to_string(),
            light2_state: secondary.label().to_string(),
        }
    }

    pub fn numeric(primary: TrafficPhase, countdown_seconds: u32, fast_speed: bool) -> Self {
        PhaseMessage::Numeric {
            current_light: light_code(primary),
            light_timer_seconds: f64::from(countdown_seconds),
            fast_speed: SpeedFlag::Bool(fast_speed),
        }
    }

    pub fn to_json(&self) -> String {
        // A derived Serialize over strings and numbers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Validate and translate into the canonical update.
    pub fn into_update(self) -> Result<PhaseUpdate, PayloadError> {
        match self {
            PhaseMessage::Labels {
                light1_state,
                light2_state,
            } => {
                let primary = TrafficPhase::from_label(&light1_state)
                    .ok_or(PayloadError::UnknownPhase(light1_state))?;
                let secondary = TrafficPhase::from_label(&light2_state)
                    .ok_or(PayloadError::UnknownPhase(light2_state))?;
                if primary == TrafficPhase::Green && secondary == TrafficPhase::Green {
                    return Err(PayloadError::ConflictingGreen);
                }
                Ok(PhaseUpdate {
                    primary,
                    secondary,
                    telemetry: None,
                })
            }
            PhaseMessage::Numeric {
                current_light,
                light_timer_seconds,
                fast_speed,
            } => {
                let primary = match current_light {
                    0 => TrafficPhase::Green,
                    1 => TrafficPhase::Yellow,
                    2 => TrafficPhase::Red,
                    other => return Err(PayloadError::UnknownLightCode(other)),
                };
                if !light_timer_seconds.is_finite() || light_timer_seconds < 0.0 {
                    return Err(PayloadError::InvalidTimer(light_timer_seconds));
                }
                Ok(PhaseUpdate {
                    primary,
                    secondary: complementary_phase(primary),
                    telemetry: Some(Telemetry {
                        countdown_seconds: light_timer_seconds as f32,
                        overspeed: fast_speed.to_bool()?,
                    }),
                })
            }
        }
    }
}

/// Numeric controllers only report the primary group. The crossing group is
/// released exactly when the primary group is held at red.
pub fn complementary_phase(primary: TrafficPhase) -> TrafficPhase {
    if primary == TrafficPhase::Red {
        TrafficPhase::Green
    } else {
        TrafficPhase::Red
    }
}

fn light_code(phase: TrafficPhase) -> i64 {
    match phase {
        TrafficPhase::Green => 0,
        TrafficPhase::Yellow => 1,
        TrafficPhase::Red | TrafficPhase::Off => 2,
    }
}

/// Parse and validate one inbound text frame.
pub fn decode_message(text: &str) -> Result<PhaseUpdate, PayloadError> {
    let message: PhaseMessage = serde_json::from_str(text)?;
    message.into_update()
}

// ---------------------------------------------------------------------------
// Canonical update
// ---------------------------------------------------------------------------

/// A validated phase change, independent of which payload shape carried it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseUpdate {
    pub primary: TrafficPhase,
    pub secondary: TrafficPhase,
    /// Countdown and speed telemetry; only numeric payloads carry it.
    pub telemetry: Option<Telemetry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub countdown_seconds: f32,
    pub overspeed: bool,
}

/// Which payload shape produced the last applied update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseUpdateKind {
    Labels,
    Numeric,
}

impl PhaseUpdate {
    pub fn kind(&self) -> PhaseUpdateKind {
        if self.telemetry.is_some() {
            PhaseUpdateKind::Numeric
        } else {
            PhaseUpdateKind::Labels
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons an inbound payload is discarded. None of these are fatal: the
/// simulation keeps running on the last applied phase.
#[derive(Debug)]
pub enum PayloadError {
    /// Not JSON, or JSON matching neither payload shape.
    Malformed(serde_json::Error),
    /// A phase label outside {red, green, yellow, off}.
    UnknownPhase(String),
    /// A numeric light code outside 0..=2.
    UnknownLightCode(i64),
    /// Negative or non-finite countdown.
    InvalidTimer(f64),
    /// An integer speed flag other than 0 or 1.
    InvalidSpeedFlag(i64),
    /// Both direction groups green at once.
    ConflictingGreen,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Malformed(e) => write!(f, "malformed payload: {e}"),
            PayloadError::UnknownPhase(label) => write!(f, "unknown phase label {label:?}"),
            PayloadError::UnknownLightCode(code) => write!(f, "unknown light code {code}"),
            PayloadError::InvalidTimer(value) => write!(f, "invalid light timer {value}"),
            PayloadError::InvalidSpeedFlag(value) => write!(f, "invalid fast_speed flag {value}"),
            PayloadError::ConflictingGreen => {
                write!(f, "both direction groups reported green")
            }
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayloadError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(e: serde_json::Error) -> Self {
        PayloadError::Malformed(e)
    }
}
