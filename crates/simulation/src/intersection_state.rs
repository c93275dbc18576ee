use std::fmt;

use bevy::prelude::*;

use crate::phase_protocol::{PhaseUpdate, PhaseUpdateKind};
use crate::traffic_phase::{PhaseGroup, TrafficPhase};

/// Lifecycle of the controller connection, as last observed by the frame loop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No channel has been opened (or it was closed explicitly).
    #[default]
    Idle,
    Connecting,
    Connected,
    /// The socket closed with the given close code; a retry is pending.
    Disconnected { code: u16, reason: String },
    /// A socket error was observed. The close that follows decides what happens next.
    Error(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Idle => f.write_str("Idle"),
            ConnectionStatus::Connecting => f.write_str("Connecting"),
            ConnectionStatus::Connected => f.write_str("Connected"),
            ConnectionStatus::Disconnected { code, reason } if reason.is_empty() => {
                write!(f, "Disconnected ({code})")
            }
            ConnectionStatus::Disconnected { code, reason } => {
                write!(f, "Disconnected ({code}: {reason})")
            }
            ConnectionStatus::Error(cause) => write!(f, "Error: {cause}"),
        }
    }
}

/// Phase state mirrored from the remote controller.
///
/// Read by the kinematics system and the presentation layer every frame. The
/// only writer is the phase channel: mutation methods are crate-private and
/// called from `phase_channel` alone.
#[derive(Resource, Debug, Clone)]
pub struct IntersectionState {
    primary: TrafficPhase,
    secondary: TrafficPhase,
    countdown_seconds: f32,
    overspeed: bool,
    connection: ConnectionStatus,
    last_update: Option<PhaseUpdateKind>,
    updates_applied: u64,
}

impl Default for IntersectionState {
    /// Before the controller speaks, north-south traffic holds and east-west flows.
    fn default() -> Self {
        Self {
            primary: TrafficPhase::Red,
            secondary: TrafficPhase::Green,
            countdown_seconds: 0.0,
            overspeed: false,
            connection: ConnectionStatus::Idle,
            last_update: None,
            updates_applied: 0,
        }
    }
}

impl IntersectionState {
    pub fn phase(&self, group: PhaseGroup) -> TrafficPhase {
        match group {
            PhaseGroup::Primary => self.primary,
            PhaseGroup::Secondary => self.secondary,
        }
    }

    pub fn primary_phase(&self) -> TrafficPhase {
        self.primary
    }

    pub fn secondary_phase(&self) -> TrafficPhase {
        self.secondary
    }

    pub fn countdown_seconds(&self) -> f32 {
        self.countdown_seconds
    }

    pub fn overspeed(&self) -> bool {
        self.overspeed
    }

    pub fn connection_status(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn last_update(&self) -> Option<PhaseUpdateKind> {
        self.last_update
    }

    /// Number of controller messages applied since startup.
    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    /// Apply a validated update. Label payloads carry no telemetry, so the
    /// countdown and overspeed flag keep their last reported values.
    pub(crate) fn apply_update(&mut self, update: &PhaseUpdate) {
        self.primary = update.primary;
        self.secondary = update.secondary;
        if let Some(telemetry) = update.telemetry {
            self.countdown_seconds = telemetry.countdown_seconds.max(0.0);
            self.overspeed = telemetry.overspeed;
        }
        self.last_update = Some(update.kind());
        self.updates_applied += 1;
    }

    pub(crate) fn set_connection_status(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }
}
