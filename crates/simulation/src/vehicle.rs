use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::traffic_phase::PhaseGroup;

/// Tolerance for comparing route landmarks that should coincide off-axis.
const OFF_AXIS_TOLERANCE: f32 = 1e-4;

/// World axis a vehicle travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementAxis {
    X,
    Z,
}

impl MovementAxis {
    #[inline]
    pub fn get(self, v: Vec3) -> f32 {
        match self {
            MovementAxis::X => v.x,
            MovementAxis::Z => v.z,
        }
    }

    #[inline]
    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            MovementAxis::X => v.x = value,
            MovementAxis::Z => v.z = value,
        }
    }

    /// The two coordinates that must stay fixed while moving along this axis.
    fn off_axis(self, v: Vec3) -> (f32, f32) {
        match self {
            MovementAxis::X => (v.y, v.z),
            MovementAxis::Z => (v.x, v.y),
        }
    }
}

/// Sign of travel along the movement axis. Serialized as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum TravelDirection {
    Forward,
    Backward,
}

impl TravelDirection {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            TravelDirection::Forward => 1.0,
            TravelDirection::Backward => -1.0,
        }
    }
}

impl TryFrom<i8> for TravelDirection {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TravelDirection::Forward),
            -1 => Ok(TravelDirection::Backward),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<TravelDirection> for i8 {
    fn from(direction: TravelDirection) -> Self {
        match direction {
            TravelDirection::Forward => 1,
            TravelDirection::Backward => -1,
        }
    }
}

/// Route landmarks and motion parameters of one car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleRoute {
    pub axis: MovementAxis,
    pub direction: TravelDirection,
    pub start: Vec3,
    /// Where the car's centre halts: the stop line pulled back by half a car length.
    pub stop: Vec3,
    pub end: Vec3,
    /// World units per second.
    pub speed: f32,
    pub gate: PhaseGroup,
}

/// Geometry problems that make a route unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    NonPositiveSpeed(f32),
    NonFiniteCoordinate,
    /// start, stop and end disagree on a coordinate that should stay constant.
    OffAxisDrift,
    /// `end` does not lie in `direction` from `start`, or they coincide.
    DirectionMismatch,
    /// `stop` is not strictly between `start` and `end`.
    StopOutsideRoute,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::NonPositiveSpeed(speed) => write!(f, "speed must be positive, got {speed}"),
            RouteError::NonFiniteCoordinate => f.write_str("route contains a non-finite coordinate"),
            RouteError::OffAxisDrift => {
                f.write_str("start, stop and end must share their off-axis coordinates")
            }
            RouteError::DirectionMismatch => {
                f.write_str("end must lie in the direction of travel from start")
            }
            RouteError::StopOutsideRoute => {
                f.write_str("stop must lie strictly between start and end")
            }
        }
    }
}

impl std::error::Error for RouteError {}

impl VehicleRoute {
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(RouteError::NonPositiveSpeed(self.speed));
        }
        if !(self.start.is_finite() && self.stop.is_finite() && self.end.is_finite()) {
            return Err(RouteError::NonFiniteCoordinate);
        }

        let (sa, sb) = self.axis.off_axis(self.start);
        for point in [self.stop, self.end] {
            let (a, b) = self.axis.off_axis(point);
            if (a - sa).abs() > OFF_AXIS_TOLERANCE || (b - sb).abs() > OFF_AXIS_TOLERANCE {
                return Err(RouteError::OffAxisDrift);
            }
        }

        let sign = self.direction.sign();
        let start = self.axis.get(self.start);
        let stop = self.axis.get(self.stop);
        let end = self.axis.get(self.end);
        if (end - start) * sign <= 0.0 {
            return Err(RouteError::DirectionMismatch);
        }
        if (stop - start) * sign <= 0.0 || (end - stop) * sign <= 0.0 {
            return Err(RouteError::StopOutsideRoute);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// A simulated car. The route can only be set through [`Vehicle::new`], so
/// every `Vehicle` in the world has passed validation.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Vehicle {
    route: VehicleRoute,
}

impl Vehicle {
    pub fn new(route: VehicleRoute) -> Result<Self, RouteError> {
        route.validate()?;
        Ok(Self { route })
    }

    pub fn route(&self) -> &VehicleRoute {
        &self.route
    }

    pub fn gate(&self) -> PhaseGroup {
        self.route.gate
    }
}

/// Current world position. Written only by the kinematics system.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct VehiclePosition(pub Vec3);

/// Fixed heading, set once from configuration.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct VehicleOrientation(pub Quat);

/// Display metadata carried through from configuration.
#[derive(Component, Debug, Clone)]
pub struct VehicleStyle {
    pub name: String,
    pub color: Color,
}
