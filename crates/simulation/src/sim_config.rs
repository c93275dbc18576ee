//! Scene and controller configuration.
//!
//! The whole scene is data: four stock cars by default, or whatever a JSON
//! file names. Everything is validated once, before the first frame, so the
//! frame loop only ever sees well-formed routes.

use std::f32::consts::{FRAC_PI_2, PI};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    CAR_RIDE_HEIGHT, DEFAULT_CAR_SPEED, DEFAULT_CONTROLLER_ADDRESS, DEFAULT_POLL_INTERVAL,
    DEFAULT_RETRY_DELAY, EAST_WEST_ROAD_HALF_WIDTH, HALF_CAR_LENGTH, LANE_OFFSET,
    NORTH_SOUTH_ROAD_HALF_WIDTH, ROUTE_EXTENT,
};
use crate::config_error::ConfigError;
use crate::phase_channel::{validate_address, ChannelConfig};
use crate::traffic_phase::PhaseGroup;
use crate::vehicle::{MovementAxis, TravelDirection, Vehicle, VehicleRoute};

/// Path of a JSON `SimConfig` to load instead of the stock scene.
pub const CONFIG_PATH_ENV: &str = "INTERSECTION_CONFIG";
/// Overrides `controller.address` from the file or the default.
pub const CONTROLLER_URL_ENV: &str = "INTERSECTION_CONTROLLER_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub address: String,
    pub retry_delay_ms: u64,
    pub auto_connect: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTROLLER_ADDRESS.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            auto_connect: true,
        }
    }
}

fn default_speed() -> f32 {
    DEFAULT_CAR_SPEED
}

/// One car as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub name: String,
    pub axis: MovementAxis,
    pub direction: TravelDirection,
    pub start: [f32; 3],
    pub stop: [f32; 3],
    pub end: [f32; 3],
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Hex colour, `#rrggbb`.
    pub color: String,
    pub gate: PhaseGroup,
    /// Heading about +Y; 0 faces +Z.
    #[serde(default)]
    pub yaw_degrees: f32,
}

/// A validated car, ready to spawn.
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub name: String,
    pub vehicle: Vehicle,
    pub start: Vec3,
    pub orientation: Quat,
    pub color: Color,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub controller: ControllerConfig,
    pub vehicles: Vec<VehicleConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            vehicles: stock_vehicles(),
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Build the configuration from the process environment:
    /// [`CONFIG_PATH_ENV`] selects a file, [`CONTROLLER_URL_ENV`] overrides
    /// the controller address. The result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let address = std::env::var(CONTROLLER_URL_ENV).ok();
        Self::from_sources(path.as_deref(), address)
    }

    pub fn from_sources(path: Option<&Path>, address: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(address) = address {
            config.controller.address = address;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check controller settings and every route, returning spawnable cars.
    pub fn validate(&self) -> Result<Vec<VehicleSpec>, ConfigError> {
        validate_address(&self.controller.address)?;
        if self.controller.retry_delay_ms == 0 {
            return Err(ConfigError::InvalidRetryDelay);
        }
        self.vehicles.iter().map(VehicleConfig::to_spec).collect()
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            address: self.controller.address.clone(),
            retry_delay: Duration::from_millis(self.controller.retry_delay_ms),
            poll_interval: DEFAULT_POLL_INTERVAL,
            auto_connect: self.controller.auto_connect,
        }
    }
}

impl VehicleConfig {
    pub fn to_spec(&self) -> Result<VehicleSpec, ConfigError> {
        let route = VehicleRoute {
            axis: self.axis,
            direction: self.direction,
            start: Vec3::from_array(self.start),
            stop: Vec3::from_array(self.stop),
            end: Vec3::from_array(self.end),
            speed: self.speed,
            gate: self.gate,
        };
        let vehicle = Vehicle::new(route).map_err(|source| ConfigError::InvalidRoute {
            vehicle: self.name.clone(),
            source,
        })?;
        let color = Srgba::hex(&self.color).map_err(|_| ConfigError::InvalidColor {
            vehicle: self.name.clone(),
            value: self.color.clone(),
        })?;
        Ok(VehicleSpec {
            name: self.name.clone(),
            vehicle,
            start: route.start,
            orientation: Quat::from_rotation_y(self.yaw_degrees.to_radians()),
            color: color.into(),
        })
    }
}

/// The four-car scene: two cars per road, one per lane, north-south cars
/// gated by the primary group and east-west cars by the secondary group.
pub fn stock_vehicles() -> Vec<VehicleConfig> {
    let y = CAR_RIDE_HEIGHT;
    let ns_stop = EAST_WEST_ROAD_HALF_WIDTH + HALF_CAR_LENGTH;
    let ew_stop = NORTH_SOUTH_ROAD_HALF_WIDTH + HALF_CAR_LENGTH;
    let car = |name: &str,
               axis,
               direction,
               start: [f32; 3],
               stop: [f32; 3],
               end: [f32; 3],
               color: &str,
               gate,
               yaw: f32| VehicleConfig {
        name: name.to_string(),
        axis,
        direction,
        start,
        stop,
        end,
        speed: DEFAULT_CAR_SPEED,
        color: color.to_string(),
        gate,
        yaw_degrees: yaw.to_degrees(),
    };

    vec![
        // Northbound, west lane.
        car(
            "red",
            MovementAxis::Z,
            TravelDirection::Forward,
            [-LANE_OFFSET, y, -ROUTE_EXTENT],
            [-LANE_OFFSET, y, -ns_stop],
            [-LANE_OFFSET, y, ROUTE_EXTENT],
            "#e53e3e",
            PhaseGroup::Primary,
            0.0,
        ),
        // Southbound, east lane.
        car(
            "amber",
            MovementAxis::Z,
            TravelDirection::Backward,
            [LANE_OFFSET, y, ROUTE_EXTENT],
            [LANE_OFFSET, y, ns_stop],
            [LANE_OFFSET, y, -ROUTE_EXTENT],
            "#f59e0b",
            PhaseGroup::Primary,
            PI,
        ),
        // Westbound, north lane.
        car(
            "blue",
            MovementAxis::X,
            TravelDirection::Backward,
            [ROUTE_EXTENT, y, -LANE_OFFSET],
            [ew_stop, y, -LANE_OFFSET],
            [-ROUTE_EXTENT, y, -LANE_OFFSET],
            "#3b82f6",
            PhaseGroup::Secondary,
            -FRAC_PI_2,
        ),
        // Eastbound, south lane.
        car(
            "violet",
            MovementAxis::X,
            TravelDirection::Forward,
            [-ROUTE_EXTENT, y, LANE_OFFSET],
            [-ew_stop, y, LANE_OFFSET],
            [ROUTE_EXTENT, y, LANE_OFFSET],
            "#8b5cf6",
            PhaseGroup::Secondary,
            FRAC_PI_2,
        ),
    ]
}
