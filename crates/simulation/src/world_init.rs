use bevy::prelude::*;

use crate::config_error::ConfigError;
use crate::sim_config::{SimConfig, VehicleSpec};
use crate::vehicle::{VehicleOrientation, VehiclePosition, VehicleStyle};

/// Marker resource that, when present, causes `spawn_vehicles` to skip the
/// configured scene. Used by the test harness to start with an empty road.
#[derive(Resource)]
pub struct SkipWorldInit;

/// Spawn one entity per configured car.
///
/// The configuration is normally validated before the app is built; a config
/// that fails here is logged and spawns nothing.
pub fn spawn_vehicles(
    mut commands: Commands,
    config: Res<SimConfig>,
    skip: Option<Res<SkipWorldInit>>,
) {
    if skip.is_some() {
        return;
    }
    match spawn_scene(&mut commands, &config) {
        Ok(count) => info!("spawned {count} vehicles"),
        Err(e) => error!("scene not spawned: {e}"),
    }
}

fn spawn_scene(commands: &mut Commands, config: &SimConfig) -> Result<usize, ConfigError> {
    let specs = config.validate()?;
    let count = specs.len();
    for spec in specs {
        spawn_vehicle(commands, spec);
    }
    Ok(count)
}

pub fn spawn_vehicle(commands: &mut Commands, spec: VehicleSpec) -> Entity {
    commands
        .spawn((
            Name::new(spec.name.clone()),
            VehiclePosition(spec.start),
            VehicleOrientation(spec.orientation),
            VehicleStyle {
                name: spec.name,
                color: spec.color,
            },
            spec.vehicle,
        ))
        .id()
}
