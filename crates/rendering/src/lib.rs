use bevy::prelude::*;

use simulation::SimulationUpdateSet;

pub mod camera;
pub mod scene;
pub mod signals;
pub mod vehicle_render;

use vehicle_render::VehicleMeshCache;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VehicleMeshCache>()
            .add_systems(
                Startup,
                (
                    camera::setup_camera,
                    scene::setup_lighting,
                    scene::spawn_scenery,
                    signals::spawn_signals,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    camera::camera_keyboard,
                    camera::camera_mouse,
                    camera::apply_orbit_camera,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    vehicle_render::attach_vehicle_meshes,
                    vehicle_render::sync_vehicle_transforms,
                    signals::update_signal_lamps,
                )
                    .chain()
                    .in_set(SimulationUpdateSet::Visual),
            );
    }
}
