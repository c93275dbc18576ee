use bevy::prelude::*;

pub mod config;
pub mod config_error;
pub mod frame_scheduler;
pub mod intersection_state;
pub mod phase_channel;
pub mod phase_protocol;
pub mod sim_config;
pub mod simulation_sets;
pub mod traffic_phase;
pub mod vehicle;
pub mod vehicle_kinematics;
pub mod world_init;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use simulation_sets::SimulationUpdateSet;

use intersection_state::IntersectionState;
use sim_config::SimConfig;

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // A validated SimConfig inserted by the host wins over the stock scene.
        app.init_resource::<SimConfig>()
            .init_resource::<IntersectionState>()
            .configure_sets(
                Update,
                (
                    SimulationUpdateSet::Network,
                    SimulationUpdateSet::Kinematics,
                    SimulationUpdateSet::Visual,
                )
                    .chain(),
            )
            .add_systems(Startup, world_init::spawn_vehicles);

        app.add_plugins((
            frame_scheduler::FrameSchedulerPlugin,
            phase_channel::PhaseChannelPlugin,
            vehicle_kinematics::KinematicsPlugin,
        ));
    }
}
