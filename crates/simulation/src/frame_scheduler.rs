use bevy::prelude::*;

use crate::SimulationUpdateSet;

/// Elapsed time handed to the kinematics step for the current frame.
///
/// Sampled from `Time<Real>` rather than the virtual clock: Bevy clamps
/// virtual deltas, and a window that was hidden for several seconds should
/// resume with its cars where real time puts them.
#[derive(Resource, Debug, Default, Clone)]
pub struct FrameClock {
    delta: f32,
    manual: Option<f32>,
    frames: u64,
}

impl FrameClock {
    /// A clock that reports `delta` every frame regardless of wall time.
    /// Used by tests and headless drivers.
    pub fn manual(delta: f32) -> Self {
        Self {
            manual: Some(delta),
            ..Default::default()
        }
    }

    pub fn set_manual(&mut self, delta: Option<f32>) {
        self.manual = delta;
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta
    }

    /// Frames sampled since startup.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn sample(&mut self, wall_delta: f32) {
        let raw = self.manual.unwrap_or(wall_delta);
        self.delta = if raw.is_finite() && raw > 0.0 { raw } else { 0.0 };
        self.frames = self.frames.wrapping_add(1);
    }
}

pub fn sample_frame_delta(time: Res<Time<Real>>, mut clock: ResMut<FrameClock>) {
    clock.sample(time.delta_secs());
}

pub struct FrameSchedulerPlugin;

impl Plugin for FrameSchedulerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameClock>().add_systems(
            Update,
            sample_frame_delta.before(SimulationUpdateSet::Network),
        );
    }
}
