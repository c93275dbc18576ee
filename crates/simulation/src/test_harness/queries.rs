//! Query and frame-advance methods for `TestIntersection`.

use std::time::{Duration, Instant};

use bevy::prelude::*;

use crate::frame_scheduler::FrameClock;
use crate::intersection_state::IntersectionState;
use crate::vehicle::{Vehicle, VehiclePosition, VehicleStyle};

use super::TestIntersection;

impl TestIntersection {
    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run `n` frames of `delta` seconds each by directly executing the
    /// `Update` schedule.
    pub fn frames(&mut self, n: u32, delta: f32) {
        self.app
            .world_mut()
            .resource_mut::<FrameClock>()
            .set_manual(Some(delta));
        for _ in 0..n {
            self.app.world_mut().run_schedule(Update);
        }
    }

    /// Advance `seconds` of simulated time in frames of at most `delta`.
    pub fn run_for(&mut self, seconds: f32, delta: f32) {
        let whole = (seconds / delta).floor() as u32;
        self.frames(whole, delta);
        let rest = seconds - whole as f32 * delta;
        if rest > 0.0 {
            self.frames(1, rest);
        }
    }

    /// Run zero-length frames until `predicate` holds on the intersection
    /// state or `timeout` elapses. Cars do not move while waiting.
    pub fn wait_for(
        &mut self,
        timeout: Duration,
        mut predicate: impl FnMut(&IntersectionState) -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.frames(1, 0.0);
            if predicate(self.state()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    // -----------------------------------------------------------------------
    // Queries (note: Bevy's World::query() requires &mut World)
    // -----------------------------------------------------------------------

    /// Access the ECS world mutably (needed for queries in Bevy).
    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn state(&self) -> &IntersectionState {
        self.app.world().resource::<IntersectionState>()
    }

    pub fn vehicle_count(&mut self) -> usize {
        let world = self.app.world_mut();
        world.query::<&Vehicle>().iter(world).count()
    }

    /// Position of the car with the given configured name.
    pub fn position_of(&mut self, name: &str) -> Vec3 {
        self.find(name).1
    }

    pub fn vehicle_of(&mut self, name: &str) -> Vehicle {
        self.find(name).0
    }

    /// All cars as (name, position), in no particular order.
    pub fn positions(&mut self) -> Vec<(String, Vec3)> {
        let world = self.app.world_mut();
        world
            .query::<(&VehicleStyle, &VehiclePosition)>()
            .iter(world)
            .map(|(style, position)| (style.name.clone(), position.0))
            .collect()
    }

    fn find(&mut self, name: &str) -> (Vehicle, Vec3) {
        let world = self.app.world_mut();
        world
            .query::<(&Vehicle, &VehicleStyle, &VehiclePosition)>()
            .iter(world)
            .find(|(_, style, _)| style.name == name)
            .map(|(vehicle, _, position)| (vehicle.clone(), position.0))
            .unwrap_or_else(|| panic!("no vehicle named '{name}'"))
    }
}
