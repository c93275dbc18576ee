//! Builder methods for cars, phases, and the controller channel.

use bevy::prelude::*;

use crate::intersection_state::IntersectionState;
use crate::phase_channel::{ChannelConfig, ChannelError, PhaseChannel, PhaseHandlers};
use crate::phase_protocol::{PhaseMessage, PhaseUpdate, PhaseUpdateKind};
use crate::sim_config::VehicleConfig;
use crate::traffic_phase::TrafficPhase;
use crate::world_init::spawn_vehicle;

use super::TestIntersection;

impl TestIntersection {
    // -----------------------------------------------------------------------
    // Cars
    // -----------------------------------------------------------------------

    /// Spawn a car. Panics if the configuration is invalid.
    pub fn with_vehicle(mut self, config: VehicleConfig) -> Self {
        self.spawn_vehicle(config);
        self
    }

    pub fn spawn_vehicle(&mut self, config: VehicleConfig) -> Entity {
        let spec = match config.to_spec() {
            Ok(spec) => spec,
            Err(e) => panic!("invalid test vehicle: {e}"),
        };
        let world = self.app.world_mut();
        let entity = {
            let mut commands = world.commands();
            spawn_vehicle(&mut commands, spec)
        };
        world.flush();
        entity
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    /// Set both phases as if a label payload had arrived from the controller.
    pub fn with_phases(mut self, primary: TrafficPhase, secondary: TrafficPhase) -> Self {
        self.set_phases(primary, secondary);
        self
    }

    pub fn set_phases(&mut self, primary: TrafficPhase, secondary: TrafficPhase) {
        self.apply_update(PhaseUpdate {
            primary,
            secondary,
            telemetry: None,
        });
    }

    /// Apply a wire message through the same decoder the channel uses.
    /// Returns whether it was accepted.
    pub fn receive(&mut self, message: &PhaseMessage) -> Option<PhaseUpdateKind> {
        let update = crate::phase_protocol::decode_message(&message.to_json()).ok()?;
        self.apply_update(update);
        Some(update.kind())
    }

    fn apply_update(&mut self, update: PhaseUpdate) {
        self.app
            .world_mut()
            .resource_mut::<IntersectionState>()
            .apply_update(&update);
    }

    // -----------------------------------------------------------------------
    // Channel
    // -----------------------------------------------------------------------

    pub fn open_channel(
        &mut self,
        config: &ChannelConfig,
        handlers: impl PhaseHandlers,
    ) -> Result<(), ChannelError> {
        self.app
            .world_mut()
            .resource_mut::<PhaseChannel>()
            .open(config, handlers)
    }

    pub fn close_channel(&mut self) {
        let world = self.app.world_mut();
        world.resource_scope(|world, mut channel: Mut<PhaseChannel>| {
            let mut state = world.resource_mut::<IntersectionState>();
            channel.close(&mut state);
        });
    }

    pub fn channel_is_open(&self) -> bool {
        self.app.world().resource::<PhaseChannel>().is_open()
    }
}
