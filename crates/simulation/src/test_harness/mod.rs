//! # TestIntersection: headless integration test harness
//!
//! Provides a fluent builder that wraps `bevy::app::App` + `SimulationPlugin`
//! for running integration tests without a window or renderer. Frames are
//! driven by running the `Update` schedule directly with a manual
//! `FrameClock`, so every test controls the exact delta of every frame.

mod assertions;
mod queries;
mod setup;

use bevy::app::App;
use bevy::prelude::*;

use crate::frame_scheduler::FrameClock;
use crate::sim_config::SimConfig;
use crate::world_init::SkipWorldInit;
use crate::SimulationPlugin;

/// A headless Bevy App wrapping `SimulationPlugin` for integration testing.
///
/// Use builder methods to place cars and set phases, then call `frames()` to
/// advance the simulation and query/assert on the resulting ECS state.
pub struct TestIntersection {
    app: App,
}

impl TestIntersection {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An intersection with no cars, default phases (primary red, secondary
    /// green) and no controller connection.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// The stock four-car scene.
    pub fn with_stock_scene() -> Self {
        Self::build(Some(SimConfig::default()))
    }

    /// The scene described by `config`. No channel is opened: the harness
    /// never inserts a `ChannelConfig`.
    pub fn with_config(config: SimConfig) -> Self {
        Self::build(Some(config))
    }

    fn build(config: Option<SimConfig>) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // Zero-length first frame: Startup runs, nothing moves.
        app.insert_resource(FrameClock::manual(0.0));
        match config {
            Some(config) => {
                app.insert_resource(config);
            }
            None => {
                // Insert the marker BEFORE SimulationPlugin so spawn_vehicles skips.
                app.insert_resource(SkipWorldInit);
            }
        }
        app.add_plugins(SimulationPlugin);

        // Run one update so Startup systems execute.
        app.update();

        Self { app }
    }
}

impl Default for TestIntersection {
    fn default() -> Self {
        Self::new()
    }
}
