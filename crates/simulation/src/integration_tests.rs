//! Integration tests using the `TestIntersection` harness.
//!
//! These tests spin up a headless Bevy App with `SimulationPlugin` and verify
//! behavior across the phase state, the kinematics system and the frame
//! ordering working together.


use bevy::prelude::*;

use crate::intersection_state::ConnectionStatus;
use crate::phase_channel::{ChannelConfig, PhaseChannel};
use crate::phase_protocol::{PhaseMessage, PhaseUpdateKind};
use crate::sim_config::SimConfig;
use crate::test_harness::TestIntersection;
use crate::traffic_phase::TrafficPhase;
use crate::world_init::SkipWorldInit;
use crate::SimulationPlugin;

/// Exactly representable frame length, so positions sum without drift.
pub(crate) const FRAME: f32 = 1.0 / 64.0;

// ===========================================================================
// 1. Harness bootstrap tests
// ===========================================================================

#[test]
fn empty_intersection_has_no_vehicles() {
    let mut sim = TestIntersection::new();
    assert_eq!(sim.vehicle_count(), 0);
}

#[test]
fn stock_scene_spawns_four_cars_at_their_starts() {
    let mut sim = TestIntersection::with_stock_scene();
    assert_eq!(sim.vehicle_count(), 4);
    sim.assert_at("red", Vec3::new(-0.5, 0.25, -15.0));
    sim.assert_at("amber", Vec3::new(0.5, 0.25, 15.0));
    sim.assert_at("blue", Vec3::new(15.0, 0.25, -0.5));
    sim.assert_at("violet", Vec3::new(-15.0, 0.25, 0.5));
}

#[test]
fn initial_state_is_idle_with_primary_red() {
    let sim = TestIntersection::new();
    let state = sim.state();
    assert_eq!(state.primary_phase(), TrafficPhase::Red);
    assert_eq!(state.secondary_phase(), TrafficPhase::Green);
    assert_eq!(*state.connection_status(), ConnectionStatus::Idle);
    assert_eq!(state.updates_applied(), 0);
}

#[test]
fn invalid_config_spawns_nothing() {
    let mut config = SimConfig::default();
    config.vehicles[0].speed = -1.0;
    let mut sim = TestIntersection::with_config(config);
    assert_eq!(sim.vehicle_count(), 0);
}

// ===========================================================================
// 2. Stock scene under the default phases
// ===========================================================================

#[test]
fn stock_scene_after_two_seconds() {
    let mut sim = TestIntersection::with_stock_scene();
    sim.run_for(2.0, FRAME);

    // North-south cars hold at their stop lines.
    sim.assert_at("red", Vec3::new(-0.5, 0.25, -2.75));
    sim.assert_at("amber", Vec3::new(0.5, 0.25, 2.75));
    // East-west cars have green and cover 20 units.
    sim.assert_at("blue", Vec3::new(-5.0, 0.25, -0.5));
    sim.assert_at("violet", Vec3::new(5.0, 0.25, 0.5));
}

#[test]
fn green_cars_loop_back_to_start() {
    let mut sim = TestIntersection::with_stock_scene();
    // 30 units at 10 u/s.
    sim.run_for(3.0, FRAME);
    sim.assert_at("blue", Vec3::new(15.0, 0.25, -0.5));
    sim.assert_at("violet", Vec3::new(-15.0, 0.25, 0.5));
}

#[test]
fn every_car_stays_on_its_route() {
    let mut sim = TestIntersection::with_stock_scene();
    let phases = [
        (TrafficPhase::Green, TrafficPhase::Red),
        (TrafficPhase::Yellow, TrafficPhase::Red),
        (TrafficPhase::Red, TrafficPhase::Green),
        (TrafficPhase::Off, TrafficPhase::Off),
    ];
    for (i, (primary, secondary)) in phases.iter().cycle().take(12).enumerate() {
        sim.set_phases(*primary, *secondary);
        // Uneven frame lengths, including one long stall.
        let delta = [0.016, 0.033, 0.25, 4.0][i % 4];
        sim.frames(7, delta);
        for name in ["red", "amber", "blue", "violet"] {
            sim.assert_on_route(name);
        }
    }
}

// ===========================================================================
// 3. Payloads applied through the harness
// ===========================================================================

#[test]
fn numeric_payload_sets_phases_and_telemetry() {
    let mut sim = TestIntersection::new();
    let kind = sim.receive(&PhaseMessage::numeric(TrafficPhase::Red, 12, false));
    assert_eq!(kind, Some(PhaseUpdateKind::Numeric));

    let state = sim.state();
    assert_eq!(state.primary_phase(), TrafficPhase::Red);
    assert_eq!(state.secondary_phase(), TrafficPhase::Green);
    assert_eq!(state.countdown_seconds(), 12.0);
    assert!(!state.overspeed());
}

#[test]
fn rejected_payload_leaves_cars_and_state_alone() {
    let mut sim = TestIntersection::with_stock_scene();
    let conflicting = PhaseMessage::labels(TrafficPhase::Green, TrafficPhase::Green);
    assert_eq!(sim.receive(&conflicting), None);
    assert_eq!(sim.state().updates_applied(), 0);

    sim.run_for(2.0, FRAME);
    sim.assert_at("red", Vec3::new(-0.5, 0.25, -2.75));
}

// ===========================================================================
// 4. Plugin wiring
// ===========================================================================

fn app_with_channel_config(config: ChannelConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(SkipWorldInit);
    app.insert_resource(config);
    app.add_plugins(SimulationPlugin);
    app.update();
    app
}

#[test]
fn auto_connect_opens_channel_at_startup() {
    let app = app_with_channel_config(ChannelConfig {
        address: "ws://127.0.0.1:9".to_string(),
        ..Default::default()
    });
    assert!(app.world().resource::<PhaseChannel>().is_open());
}

#[test]
fn auto_connect_disabled_leaves_channel_closed() {
    let app = app_with_channel_config(ChannelConfig {
        auto_connect: false,
        ..Default::default()
    });
    assert!(!app.world().resource::<PhaseChannel>().is_open());
}

#[test]
fn invalid_address_logged_not_fatal() {
    let mut app = app_with_channel_config(ChannelConfig {
        address: "not a url".to_string(),
        ..Default::default()
    });
    app.update();
    assert!(!app.world().resource::<PhaseChannel>().is_open());
}
