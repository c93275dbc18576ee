//! Loading scenes from JSON files and running them through the public plugin.
//!
//! Run: cargo test -p simulation --test config_files

use std::path::PathBuf;

use bevy::prelude::*;

use simulation::config_error::ConfigError;
use simulation::frame_scheduler::FrameClock;
use simulation::intersection_state::{ConnectionStatus, IntersectionState};
use simulation::sim_config::SimConfig;
use simulation::vehicle::{VehiclePosition, VehicleStyle};
use simulation::SimulationPlugin;

const TWO_CARS: &str = r##"{
    "controller": { "address": "ws://10.0.0.7:8765", "retry_delay_ms": 500 },
    "vehicles": [
        {
            "name": "north", "axis": "z", "direction": 1,
            "start": [-0.5, 0.25, -15.0], "stop": [-0.5, 0.25, -5.75], "end": [-0.5, 0.25, 15.0],
            "speed": 4.0, "color": "#ff0000", "gate": "primary"
        },
        {
            "name": "east", "axis": "x", "direction": 1,
            "start": [-15.0, 0.25, 0.5], "stop": [-1.75, 0.25, 0.5], "end": [15.0, 0.25, 0.5],
            "color": "#0000ff", "gate": "secondary", "yaw_degrees": 90.0
        }
    ]
}"##;

/// A scratch file under the system temp dir, removed on drop.
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn new(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "intersection-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn headless(config: SimConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(FrameClock::manual(0.0))
        .insert_resource(config)
        .add_plugins(SimulationPlugin);
    app.update();
    app
}

fn position(app: &mut App, name: &str) -> Vec3 {
    let world = app.world_mut();
    world
        .query::<(&VehicleStyle, &VehiclePosition)>()
        .iter(world)
        .find(|(style, _)| style.name == name)
        .map(|(_, position)| position.0)
        .unwrap()
}

#[test]
fn file_scene_loads_and_runs() {
    let file = ScratchFile::new("two-cars", TWO_CARS);
    let config = SimConfig::from_sources(Some(&file.0), None).unwrap();
    assert_eq!(config.vehicles.len(), 2);
    assert_eq!(config.vehicles[1].speed, 10.0, "speed defaults when omitted");
    assert_eq!(config.controller.address, "ws://10.0.0.7:8765");
    assert!(config.controller.auto_connect);

    let mut app = headless(config);
    assert_eq!(
        *app.world().resource::<IntersectionState>().connection_status(),
        ConnectionStatus::Idle,
        "no channel is opened without a ChannelConfig"
    );

    app.world_mut()
        .resource_mut::<FrameClock>()
        .set_manual(Some(0.5));
    app.update();
    app.update();

    // Primary starts red, secondary green.
    assert_eq!(position(&mut app, "north"), Vec3::new(-0.5, 0.25, -11.0));
    assert_eq!(position(&mut app, "east"), Vec3::new(-5.0, 0.25, 0.5));
}

#[test]
fn environment_address_overrides_file() {
    let file = ScratchFile::new("override", TWO_CARS);
    let config =
        SimConfig::from_sources(Some(&file.0), Some("ws://controller.local:9000".to_string()))
            .unwrap();
    assert_eq!(config.controller.address, "ws://controller.local:9000");
    assert_eq!(config.channel_config().retry_delay.as_millis(), 500);
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("intersection-does-not-exist.json");
    let err = SimConfig::from_sources(Some(&path), None).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    assert!(err.to_string().contains("intersection-does-not-exist.json"));
}

#[test]
fn bad_route_in_file_names_the_car() {
    let negative = TWO_CARS.replace(r#""speed": 4.0"#, r#""speed": -4.0"#);
    assert_ne!(negative, TWO_CARS);
    let file = ScratchFile::new("bad-route", &negative);
    let err = SimConfig::from_sources(Some(&file.0), None).unwrap_err();
    match err {
        ConfigError::InvalidRoute { vehicle, .. } => assert_eq!(vehicle, "north"),
        other => panic!("expected InvalidRoute, got {other}"),
    }
}

#[test]
fn truncated_file_is_a_parse_error() {
    let file = ScratchFile::new("truncated", &TWO_CARS[..40]);
    let err = SimConfig::from_sources(Some(&file.0), None).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");
}
