use bevy::prelude::*;
use bevy::window::PresentMode;

use simulation::sim_config::SimConfig;

mod mock_controller;

use mock_controller::MockMode;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Headless controller stand-in: serves phase messages and never opens a window.
    if args.iter().any(|arg| arg == "--mock-controller") {
        let mode = if args.iter().any(|arg| arg == "--numeric") {
            MockMode::Numeric
        } else {
            MockMode::Labels
        };
        if let Err(e) = mock_controller::run(mode, mock_controller::BIND_ADDRESS) {
            eprintln!("intersection: mock controller failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    let config = match SimConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("intersection: invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let channel = config.channel_config();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Intersection".to_string(),
                resolution: (1280.0, 720.0).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.53, 0.81, 0.92)))
        .insert_resource(config)
        .insert_resource(channel)
        .add_plugins((
            simulation::SimulationPlugin,
            rendering::RenderingPlugin,
            ui::UiPlugin,
        ))
        .run();
}
