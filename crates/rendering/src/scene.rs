use bevy::prelude::*;

use simulation::config::{EAST_WEST_ROAD_HALF_WIDTH, NORTH_SOUTH_ROAD_HALF_WIDTH, ROAD_LENGTH};

const GROUND_SIZE: f32 = 50.0;
const GROUND_COLOR: Color = Color::srgb(0.408, 0.624, 0.220); // #689f38
const ASPHALT_COLOR: Color = Color::srgb(0.333, 0.333, 0.333); // #555555
const ROAD_THICKNESS: f32 = 0.1;
const CENTER_LINE_WIDTH: f32 = 0.05;

/// Marker on static scenery (ground, roads, markings).
#[derive(Component)]
pub struct Scenery;

pub fn setup_lighting(mut commands: Commands) {
    // Ambient light for baseline illumination
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
    });

    // Key light from the south-east, casting the car shadows
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Weak fill from the opposite side
    commands.spawn((
        DirectionalLight {
            illuminance: 2500.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-10.0, 10.0, -5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Ground plane, both roads with their centre lines, and the junction box.
pub fn spawn_scenery(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let asphalt = materials.add(StandardMaterial {
        base_color: ASPHALT_COLOR,
        perceptual_roughness: 0.9,
        ..default()
    });
    let paint = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    });

    commands.spawn((
        Scenery,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: GROUND_COLOR,
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_xyz(0.0, -0.05, 0.0),
    ));

    let ns_width = NORTH_SOUTH_ROAD_HALF_WIDTH * 2.0;
    let ew_width = EAST_WEST_ROAD_HALF_WIDTH * 2.0;

    for (size, line) in [
        // North-south road, centre line along Z.
        (
            Vec3::new(ns_width, ROAD_THICKNESS, ROAD_LENGTH),
            Vec3::new(CENTER_LINE_WIDTH, 0.001, ROAD_LENGTH),
        ),
        // East-west road, centre line along X.
        (
            Vec3::new(ROAD_LENGTH, ROAD_THICKNESS, ew_width),
            Vec3::new(ROAD_LENGTH, 0.001, CENTER_LINE_WIDTH),
        ),
    ] {
        commands.spawn((
            Scenery,
            Mesh3d(meshes.add(Cuboid::from_size(size))),
            MeshMaterial3d(asphalt.clone()),
            Transform::IDENTITY,
        ));
        commands.spawn((
            Scenery,
            Mesh3d(meshes.add(Cuboid::from_size(line))),
            MeshMaterial3d(paint.clone()),
            Transform::from_xyz(0.0, ROAD_THICKNESS / 2.0 + 0.001, 0.0),
        ));
    }

    // Junction box sits slightly above both roads so the centre lines stop at it.
    commands.spawn((
        Scenery,
        Mesh3d(meshes.add(Cuboid::new(ns_width, ROAD_THICKNESS + 0.003, ew_width))),
        MeshMaterial3d(asphalt),
        Transform::IDENTITY,
    ));
}
