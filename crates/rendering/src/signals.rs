//! Signal heads at the four corners of the junction.
//!
//! Two heads per phase group, each facing the traffic it controls. Lamps are
//! re-lit whenever `IntersectionState` changes.

use std::f32::consts::{FRAC_PI_2, PI};

use bevy::prelude::*;

use simulation::config::{EAST_WEST_ROAD_HALF_WIDTH, NORTH_SOUTH_ROAD_HALF_WIDTH};
use simulation::intersection_state::IntersectionState;
use simulation::traffic_phase::{PhaseGroup, TrafficPhase};

const CORNER_CLEARANCE: f32 = 0.2;
const POLE_HEIGHT: f32 = 2.0;
const LAMP_RADIUS: f32 = 0.13;
/// Lamp order on the housing, top to bottom, with heights.
const LAMPS: [(TrafficPhase, f32); 3] = [
    (TrafficPhase::Red, 2.5),
    (TrafficPhase::Yellow, 2.2),
    (TrafficPhase::Green, 1.9),
];

#[derive(Component, Debug, Clone, Copy)]
pub struct SignalHead {
    pub group: PhaseGroup,
}

/// One lamp of a head. Lit when its group's phase equals `color`.
#[derive(Component, Debug, Clone, Copy)]
pub struct SignalLamp {
    pub group: PhaseGroup,
    pub color: TrafficPhase,
}

/// Corner positions and headings of the four heads.
pub fn head_placements() -> [(PhaseGroup, Vec3, f32); 4] {
    let ew = EAST_WEST_ROAD_HALF_WIDTH + CORNER_CLEARANCE;
    let ns = NORTH_SOUTH_ROAD_HALF_WIDTH + CORNER_CLEARANCE;
    [
        // South-west corner, facing northbound traffic.
        (PhaseGroup::Primary, Vec3::new(-ns, 0.0, -ew), PI),
        // North-east corner, facing southbound traffic.
        (PhaseGroup::Primary, Vec3::new(ns, 0.0, ew), 0.0),
        // North-west corner, facing eastbound traffic.
        (PhaseGroup::Secondary, Vec3::new(-ns, 0.0, ew), -FRAC_PI_2),
        // South-east corner, facing westbound traffic.
        (PhaseGroup::Secondary, Vec3::new(ns, 0.0, -ew), FRAC_PI_2),
    ]
}

pub fn lamp_is_lit(lamp: TrafficPhase, phase: TrafficPhase) -> bool {
    lamp == phase && phase != TrafficPhase::Off
}

/// Base colour and emission of a lamp.
pub fn lamp_appearance(color: TrafficPhase, lit: bool) -> (Color, LinearRgba) {
    let (on, off) = match color {
        TrafficPhase::Red => (Color::srgb(1.0, 0.0, 0.0), Color::srgb(0.31, 0.0, 0.0)),
        TrafficPhase::Yellow => (Color::srgb(1.0, 0.75, 0.0), Color::srgb(0.31, 0.23, 0.0)),
        TrafficPhase::Green => (Color::srgb(0.0, 1.0, 0.0), Color::srgb(0.0, 0.31, 0.0)),
        TrafficPhase::Off => (Color::BLACK, Color::BLACK),
    };
    if lit {
        (on, LinearRgba::from(on) * 4.0)
    } else {
        (off, LinearRgba::BLACK)
    }
}

pub fn spawn_signals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    state: Res<IntersectionState>,
) {
    let pole_mesh = meshes.add(Cylinder::new(0.1, POLE_HEIGHT));
    let housing_mesh = meshes.add(Cuboid::new(0.5, 1.0, 0.5));
    let lamp_mesh = meshes.add(Sphere::new(LAMP_RADIUS).mesh().uv(16, 16));
    let pole_material = materials.add(Color::srgb(0.5, 0.5, 0.5));
    let housing_material = materials.add(Color::srgb(0.66, 0.66, 0.66));

    for (group, position, yaw) in head_placements() {
        let phase = state.phase(group);
        commands
            .spawn((
                SignalHead { group },
                Name::new(format!("Signal {}", group.label())),
                Transform::from_translation(position).with_rotation(Quat::from_rotation_y(yaw)),
                Visibility::default(),
            ))
            .with_children(|head| {
                head.spawn((
                    Mesh3d(pole_mesh.clone()),
                    MeshMaterial3d(pole_material.clone()),
                    Transform::from_xyz(0.0, POLE_HEIGHT / 2.0, 0.0),
                ));
                head.spawn((
                    Mesh3d(housing_mesh.clone()),
                    MeshMaterial3d(housing_material.clone()),
                    Transform::from_xyz(0.0, 2.2, 0.0),
                ));
                for (color, height) in LAMPS {
                    let (base_color, emissive) = lamp_appearance(color, lamp_is_lit(color, phase));
                    // Each lamp owns its material so it can be re-lit alone.
                    let material = materials.add(StandardMaterial {
                        base_color,
                        emissive,
                        ..default()
                    });
                    head.spawn((
                        SignalLamp { group, color },
                        Mesh3d(lamp_mesh.clone()),
                        MeshMaterial3d(material),
                        Transform::from_xyz(0.0, height, 0.26),
                    ));
                }
            });
    }
}

pub fn update_signal_lamps(
    state: Res<IntersectionState>,
    lamps: Query<(&SignalLamp, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !state.is_changed() {
        return;
    }
    for (lamp, handle) in &lamps {
        let lit = lamp_is_lit(lamp.color, state.phase(lamp.group));
        let (base_color, emissive) = lamp_appearance(lamp.color, lit);
        if let Some(material) = materials.get_mut(&handle.0) {
            material.base_color = base_color;
            material.emissive = emissive;
        }
    }
}
