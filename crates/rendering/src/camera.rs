use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;

use simulation::config::ROUTE_EXTENT;

const PAN_SPEED: f32 = 12.0;
const ZOOM_STEP: f32 = 0.15;
const DISTANCE_RANGE: (f32, f32) = (5.0, 80.0);
/// 5° to 85°.
const PITCH_RANGE: (f32, f32) = (0.087, 1.484);
const DRAG_RADIANS_PER_PIXEL: f32 = 0.005;
/// Pixel-unit scroll events per wheel notch.
const PIXELS_PER_LINE: f32 = 100.0;

/// Camera circling a ground point above the junction.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    /// Radians about +Y; 0 puts the camera on the +Z side.
    pub yaw: f32,
    /// Elevation above the ground plane in radians.
    pub pitch: f32,
    pub distance: f32,
}

impl Default for OrbitCamera {
    /// Looking at the junction from (0, 15, 20).
    fn default() -> Self {
        let offset = Vec2::new(20.0, 15.0);
        Self {
            focus: Vec3::ZERO,
            yaw: 0.0,
            pitch: offset.y.atan2(offset.x),
            distance: offset.length(),
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.focus + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.focus, Vec3::Y)
    }

    /// Move the focus by a screen-relative ground offset (x right, y towards the viewer).
    pub fn pan(&mut self, screen: Vec2) {
        let ground = Vec2::from_angle(-self.yaw).rotate(screen);
        let limit = Vec2::splat(ROUTE_EXTENT);
        let focus = (self.focus.xz() + ground).clamp(-limit, limit);
        self.focus = Vec3::new(focus.x, self.focus.y, focus.y);
    }

    pub fn orbit(&mut self, drag: Vec2) {
        self.yaw -= drag.x * DRAG_RADIANS_PER_PIXEL;
        self.pitch = (self.pitch + drag.y * DRAG_RADIANS_PER_PIXEL).clamp(PITCH_RANGE.0, PITCH_RANGE.1);
    }

    /// Positive notches move closer.
    pub fn zoom(&mut self, notches: f32) {
        self.distance =
            (self.distance * (1.0 - notches * ZOOM_STEP)).clamp(DISTANCE_RANGE.0, DISTANCE_RANGE.1);
    }
}

pub fn setup_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 50.0_f32.to_radians(),
            ..default()
        }),
        orbit.transform(),
    ));
    commands.insert_resource(orbit);
}

/// Keyboard direction in screen space: WASD or arrows, Home resets the view.
fn keyboard_pan(keys: &ButtonInput<KeyCode>) -> Vec2 {
    let axis = |neg: [KeyCode; 2], pos: [KeyCode; 2]| {
        f32::from(u8::from(keys.any_pressed(pos))) - f32::from(u8::from(keys.any_pressed(neg)))
    };
    Vec2::new(
        axis(
            [KeyCode::KeyA, KeyCode::ArrowLeft],
            [KeyCode::KeyD, KeyCode::ArrowRight],
        ),
        axis(
            [KeyCode::KeyW, KeyCode::ArrowUp],
            [KeyCode::KeyS, KeyCode::ArrowDown],
        ),
    )
    .normalize_or_zero()
}

pub fn camera_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut orbit: ResMut<OrbitCamera>,
) {
    if keys.just_pressed(KeyCode::Home) {
        *orbit = OrbitCamera::default();
        return;
    }
    let direction = keyboard_pan(&keys);
    if direction != Vec2::ZERO {
        orbit.pan(direction * PAN_SPEED * time.delta_secs());
    }
}

/// Drag with either mouse button to orbit, scroll to zoom.
pub fn camera_mouse(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    mut orbit: ResMut<OrbitCamera>,
) {
    if buttons.any_pressed([MouseButton::Left, MouseButton::Right]) && motion.delta != Vec2::ZERO {
        orbit.orbit(motion.delta);
    }
    if scroll.delta.y != 0.0 {
        let notches = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y,
            MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
        };
        orbit.zoom(notches);
    }
}

pub fn apply_orbit_camera(
    orbit: Res<OrbitCamera>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    if !orbit.is_changed() {
        return;
    }
    for mut transform in &mut cameras {
        *transform = orbit.transform();
    }
}
