//! Per-frame vehicle motion along a single axis, gated by the traffic phase.
//!
//! Each frame a car is in one of three regimes:
//!
//! * **free travel** (green/off, or already past the stop line): advance, and
//!   jump back to `start` once `end` is reached or crossed;
//! * **approach** (red/yellow, short of the stop line): advance, clamped to
//!   land exactly on `stop`;
//! * **hold** (red/yellow, on the stop line or within `ARRIVAL_EPSILON`
//!   short of it): snap forward onto `stop` and stay there.
//!
//! The update is a pure function of (route, position, phase, delta), so it is
//! correct for any delta: a multi-second frame after the window was hidden
//! either clamps at the stop line or wraps once to the route start.

use bevy::prelude::*;

use crate::frame_scheduler::FrameClock;
use crate::intersection_state::IntersectionState;
use crate::traffic_phase::TrafficPhase;
use crate::vehicle::{Vehicle, VehiclePosition, VehicleRoute};
use crate::SimulationUpdateSet;

/// Distance within which a car counts as having arrived at a landmark.
/// Absorbs f32 drift from summing many small frame steps.
pub const ARRIVAL_EPSILON: f32 = 1e-3;

/// Compute a vehicle's position after `delta` seconds under `phase`.
///
/// Negative or non-finite deltas are treated as zero.
pub fn advance(vehicle: &Vehicle, position: Vec3, phase: TrafficPhase, delta: f32) -> Vec3 {
    let route = vehicle.route();
    let delta = if delta.is_finite() && delta > 0.0 {
        delta
    } else {
        0.0
    };
    let step = route.speed * delta * route.direction.sign();

    if !phase.forbids_entry() {
        return travel(route, position, step);
    }

    let axis = route.axis;
    let sign = route.direction.sign();
    let stop = axis.get(route.stop);
    let current = axis.get(position);
    // Positive while the car is still short of the stop line.
    let to_stop = (stop - current) * sign;

    if to_stop > ARRIVAL_EPSILON {
        let mut next = position;
        if step.abs() >= to_stop - ARRIVAL_EPSILON {
            axis.set(&mut next, stop);
        } else {
            axis.set(&mut next, current + step);
        }
        next
    } else if to_stop < 0.0 {
        // Already inside the intersection: finish crossing.
        travel(route, position, step)
    } else {
        let mut held = position;
        axis.set(&mut held, stop);
        held
    }
}

fn travel(route: &VehicleRoute, position: Vec3, step: f32) -> Vec3 {
    let axis = route.axis;
    let advanced = axis.get(position) + step;
    let remaining = (axis.get(route.end) - advanced) * route.direction.sign();
    if remaining <= ARRIVAL_EPSILON {
        return route.start;
    }
    let mut next = position;
    axis.set(&mut next, advanced);
    next
}

/// Advance every vehicle by this frame's delta.
///
/// Each vehicle's update runs to completion inside this system, after the
/// phase channel has been drained for the frame.
pub fn advance_vehicles(
    clock: Res<FrameClock>,
    state: Res<IntersectionState>,
    mut vehicles: Query<(&Vehicle, &mut VehiclePosition)>,
) {
    #[cfg(feature = "trace")]
    let _span = bevy::log::info_span!("advance_vehicles").entered();

    let delta = clock.delta_secs();
    for (vehicle, mut position) in &mut vehicles {
        let next = advance(vehicle, position.0, state.phase(vehicle.gate()), delta);
        if next != position.0 {
            position.0 = next;
        }
    }
}

pub struct KinematicsPlugin;

impl Plugin for KinematicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            advance_vehicles.in_set(SimulationUpdateSet::Kinematics),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic_phase::PhaseGroup;
    use crate::vehicle::{MovementAxis, TravelDirection};

    /// Northbound car from the reference scenario.
    fn northbound(speed: f32) -> Vehicle {
        Vehicle::new(VehicleRoute {
            axis: MovementAxis::Z,
            direction: TravelDirection::Forward,
            start: Vec3::new(0.0, 0.0, -15.0),
            stop: Vec3::new(0.0, 0.0, -5.75),
            end: Vec3::new(0.0, 0.0, 15.0),
            speed,
            gate: PhaseGroup::Primary,
        })
        .unwrap()
    }

    /// Westbound car, travelling toward -X.
    fn westbound() -> Vehicle {
        Vehicle::new(VehicleRoute {
            axis: MovementAxis::X,
            direction: TravelDirection::Backward,
            start: Vec3::new(15.0, 0.25, -0.5),
            stop: Vec3::new(1.75, 0.25, -0.5),
            end: Vec3::new(-15.0, 0.25, -0.5),
            speed: 10.0,
            gate: PhaseGroup::Secondary,
        })
        .unwrap()
    }

    fn run(vehicle: &Vehicle, mut pos: Vec3, phase: TrafficPhase, delta: f32, frames: u32) -> Vec3 {
        for _ in 0..frames {
            pos = advance(vehicle, pos, phase, delta);
        }
        pos
    }

    #[test]
    fn test_green_advances_along_axis_only() {
        let car = westbound();
        let start = car.route().start;
        let pos = advance(&car, start, TrafficPhase::Green, 0.5);
        assert_eq!(pos, Vec3::new(10.0, 0.25, -0.5));
    }

    #[test]
    fn test_red_approach_reaches_minus_nine_after_two_seconds() {
        let car = northbound(3.0);
        // 128 frames of 1/64 s: exact in f32.
        let pos = run(&car, car.route().start, TrafficPhase::Red, 1.0 / 64.0, 128);
        assert_eq!(pos.z, -9.0);
        assert_eq!((pos.x, pos.y), (0.0, 0.0));
    }

    #[test]
    fn test_red_clamps_exactly_at_stop_and_stays() {
        let car = northbound(3.0);
        let mut pos = run(&car, car.route().start, TrafficPhase::Red, 1.0 / 64.0, 128);
        // (stop - start) / speed = 9.25 / 3 ≈ 3.08 s; run well past it.
        pos = run(&car, pos, TrafficPhase::Red, 1.0 / 64.0, 256);
        assert_eq!(pos.z, -5.75);
        for _ in 0..100 {
            pos = advance(&car, pos, TrafficPhase::Red, 1.0 / 60.0);
            assert_eq!(pos.z, -5.75);
        }
    }

    #[test]
    fn test_fast_car_clamps_within_two_seconds() {
        let car = northbound(8.0);
        let pos = run(&car, car.route().start, TrafficPhase::Red, 0.25, 8);
        assert_eq!(pos.z, -5.75);
    }

    #[test]
    fn test_yellow_behaves_like_red() {
        let car = northbound(8.0);
        let red = run(&car, car.route().start, TrafficPhase::Red, 0.1, 30);
        let yellow = run(&car, car.route().start, TrafficPhase::Yellow, 0.1, 30);
        assert_eq!(red, yellow);
        assert_eq!(yellow.z, -5.75);
    }

    #[test]
    fn test_off_behaves_like_green() {
        let car = northbound(8.0);
        let green = advance(&car, car.route().start, TrafficPhase::Green, 1.0);
        let off = advance(&car, car.route().start, TrafficPhase::Off, 1.0);
        assert_eq!(green, off);
    }

    #[test]
    fn test_huge_delta_under_red_never_overshoots() {
        let car = northbound(8.0);
        let pos = advance(&car, car.route().start, TrafficPhase::Red, 3600.0);
        assert_eq!(pos.z, -5.75);
    }

    #[test]
    fn test_red_never_passes_stop_for_any_frame_size() {
        let car = westbound();
        let stop = car.route().stop.x;
        for delta in [0.001, 1.0 / 60.0, 0.05, 0.3, 1.0, 7.5, 100.0] {
            let mut pos = car.route().start;
            // Slowest case needs 1325 frames to reach the line.
            for _ in 0..2000 {
                pos = advance(&car, pos, TrafficPhase::Red, delta);
                // Westbound: "past" the stop line means x < stop.
                assert!(pos.x >= stop, "overshot with delta {delta}: x = {}", pos.x);
            }
            assert_eq!(pos.x, stop, "did not settle on the stop line with delta {delta}");
        }
    }

    #[test]
    fn test_car_past_stop_line_finishes_crossing_under_red() {
        let car = northbound(10.0);
        let inside = Vec3::new(0.0, 0.0, -1.0);
        let mut pos = advance(&car, inside, TrafficPhase::Red, 0.5);
        assert_eq!(pos.z, 4.0);
        pos = advance(&car, pos, TrafficPhase::Red, 1.0);
        assert_eq!(pos.z, 14.0);
        // Crossing the end under red still loops to start.
        pos = advance(&car, pos, TrafficPhase::Red, 0.5);
        assert_eq!(pos, car.route().start);
        // Back on the approach, the red light now holds it at the line.
        pos = run(&car, pos, TrafficPhase::Red, 0.25, 20);
        assert_eq!(pos.z, -5.75);
    }

    #[test]
    fn test_held_car_resumes_on_green() {
        let car = northbound(10.0);
        let held = run(&car, car.route().start, TrafficPhase::Red, 0.5, 10);
        assert_eq!(held.z, -5.75);
        let moving = advance(&car, held, TrafficPhase::Green, 0.25);
        assert_eq!(moving.z, -3.25);
    }

    #[test]
    fn test_green_loop_returns_to_start_after_route_time() {
        let car = northbound(10.0);
        let start = car.route().start;
        // 30 units at 10 u/s = 3 s.
        assert_eq!(run(&car, start, TrafficPhase::Green, 3.0, 1), start);
        assert_eq!(run(&car, start, TrafficPhase::Green, 0.25, 12), start);
        assert_eq!(run(&car, start, TrafficPhase::Green, 1.0 / 64.0, 192), start);
    }

    #[test]
    fn test_green_loop_with_uneven_frames() {
        let car = northbound(10.0);
        let start = car.route().start;
        let mut pos = start;
        let mut elapsed = 0.0_f32;
        // Repeating jittery frame pattern summing to exactly 3 s.
        let pattern = [1.0 / 64.0, 1.0 / 32.0, 1.0 / 16.0, 1.0 / 64.0, 1.0 / 8.0];
        'outer: loop {
            for delta in pattern {
                if elapsed + delta > 3.0 {
                    let rest = 3.0 - elapsed;
                    pos = advance(&car, pos, TrafficPhase::Green, rest);
                    break 'outer;
                }
                pos = advance(&car, pos, TrafficPhase::Green, delta);
                elapsed += delta;
            }
        }
        assert_eq!(pos, start);
    }

    #[test]
    fn test_huge_green_delta_wraps_to_start() {
        let car = westbound();
        let pos = advance(&car, car.route().start, TrafficPhase::Green, 500.0);
        assert_eq!(pos, car.route().start);
    }

    #[test]
    fn test_position_stays_within_route_bounds() {
        let car = westbound();
        let route = *car.route();
        let (lo, hi) = (route.end.x.min(route.start.x), route.end.x.max(route.start.x));
        let phases = [
            TrafficPhase::Green,
            TrafficPhase::Red,
            TrafficPhase::Yellow,
            TrafficPhase::Off,
        ];
        let deltas = [0.016, 0.7, 2.3, 0.0, 11.0, 0.04];
        let mut pos = route.start;
        for i in 0..400 {
            let phase = phases[(i / 7) % phases.len()];
            let delta = deltas[i % deltas.len()];
            pos = advance(&car, pos, phase, delta);
            assert!(pos.x >= lo && pos.x <= hi, "x = {} out of [{lo}, {hi}]", pos.x);
            assert_eq!((pos.y, pos.z), (0.25, -0.5));
        }
    }

    #[test]
    fn test_zero_and_invalid_deltas_do_not_move() {
        let car = northbound(10.0);
        let start = car.route().start;
        for delta in [0.0, -1.0, f32::NAN, f32::NEG_INFINITY] {
            assert_eq!(advance(&car, start, TrafficPhase::Green, delta), start);
        }
    }

    #[test]
    fn test_within_epsilon_of_stop_snaps_to_stop() {
        let car = northbound(10.0);
        let near = Vec3::new(0.0, 0.0, -5.75 - ARRIVAL_EPSILON / 2.0);
        let pos = advance(&car, near, TrafficPhase::Red, 0.0);
        assert_eq!(pos.z, -5.75);
    }

    #[test]
    fn test_car_just_past_stop_line_keeps_going_under_red() {
        let car = northbound(8.0);
        let stop = car.route().stop.z;
        let mut pos = Vec3::new(0.0, 0.0, stop + ARRIVAL_EPSILON / 2.0);
        let mut previous = pos.z;
        for _ in 0..60 {
            pos = advance(&car, pos, TrafficPhase::Red, 1.0 / 60.0);
            assert!(pos.z > previous, "moved backwards or stalled: z = {}", pos.z);
            previous = pos.z;
        }
        assert!((pos.z - (stop + ARRIVAL_EPSILON / 2.0 + 8.0)).abs() < 1e-3, "z = {}", pos.z);
    }
}
