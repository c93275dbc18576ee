//! Assertion helpers for `TestIntersection` integration tests.

use bevy::prelude::*;

use crate::vehicle_kinematics::ARRIVAL_EPSILON;

use super::TestIntersection;

impl TestIntersection {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    /// Assert a car is at `expected`, within arrival tolerance.
    pub fn assert_at(&mut self, name: &str, expected: Vec3) {
        let actual = self.position_of(name);
        assert!(
            actual.distance(expected) <= ARRIVAL_EPSILON,
            "Expected '{name}' at {expected}, got {actual}"
        );
    }

    /// Assert a car has not crossed its stop line in its direction of travel.
    pub fn assert_not_past_stop(&mut self, name: &str) {
        let vehicle = self.vehicle_of(name);
        let route = vehicle.route();
        let position = self.position_of(name);
        let past = (route.axis.get(position) - route.axis.get(route.stop)) * route.direction.sign();
        assert!(
            past <= 0.0,
            "'{name}' is {past} past its stop line at {position}"
        );
    }

    /// Assert a car's on-axis coordinate lies within its route and its
    /// off-axis coordinates match the route start.
    pub fn assert_on_route(&mut self, name: &str) {
        let vehicle = self.vehicle_of(name);
        let route = vehicle.route();
        let position = self.position_of(name);
        let along = route.axis.get(position);
        let lo = route.axis.get(route.start).min(route.axis.get(route.end));
        let hi = route.axis.get(route.start).max(route.axis.get(route.end));
        assert!(
            (lo..=hi).contains(&along),
            "'{name}' left its route: {along} not in [{lo}, {hi}]"
        );
        let mut projected = route.start;
        route.axis.set(&mut projected, along);
        assert_eq!(position, projected, "'{name}' drifted off its lane");
    }
}
