use std::time::Duration;

/// Length of a simulated car along its direction of travel, in world units.
pub const CAR_LENGTH: f32 = 1.5;
pub const HALF_CAR_LENGTH: f32 = CAR_LENGTH / 2.0;

/// Height of a car's centre above the road surface.
pub const CAR_RIDE_HEIGHT: f32 = 0.25;

/// Distance from the intersection centre at which every stock route starts and ends.
pub const ROUTE_EXTENT: f32 = 15.0;

/// Half-widths of the two roads meeting at the intersection. The stop line of an
/// approach sits on the edge of the crossing road: north-south cars halt at
/// the east-west road's edge and vice versa.
pub const EAST_WEST_ROAD_HALF_WIDTH: f32 = 2.0;
pub const NORTH_SOUTH_ROAD_HALF_WIDTH: f32 = 1.0;

/// Length of each road, centred on the intersection.
pub const ROAD_LENGTH: f32 = 35.0;

/// Car body box, width and height. Length is [`CAR_BODY_LENGTH`].
pub const CAR_BODY_WIDTH: f32 = 0.6;
pub const CAR_BODY_HEIGHT: f32 = 0.5;
pub const CAR_BODY_LENGTH: f32 = 1.2;

/// Lateral offset of a lane centre from its road's centre line.
pub const LANE_OFFSET: f32 = 0.5;

/// Cruise speed of stock vehicles, world units per second.
pub const DEFAULT_CAR_SPEED: f32 = 10.0;

/// Address of the controller bridge (the serial-to-WebSocket relay).
pub const DEFAULT_CONTROLLER_ADDRESS: &str = "ws://localhost:8765";

/// Fixed delay between a disconnect and the next connection attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// Read-timeout granularity of the socket worker. Bounds how long an explicit
/// close can take to be noticed while the socket is idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
