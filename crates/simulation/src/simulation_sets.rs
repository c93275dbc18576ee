//! Frame ordering via `SystemSet` phases.
//!
//! Every simulation system runs in the `Update` schedule, once per rendered
//! frame, in this order:
//!
//! ```text
//! Network  →  Kinematics  →  Visual
//! ```
//!
//! * **Network** – drain the phase channel and apply controller updates to
//!   `IntersectionState`. The only writer of that resource.
//! * **Kinematics** – advance every vehicle by the frame delta, reading the
//!   phase applied above. A frame never sees a half-applied update.
//! * **Visual** – presentation only: transform sync, signal lamps, status
//!   overlay. Reads simulation state, never writes it.
//!
//! The frame delta itself is sampled before `Network`.

use bevy::prelude::*;

/// Ordered phases for systems running in the `Update` schedule.
///
/// Configured as a chain in `SimulationPlugin`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationUpdateSet {
    /// Controller messages and connection status.
    Network,
    /// Per-vehicle position updates.
    Kinematics,
    /// Rendering sync and UI.
    Visual,
}
