//! "Intersection Status" overlay: phase per direction group, controller
//! telemetry and the state of the controller connection.
//!
//! Toggled with F1.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use simulation::frame_scheduler::FrameClock;
use simulation::intersection_state::{ConnectionStatus, IntersectionState};
use simulation::phase_protocol::PhaseUpdateKind;
use simulation::traffic_phase::{PhaseGroup, TrafficPhase};

#[derive(Resource)]
pub struct StatusPanelVisible(pub bool);

impl Default for StatusPanelVisible {
    fn default() -> Self {
        Self(true)
    }
}

pub fn phase_color(phase: TrafficPhase) -> egui::Color32 {
    match phase {
        TrafficPhase::Green => egui::Color32::from_rgb(74, 222, 128),
        TrafficPhase::Yellow => egui::Color32::from_rgb(250, 204, 21),
        TrafficPhase::Red => egui::Color32::from_rgb(248, 113, 113),
        TrafficPhase::Off => egui::Color32::GRAY,
    }
}

pub fn connection_color(status: &ConnectionStatus) -> egui::Color32 {
    match status {
        ConnectionStatus::Connected => egui::Color32::from_rgb(74, 222, 128),
        ConnectionStatus::Connecting => egui::Color32::from_rgb(250, 204, 21),
        ConnectionStatus::Idle => egui::Color32::GRAY,
        ConnectionStatus::Disconnected { .. } | ConnectionStatus::Error(_) => {
            egui::Color32::from_rgb(248, 113, 113)
        }
    }
}

/// Whole seconds left, rounded up so a light never reads "0 s" while still lit.
pub fn format_countdown(seconds: f32) -> String {
    if seconds <= 0.0 {
        "--".to_string()
    } else {
        format!("{} s", seconds.ceil() as u32)
    }
}

pub fn payload_label(kind: Option<PhaseUpdateKind>) -> &'static str {
    match kind {
        Some(PhaseUpdateKind::Labels) => "road labels",
        Some(PhaseUpdateKind::Numeric) => "numeric light",
        None => "none yet",
    }
}

pub fn status_panel_keybind(
    keys: Res<ButtonInput<KeyCode>>,
    mut visible: ResMut<StatusPanelVisible>,
) {
    if keys.just_pressed(KeyCode::F1) {
        visible.0 = !visible.0;
    }
}

pub fn status_panel_ui(
    mut contexts: EguiContexts,
    mut visible: ResMut<StatusPanelVisible>,
    state: Res<IntersectionState>,
    clock: Res<FrameClock>,
) {
    if !visible.0 {
        return;
    }

    let mut open = true;
    egui::Window::new("Intersection Status")
        .open(&mut open)
        .resizable(false)
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .default_width(220.0)
        .show(contexts.ctx_mut(), |ui| {
            for group in [PhaseGroup::Primary, PhaseGroup::Secondary] {
                let phase = state.phase(group);
                ui.horizontal(|ui| {
                    ui.label(format!("{}:", group.label()));
                    ui.label(
                        egui::RichText::new(phase.label().to_uppercase())
                            .strong()
                            .color(phase_color(phase)),
                    );
                });
            }

            ui.separator();

            ui.label(format!(
                "Countdown: {}",
                format_countdown(state.countdown_seconds())
            ));
            if state.overspeed() {
                ui.label(
                    egui::RichText::new("Overspeed detected")
                        .strong()
                        .color(egui::Color32::from_rgb(248, 113, 113)),
                );
            }

            ui.separator();

            let status = state.connection_status();
            ui.horizontal(|ui| {
                ui.label("Controller:");
                ui.label(egui::RichText::new(status.to_string()).color(connection_color(status)));
            });
            ui.small(format!(
                "{} updates received, last: {}",
                state.updates_applied(),
                payload_label(state.last_update())
            ));
            ui.small(format!("Frame {}", clock.frames()));
        });

    if !open {
        visible.0 = false;
    }
}
