use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use simulation::SimulationUpdateSet;

pub mod status_panel;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<status_panel::StatusPanelVisible>()
            .add_systems(
                Update,
                (
                    status_panel::status_panel_keybind,
                    status_panel::status_panel_ui,
                )
                    .chain()
                    .in_set(SimulationUpdateSet::Visual),
            );
    }
}
