use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::settings::{RunnerSettings, Tunable, TUNABLES};

#[derive(Resource, Clone, Copy, Debug)]
pub struct DebugPanel {
    pub visible: bool,
}

pub struct DebugPanelPlugin {
    pub visible: bool,
}

impl Plugin for DebugPanelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DebugPanel {
            visible: self.visible,
        })
        .add_systems(Update, (toggle_debug_panel, debug_panel_ui).chain());
    }
}

fn toggle_debug_panel(keys: Res<Input<KeyCode>>, mut panel: ResMut<DebugPanel>) {
    if keys.just_pressed(KeyCode::F1) {
        panel.visible = !panel.visible;
    }
}

/// Writes only when the value moves.
fn apply_tunable(settings: &mut ResMut<RunnerSettings>, tunable: &Tunable, value: f32) {
    if tunable.get(&**settings) != value {
        tunable.set(&mut **settings, value);
    }
}

fn debug_panel_ui(
    mut contexts: EguiContexts,
    panel: Res<DebugPanel>,
    mut settings: ResMut<RunnerSettings>,
) {
    if !panel.visible {
        return;
    }
    egui::Window::new("Tuning")
        .anchor(egui::Align2::RIGHT_TOP, (-10., 10.))
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            for tunable in TUNABLES.iter() {
                let mut value = tunable.get(&settings);
                let response = ui.add(egui::Slider::new(&mut value, tunable.range.clone()).text(tunable.label));
                if response.changed() {
                    apply_tunable(&mut settings, tunable, value);
                }
            }
            if ui.button("Reset").clicked() {
                let defaults = RunnerSettings::default();
                for tunable in TUNABLES.iter() {
                    apply_tunable(&mut settings, tunable, tunable.get(&defaults));
                }
            }
        });
}
