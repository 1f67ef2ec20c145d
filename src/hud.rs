use bevy::prelude::*;
use bevy_egui::{
    egui::{self, Align2, Color32, FontId, RichText},
    EguiContexts,
};

use crate::state::RunnerState;
use crate::world::Distance;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                update_distance_ui
                    .run_if(in_state(RunnerState::Running).or_else(in_state(RunnerState::Dead))),
                prompt_ui,
            ),
        );
    }
}

fn prompt_text(state: RunnerState, distance: &Distance) -> Option<String> {
    match state {
        RunnerState::Loading => Some("Loading...".into()),
        RunnerState::Ready => Some("Press Space to run".into()),
        RunnerState::Running => None,
        RunnerState::Dead => Some(format!(
            "Game over - {:.0} m (best {:.0} m)\nPress Space to try again",
            distance.current, distance.best
        )),
    }
}

fn update_distance_ui(mut contexts: EguiContexts, distance: Res<Distance>) {
    egui::Area::new("distance")
        .anchor(Align2::CENTER_TOP, (0., 25.))
        .show(contexts.ctx_mut(), |ui| {
            ui.label(
                RichText::new(format!("{:.0} m", distance.current))
                    .color(Color32::WHITE)
                    .font(FontId::proportional(48.0)),
            );
        });
}

fn prompt_ui(mut contexts: EguiContexts, state: Res<State<RunnerState>>, distance: Res<Distance>) {
    let Some(text) = prompt_text(*state.get(), &distance) else {
        return;
    };
    egui::Area::new("prompt")
        .anchor(Align2::CENTER_CENTER, (0., 0.))
        .show(contexts.ctx_mut(), |ui| {
            ui.label(
                RichText::new(text)
                    .color(Color32::WHITE)
                    .font(FontId::proportional(32.0)),
            );
        });
}
