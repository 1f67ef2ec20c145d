use bevy::log::warn;
use wasm_bindgen::prelude::wasm_bindgen;

pub mod animation;
pub mod args;
pub mod camera;
pub mod collision;
pub mod components;
pub mod debug_panel;
pub mod game;
pub mod host;
pub mod hud;
pub mod input;
pub mod math;
pub mod model;
pub mod player;
pub mod pool;
pub mod settings;
pub mod state;
pub mod world;

#[wasm_bindgen(inline_js =
    "export function url_params() {
        let result = [];
        for (let x of new URLSearchParams(window.location.search).entries()) {
            if (x.length < 2) {
                continue;
            }
            result.push(x[0] + \",\" + x[1]);
        }
        return result;
    }"
)]
extern "C" {
    fn url_params() -> Vec<String>;
}

/// Mounts the game into the canvas matched by `canvas_selector`.
#[wasm_bindgen]
pub fn run_game(canvas_selector: Option<String>) {
    let mut args = match args::Args::from_url_params(&url_params()) {
        Ok(args) => args,
        Err(err) => {
            warn!("ignoring url params: {err}");
            args::Args::default()
        }
    };
    if let Some(selector) = canvas_selector {
        args.canvas = selector;
    }
    let on_state_change = host::page_state_callback(args.canvas.clone());
    game::run_game(args, Some(on_state_change));
}

#[wasm_bindgen]
pub fn restart_game() {
    match host::installed() {
        Some(handle) => handle.restart(),
        None => warn!("restart_game called before run_game"),
    }
}

#[wasm_bindgen]
pub fn dispose_game() {
    match host::installed() {
        Some(handle) => handle.dispose(),
        None => warn!("dispose_game called before run_game"),
    }
}
