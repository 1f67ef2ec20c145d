//! Boundary with the page that embeds the game.
//!
//! The page can only reach the running app through exported functions, so its
//! requests are queued here and drained at the start of each frame.

use bevy::prelude::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::OnceLock;

use crate::state::{DisposeRunner, RestartRun, RunnerState, StateCallback};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCommand {
    Restart,
    Dispose,
}

/// Sending half, handed to whoever embeds the game.
#[derive(Clone)]
pub struct HostHandle(Sender<HostCommand>);

impl HostHandle {
    pub fn restart(&self) {
        self.send(HostCommand::Restart);
    }

    pub fn dispose(&self) {
        self.send(HostCommand::Dispose);
    }

    fn send(&self, command: HostCommand) {
        if self.0.send(command).is_err() {
            warn!("game already torn down, dropping {command:?}");
        }
    }
}

#[derive(Resource, Clone)]
pub struct HostCommands(Receiver<HostCommand>);

pub fn host_channel() -> (HostHandle, HostCommands) {
    let (tx, rx) = unbounded();
    (HostHandle(tx), HostCommands(rx))
}

static HOST: OnceLock<HostHandle> = OnceLock::new();

/// Makes `handle` reachable from the exported functions. Only the first game wins.
pub fn install(handle: HostHandle) {
    if HOST.set(handle).is_err() {
        warn!("a game is already installed on this page");
    }
}

pub fn installed() -> Option<&'static HostHandle> {
    HOST.get()
}

pub fn drain_host_commands(
    host: Res<HostCommands>,
    mut restarts: EventWriter<RestartRun>,
    mut disposes: EventWriter<DisposeRunner>,
) {
    for command in host.0.try_iter() {
        info!("host command: {command:?}");
        match command {
            HostCommand::Restart => restarts.send(RestartRun),
            HostCommand::Dispose => disposes.send(DisposeRunner),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod page {
    use wasm_bindgen::prelude::wasm_bindgen;

    #[wasm_bindgen(inline_js = "export function dispatch_runner_state(selector, state) {
        const target = (selector && document.querySelector(selector)) || window;
        target.dispatchEvent(new CustomEvent('runner-state', { detail: state, bubbles: true }));
    }")]
    extern "C" {
        pub fn dispatch_runner_state(selector: &str, state: &str);
    }
}

/// Reports lifecycle changes to the page as `runner-state` DOM events on the mount point.
#[cfg(target_arch = "wasm32")]
pub fn page_state_callback(selector: String) -> StateCallback {
    Arc::new(move |state: RunnerState| page::dispatch_runner_state(&selector, state.name()))
}

/// Without a page, changes are only logged.
#[cfg(not(target_arch = "wasm32"))]
pub fn page_state_callback(_selector: String) -> StateCallback {
    Arc::new(|state: RunnerState| debug!("state change: {}", state.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_commands_become_events_in_order() {
        let (handle, commands) = host_channel();
        let mut app = App::new();
        app.add_event::<RestartRun>()
            .add_event::<DisposeRunner>()
            .insert_resource(commands)
            .add_systems(Update, drain_host_commands);

        handle.restart();
        handle.restart();
        handle.dispose();
        app.update();

        let restarts = app.world.resource::<Events<RestartRun>>();
        assert_eq!(restarts.get_reader().read(restarts).count(), 2);
        let disposes = app.world.resource::<Events<DisposeRunner>>();
        assert_eq!(disposes.get_reader().read(disposes).count(), 1);

        app.update();
        app.update();
        let restarts = app.world.resource::<Events<RestartRun>>();
        assert_eq!(restarts.get_reader().read(restarts).count(), 0);
    }

    #[test]
    fn sending_after_teardown_does_not_panic() {
        let (handle, commands) = host_channel();
        drop(commands);
        handle.dispose();
    }
}
