use bevy::prelude::*;
use std::sync::Arc;

#[derive(States, Clone, Copy, Eq, PartialEq, Debug, Hash, Default)]
pub enum RunnerState {
    /// Models and backgrounds are still streaming in
    #[default]
    Loading,
    /// Everything is spawned, waiting for the activation key
    Ready,
    /// The world scrolls and the player can die
    Running,
    /// Frozen world, death clip playing
    Dead,
}

impl RunnerState {
    pub fn can_transition_to(self, next: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (self, next),
            (Loading, Ready) | (Ready, Running) | (Running, Dead) | (Dead, Running)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            RunnerState::Loading => "loading",
            RunnerState::Ready => "ready",
            RunnerState::Running => "running",
            RunnerState::Dead => "dead",
        }
    }
}

/// Queues `to` if the lifecycle allows it from the current state.
pub fn request_transition(
    current: &State<RunnerState>,
    next: &mut NextState<RunnerState>,
    to: RunnerState,
) -> bool {
    let from = *current.get();
    if !from.can_transition_to(to) {
        warn!("rejected state transition {} -> {}", from.name(), to.name());
        return false;
    }
    next.set(to);
    true
}

/// Activation while ready.
#[derive(Event, Clone, Copy, Debug)]
pub struct StartRun;

/// Back to a fresh run, from the keyboard or the host page.
#[derive(Event, Clone, Copy, Debug)]
pub struct RestartRun;

/// Tear everything down and release GPU resources.
#[derive(Event, Clone, Copy, Debug)]
pub struct DisposeRunner;

pub type StateCallback = Arc<dyn Fn(RunnerState) + Send + Sync>;

/// Optional listener for lifecycle changes, supplied by whoever embeds the game.
#[derive(Resource, Default, Clone)]
pub struct StateNotifier {
    callback: Option<StateCallback>,
}

impl StateNotifier {
    pub fn new(callback: Option<StateCallback>) -> Self {
        Self { callback }
    }

    pub fn notify(&self, state: RunnerState) {
        if let Some(callback) = &self.callback {
            callback(state);
        }
    }
}

pub fn report_state_changes(state: Res<State<RunnerState>>, notifier: Res<StateNotifier>) {
    if !state.is_changed() {
        return;
    }
    info!("runner state: {}", state.get().name());
    notifier.notify(*state.get());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use RunnerState::*;

    const ALL: [RunnerState; 4] = [Loading, Ready, Running, Dead];

    #[test]
    fn death_only_from_running() {
        for from in ALL {
            assert_eq!(from.can_transition_to(Dead), from == Running, "{from:?}");
        }
    }

    #[test]
    fn running_reachable_from_ready_and_dead_only() {
        let sources: Vec<_> = ALL.into_iter().filter(|s| s.can_transition_to(Running)).collect();
        assert_eq!(sources, vec![Ready, Dead]);
    }

    #[test]
    fn nothing_returns_to_loading_and_no_self_loops() {
        for from in ALL {
            assert!(!from.can_transition_to(Loading));
            assert!(!from.can_transition_to(from));
        }
        assert!(!Loading.can_transition_to(Running));
        assert!(!Ready.can_transition_to(Dead));
    }

    #[test]
    fn notifier_forwards_every_change_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: StateCallback = Arc::new(move |s| sink.lock().unwrap().push(s));

        let mut app = App::new();
        app.add_state::<RunnerState>()
            .insert_resource(StateNotifier::new(Some(callback)))
            .add_systems(Update, report_state_changes);

        app.update();
        app.update();
        app.world.resource_mut::<NextState<RunnerState>>().set(Ready);
        app.update();
        app.update();

        assert_eq!(*seen.lock().unwrap(), vec![Loading, Ready]);
    }

    #[test]
    fn rejected_request_leaves_next_state_empty() {
        let mut app = App::new();
        app.add_state::<RunnerState>();
        app.add_systems(Update, |current: Res<State<RunnerState>>, mut next: ResMut<NextState<RunnerState>>| {
            assert!(!request_transition(&current, &mut next, Dead));
        });
        app.update();
        app.update();
        assert_eq!(*app.world.resource::<State<RunnerState>>().get(), Loading);
    }
}
