use crate::components::{Lane, Player, VerticalMotion};
use crate::player::{try_jump, Jumped};
use crate::settings::RunnerSettings;
use bevy::prelude::*;

const INPUT_LEFT: u8 = 1 << 0;
const INPUT_RIGHT: u8 = 1 << 1;
const INPUT_JUMP: u8 = 1 << 2;
const INPUT_ACTIVATE: u8 = 1 << 3;

/// Keys pressed this frame, as a bitset.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalInput(pub u8);

pub fn read_local_inputs(keys: Res<Input<KeyCode>>, mut local: ResMut<LocalInput>) {
    let mut input = 0u8;
    if keys.any_just_pressed([KeyCode::Left, KeyCode::A]) {
        input |= INPUT_LEFT;
    }
    if keys.any_just_pressed([KeyCode::Right, KeyCode::D]) {
        input |= INPUT_RIGHT;
    }
    if keys.any_just_pressed([KeyCode::Up, KeyCode::W, KeyCode::Space]) {
        input |= INPUT_JUMP;
    }
    if keys.any_just_pressed([KeyCode::Space, KeyCode::Return]) {
        input |= INPUT_ACTIVATE;
    }
    local.0 = input;
}

/// -1, 0 or +1 lanes. Both directions at once cancel out.
pub fn lane_shift(input: u8) -> i8 {
    let mut shift = 0;
    if input & INPUT_LEFT != 0 {
        shift -= 1;
    }
    if input & INPUT_RIGHT != 0 {
        shift += 1;
    }
    return shift;
}

pub fn jump(input: u8) -> bool {
    input & INPUT_JUMP != 0
}

pub fn activate(input: u8) -> bool {
    input & INPUT_ACTIVATE != 0
}

pub fn steer_player(
    input: Res<LocalInput>,
    settings: Res<RunnerSettings>,
    mut players: Query<(&mut Lane, &mut VerticalMotion), With<Player>>,
    mut jumped: EventWriter<Jumped>,
) {
    let input = input.0;
    for (mut lane, mut motion) in &mut players {
        let shift = lane_shift(input);
        if shift != 0 {
            *lane = lane.shifted(shift);
        }
        if jump(input) && try_jump(&mut motion, settings.jump_velocity) {
            jumped.send(Jumped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(app: &mut App, key: KeyCode) {
        let mut keys = app.world.resource_mut::<Input<KeyCode>>();
        keys.clear();
        keys.release_all();
        keys.press(key);
    }

    fn steering_app() -> App {
        let mut app = App::new();
        app.init_resource::<Input<KeyCode>>()
            .init_resource::<LocalInput>()
            .insert_resource(RunnerSettings::default())
            .add_event::<Jumped>()
            .add_systems(Update, (read_local_inputs, steer_player).chain());
        app.world.spawn((Player, Lane::CENTER, VerticalMotion::default()));
        app
    }

    fn lane(app: &mut App) -> Lane {
        *app.world.query::<&Lane>().single(&app.world)
    }

    #[test]
    fn bits_decode() {
        assert_eq!(lane_shift(INPUT_LEFT), -1);
        assert_eq!(lane_shift(INPUT_RIGHT), 1);
        assert_eq!(lane_shift(INPUT_LEFT | INPUT_RIGHT), 0);
        assert!(jump(INPUT_JUMP | INPUT_ACTIVATE));
        assert!(!activate(INPUT_JUMP));
    }

    #[test]
    fn lane_changes_stop_at_the_edge() {
        let mut app = steering_app();
        for _ in 0..4 {
            press(&mut app, KeyCode::Left);
            app.update();
        }
        assert_eq!(lane(&mut app).index(), 0);
        press(&mut app, KeyCode::D);
        app.update();
        assert_eq!(lane(&mut app).index(), 1);
    }

    #[test]
    fn held_key_is_not_repeated() {
        let mut app = steering_app();
        press(&mut app, KeyCode::Right);
        app.update();
        // still held, no longer just pressed
        app.world.resource_mut::<Input<KeyCode>>().clear();
        app.update();
        assert_eq!(lane(&mut app).index(), 2);
        assert_eq!(app.world.resource::<LocalInput>().0, 0);
    }

    #[test]
    fn jump_only_from_the_ground() {
        let mut app = steering_app();
        press(&mut app, KeyCode::Space);
        app.update();
        let motion = *app.world.query::<&VerticalMotion>().single(&app.world);
        assert!(!motion.grounded);
        assert_eq!(motion.velocity, RunnerSettings::default().jump_velocity);

        press(&mut app, KeyCode::Up);
        app.update();
        let events = app.world.resource::<Events<Jumped>>();
        assert_eq!(events.get_reader().read(events).count(), 1);
    }
}
