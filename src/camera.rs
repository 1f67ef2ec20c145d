use bevy::prelude::*;

use crate::components::{Player, RunnerEntity};
use crate::math::approach_vec3;
use crate::player::FrameClock;
use crate::settings::RunnerSettings;

#[derive(Component, Clone, Copy)]
pub struct FollowCamera;

/// Where the camera sits and looks for a given player position.
pub fn follow_pose(player: Vec3, settings: &RunnerSettings) -> (Vec3, Vec3) {
    // lateral movement is followed at half strength so lane changes read clearly
    let anchor = Vec3::new(player.x, player.y * 0.5, player.z * 0.5);
    (anchor + settings.camera_offset, anchor + settings.camera_look_ahead)
}

pub fn spawn_camera(commands: &mut Commands, settings: &RunnerSettings) {
    let (eye, target) = follow_pose(Vec3::ZERO, settings);
    commands.spawn((
        FollowCamera,
        RunnerEntity,
        Camera3dBundle {
            transform: Transform::from_translation(eye).looking_at(target, Vec3::Y),
            ..default()
        },
    ));
}

pub fn camera_follow(
    clock: Res<FrameClock>,
    settings: Res<RunnerSettings>,
    players: Query<&Transform, With<Player>>,
    mut cameras: Query<&mut Transform, (With<FollowCamera>, Without<Player>)>,
) {
    let Ok(player) = players.get_single() else {
        return;
    };
    let (eye, target) = follow_pose(player.translation, &settings);
    for mut transform in &mut cameras {
        let eye = approach_vec3(transform.translation, eye, settings.camera_follow_rate, clock.delta());
        *transform = Transform::from_translation(eye).looking_at(target, Vec3::Y);
    }
}

/// Snaps the camera back to its starting offset.
pub fn reset_camera(transform: &mut Transform, settings: &RunnerSettings) {
    let (eye, target) = follow_pose(Vec3::ZERO, settings);
    *transform = Transform::from_translation(eye).looking_at(target, Vec3::Y);
}
