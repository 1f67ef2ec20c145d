use bevy::prelude::*;

use crate::components::{Lane, Player, VerticalMotion};
use crate::math::approach;
use crate::settings::RunnerSettings;

/// Per-frame simulation step, clamped, and zeroed for the first frame after a reset.
#[derive(Resource, Debug, Default)]
pub struct FrameClock {
    delta: f32,
    pending_reset: bool,
}

impl FrameClock {
    /// Makes the next tick report a zero delta.
    pub fn reset(&mut self) {
        self.pending_reset = true;
        self.delta = 0.0;
    }

    pub fn is_reset_pending(&self) -> bool {
        self.pending_reset
    }

    pub fn tick(&mut self, raw: f32, max_delta: f32) -> f32 {
        self.delta = if self.pending_reset {
            self.pending_reset = false;
            0.0
        } else {
            raw.clamp(0.0, max_delta)
        };
        self.delta
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }
}

pub fn tick_frame_clock(
    time: Res<Time>,
    settings: Res<RunnerSettings>,
    mut clock: ResMut<FrameClock>,
) {
    clock.tick(time.delta_seconds(), settings.max_frame_delta);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalStep {
    pub y: f32,
    pub velocity: f32,
    pub landed: bool,
}

/// Exact constant-acceleration step; clamps to the floor at y = 0.
/// A zero step leaves the motion untouched, even for a jump starting on the floor.
pub fn step_vertical(y: f32, velocity: f32, gravity: f32, dt: f32) -> VerticalStep {
    if dt <= 0.0 {
        return VerticalStep {
            y,
            velocity,
            landed: false,
        };
    }
    let next_y = y + velocity * dt - 0.5 * gravity * dt * dt;
    let next_velocity = velocity - gravity * dt;
    if next_y <= 0.0 {
        return VerticalStep {
            y: 0.0,
            velocity: 0.0,
            landed: true,
        };
    }
    VerticalStep {
        y: next_y,
        velocity: next_velocity,
        landed: false,
    }
}

/// Raised when the player leaves the ground.
#[derive(Event, Clone, Copy, Debug)]
pub struct Jumped;

/// Raised when an airborne player touches down.
#[derive(Event, Clone, Copy, Debug)]
pub struct Landed;

/// Starts a jump if the player is on the floor. Returns whether it did.
pub fn try_jump(motion: &mut VerticalMotion, jump_velocity: f32) -> bool {
    if !motion.grounded {
        return false;
    }
    motion.velocity = jump_velocity;
    motion.grounded = false;
    true
}

pub fn move_player(
    clock: Res<FrameClock>,
    settings: Res<RunnerSettings>,
    mut players: Query<(&mut Transform, &mut VerticalMotion, &Lane), With<Player>>,
    mut landed: EventWriter<Landed>,
) {
    let dt = clock.delta();
    for (mut transform, mut motion, lane) in &mut players {
        let target_z = lane.z(settings.lane_width);
        transform.translation.z =
            approach(transform.translation.z, target_z, settings.lane_change_rate, dt);

        if motion.grounded {
            continue;
        }
        let step = step_vertical(transform.translation.y, motion.velocity, settings.gravity, dt);
        transform.translation.y = step.y;
        motion.velocity = step.velocity;
        if step.landed {
            motion.grounded = true;
            landed.send(Landed);
        }
    }
}

/// Puts the player back on the centre lane, standing still.
pub fn reset_player(transform: &mut Transform, motion: &mut VerticalMotion, lane: &mut Lane) {
    *lane = Lane::CENTER;
    *motion = VerticalMotion::default();
    transform.translation = Vec3::ZERO;
}
