//! Gameplay tuning shared by every system.
//!
//! Systems read [`RunnerSettings`] through `Res`; the only writer at runtime is the
//! debug panel, which goes through the [`TUNABLES`] table instead of poking fields
//! directly.

use bevy::prelude::*;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    /// Forward scroll speed of the world, units per second.
    pub world_speed: f32,
    /// Downward acceleration applied while airborne.
    pub gravity: f32,
    /// Upward velocity given by a jump.
    pub jump_velocity: f32,
    pub lane_width: f32,
    /// Exponential rate at which the player slides toward its target lane.
    pub lane_change_rate: f32,
    /// Longest frame step the simulation will accept.
    pub max_frame_delta: f32,

    pub floor_segment_count: usize,
    pub floor_segment_length: f32,
    pub floor_width: f32,
    pub floor_behind: f32,

    pub obstacle_count: usize,
    pub obstacle_spacing: f32,
    pub obstacle_start: f32,
    pub obstacle_behind: f32,
    pub obstacle_height: f32,

    pub player_height: f32,
    /// Shrinks the player's box on X/Z so grazing hits are forgiven.
    pub collision_margin: f32,

    pub camera_offset: Vec3,
    pub camera_look_ahead: Vec3,
    pub camera_follow_rate: f32,

    pub background_distance: f32,
    pub background_size: Vec2,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            world_speed: 18.0,
            gravity: 42.6,
            jump_velocity: 14.0,
            lane_width: 2.5,
            lane_change_rate: 12.0,
            max_frame_delta: 0.1,

            floor_segment_count: 6,
            floor_segment_length: 20.0,
            floor_width: 9.0,
            floor_behind: -30.0,

            obstacle_count: 6,
            obstacle_spacing: 24.0,
            obstacle_start: 40.0,
            obstacle_behind: -10.0,
            obstacle_height: 1.6,

            player_height: 1.8,
            collision_margin: 0.15,

            camera_offset: Vec3::new(-8.0, 4.5, 0.0),
            camera_look_ahead: Vec3::new(6.0, 1.0, 0.0),
            camera_follow_rate: 8.0,

            background_distance: 140.0,
            background_size: Vec2::new(320.0, 180.0),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("pool {name} needs between 1 and {max} members, got {count}")]
    PoolSize { name: &'static str, count: usize, max: usize },
    #[error("{name} must lie in {min}..={max}, got {value}")]
    OutOfRange { name: &'static str, value: f32, min: f32, max: f32 },
    #[error("{name} spacing {spacing} would let members overlap at {speed} units/s")]
    SpacingTooSmall { name: &'static str, spacing: f32, speed: f32 },
}

/// Upper bound on pooled entities; matches the inline capacity of the pools.
pub const MAX_POOL: usize = 8;

impl RunnerSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("world_speed", self.world_speed),
            ("gravity", self.gravity),
            ("jump_velocity", self.jump_velocity),
            ("lane_width", self.lane_width),
            ("lane_change_rate", self.lane_change_rate),
            ("max_frame_delta", self.max_frame_delta),
            ("floor_segment_length", self.floor_segment_length),
            ("obstacle_spacing", self.obstacle_spacing),
            ("player_height", self.player_height),
            ("obstacle_height", self.obstacle_height),
        ] {
            if !(value > 0.0) {
                return Err(SettingsError::NotPositive { name, value });
            }
        }
        for tunable in TUNABLES.iter() {
            let value = tunable.get(self);
            if !tunable.range.contains(&value) {
                return Err(SettingsError::OutOfRange {
                    name: tunable.label,
                    value,
                    min: *tunable.range.start(),
                    max: *tunable.range.end(),
                });
            }
        }
        if !(self.collision_margin >= 0.0) {
            return Err(SettingsError::Negative {
                name: "collision_margin",
                value: self.collision_margin,
            });
        }
        for (name, count) in [
            ("floor", self.floor_segment_count),
            ("obstacles", self.obstacle_count),
        ] {
            if count == 0 || count > MAX_POOL {
                return Err(SettingsError::PoolSize { name, count, max: MAX_POOL });
            }
        }
        // fastest allowed speed over the longest accepted frame
        let step = max_world_speed() * self.max_frame_delta;
        for (name, spacing) in [
            ("floor", self.floor_segment_length),
            ("obstacle", self.obstacle_spacing),
        ] {
            if spacing <= step {
                return Err(SettingsError::SpacingTooSmall {
                    name,
                    spacing,
                    speed: max_world_speed(),
                });
            }
        }
        Ok(())
    }
}

/// One live-editable parameter, as shown by the debug panel.
pub struct Tunable {
    pub label: &'static str,
    pub range: RangeInclusive<f32>,
    pub read: fn(&RunnerSettings) -> f32,
    pub field: fn(&mut RunnerSettings) -> &mut f32,
}

impl Tunable {
    /// Writes `value` clamped into the allowed range.
    pub fn set(&self, settings: &mut RunnerSettings, value: f32) {
        *(self.field)(settings) = value.clamp(*self.range.start(), *self.range.end());
    }

    pub fn get(&self, settings: &RunnerSettings) -> f32 {
        (self.read)(settings)
    }
}

pub const TUNABLES: [Tunable; 3] = [
    Tunable {
        label: "world speed",
        range: 4.0..=60.0,
        read: read_world_speed,
        field: world_speed_field,
    },
    Tunable {
        label: "gravity",
        range: 5.0..=120.0,
        read: read_gravity,
        field: gravity_field,
    },
    Tunable {
        label: "jump velocity",
        range: 4.0..=30.0,
        read: read_jump_velocity,
        field: jump_velocity_field,
    },
];

fn world_speed_field(s: &mut RunnerSettings) -> &mut f32 {
    &mut s.world_speed
}

fn read_world_speed(s: &RunnerSettings) -> f32 {
    s.world_speed
}

fn gravity_field(s: &mut RunnerSettings) -> &mut f32 {
    &mut s.gravity
}

fn read_gravity(s: &RunnerSettings) -> f32 {
    s.gravity
}

fn jump_velocity_field(s: &mut RunnerSettings) -> &mut f32 {
    &mut s.jump_velocity
}

fn read_jump_velocity(s: &RunnerSettings) -> f32 {
    s.jump_velocity
}

fn max_world_speed() -> f32 {
    *TUNABLES[0].range.end()
}
