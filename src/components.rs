use bevy::prelude::*;
use smallvec::SmallVec;

use crate::settings::MAX_POOL;

/// Tags everything the runner spawns so teardown can find it.
#[derive(Component, Clone, Copy)]
pub struct RunnerEntity;

#[derive(Component, Clone, Copy)]
pub struct Player;

#[derive(Component, Clone, Copy)]
pub struct Obstacle;

#[derive(Component, Clone, Copy)]
pub struct FloorSegment;

#[derive(Component, Clone, Copy)]
pub struct Background;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lane(u8);

impl Lane {
    pub const COUNT: u8 = 3;
    pub const CENTER: Lane = Lane(1);

    /// Clamps out-of-range indices onto the nearest edge lane.
    pub fn new(index: u8) -> Self {
        Lane(index.min(Self::COUNT - 1))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Shifts by `delta` lanes; stops at the outer lanes.
    pub fn shifted(self, delta: i8) -> Self {
        let target = (self.0 as i8).saturating_add(delta).clamp(0, Self::COUNT as i8 - 1);
        Lane(target as u8)
    }

    /// Lateral coordinate of the lane centre.
    pub fn z(self, lane_width: f32) -> f32 {
        (self.0 as f32 - 1.0) * lane_width
    }
}

impl Default for Lane {
    fn default() -> Self {
        Lane::CENTER
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct VerticalMotion {
    pub velocity: f32,
    pub grounded: bool,
}

impl Default for VerticalMotion {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            grounded: true,
        }
    }
}

/// Box used for overlap tests, relative to the entity translation.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub half_extents: Vec3,
    pub offset: Vec3,
}

impl Collider {
    /// A box of `size` resting on the entity origin.
    pub fn grounded(size: Vec3) -> Self {
        Self {
            half_extents: size / 2.0,
            offset: Vec3::new(0.0, size.y / 2.0, 0.0),
        }
    }
}

/// Asks model preparation to scale the child scene to this height.
#[derive(Component, Clone, Copy, Debug)]
pub struct FitHeight(pub f32);

pub type PoolSlots = SmallVec<[Entity; MAX_POOL]>;

#[derive(Resource, Default)]
pub struct FloorPool {
    pub segments: PoolSlots,
}

#[derive(Resource, Default)]
pub struct ObstaclePool {
    pub slots: PoolSlots,
}
