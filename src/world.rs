use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

use crate::components::*;
use crate::math::seed_layout;
use crate::player::FrameClock;
use crate::pool::scroll_and_recycle;
use crate::settings::{RunnerSettings, MAX_POOL};

#[derive(AssetCollection, Resource)]
pub struct RunnerAssets {
    #[asset(path = "models/runner.glb")]
    pub player: Handle<bevy::gltf::Gltf>,
    #[asset(path = "models/obstacle.glb#Scene0")]
    pub obstacle: Handle<Scene>,
    #[asset(
        paths("backgrounds/dusk.png", "backgrounds/city.png", "backgrounds/desert.png"),
        collection(typed)
    )]
    pub backgrounds: Vec<Handle<Image>>,
}

/// Handles created at runtime; dropping this resource frees their GPU data.
#[derive(Resource, Default)]
pub struct RunnerHandles {
    pub meshes: Vec<Handle<Mesh>>,
    pub materials: Vec<Handle<StandardMaterial>>,
}

#[derive(Resource)]
pub struct RunnerRng(pub SmallRng);

impl RunnerRng {
    pub fn seeded(seed: u64) -> Self {
        RunnerRng(SmallRng::seed_from_u64(seed))
    }

    pub fn lane(&mut self) -> Lane {
        Lane::new(self.0.gen_range(0..Lane::COUNT))
    }
}

/// Which background image is on screen.
#[derive(Resource, Default)]
pub struct BackgroundCursor(pub usize);

/// Metres covered this run, and the best run of the session.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct Distance {
    pub current: f32,
    pub best: f32,
}

impl Distance {
    pub fn finish_run(&mut self) {
        self.best = self.best.max(self.current);
    }
}

pub fn spawn_floor(
    commands: &mut Commands,
    settings: &RunnerSettings,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    handles: &mut RunnerHandles,
) -> FloorPool {
    let mesh = meshes.add(Mesh::from(shape::Box::new(
        settings.floor_segment_length,
        0.2,
        settings.floor_width,
    )));
    let tints = [Color::rgb(0.32, 0.34, 0.38), Color::rgb(0.27, 0.29, 0.33)];
    let tints = tints.map(|color| {
        materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: 0.9,
            ..default()
        })
    });
    handles.meshes.push(mesh.clone());
    handles.materials.extend(tints.iter().cloned());

    let mut pool = FloorPool::default();
    let xs = floor_layout(settings);
    for (i, x) in xs.enumerate() {
        let entity = commands
            .spawn((
                FloorSegment,
                RunnerEntity,
                PbrBundle {
                    mesh: mesh.clone(),
                    material: tints[i % 2].clone(),
                    transform: Transform::from_xyz(x, -0.1, 0.0),
                    ..default()
                },
            ))
            .id();
        pool.segments.push(entity);
    }
    pool
}

pub(crate) fn floor_layout(settings: &RunnerSettings) -> impl Iterator<Item = f32> {
    // first tile spans the player's position
    let start = -settings.floor_segment_length / 2.0;
    seed_layout(settings.floor_segment_count, start, settings.floor_segment_length)
}

pub(crate) fn obstacle_layout(settings: &RunnerSettings) -> impl Iterator<Item = f32> {
    seed_layout(settings.obstacle_count, settings.obstacle_start, settings.obstacle_spacing)
}

pub fn spawn_obstacles(
    commands: &mut Commands,
    settings: &RunnerSettings,
    assets: &RunnerAssets,
    rng: &mut RunnerRng,
) -> ObstaclePool {
    let mut pool = ObstaclePool::default();
    let default_size = Vec3::new(1.2, settings.obstacle_height, 1.2);
    for x in obstacle_layout(settings) {
        let lane = rng.lane();
        let entity = commands
            .spawn((
                Obstacle,
                RunnerEntity,
                lane,
                Collider::grounded(default_size),
                FitHeight(settings.obstacle_height),
                SpatialBundle::from_transform(Transform::from_xyz(x, 0.0, lane.z(settings.lane_width))),
            ))
            .with_children(|parent| {
                parent.spawn(SceneBundle {
                    scene: assets.obstacle.clone(),
                    ..default()
                });
            })
            .id();
        pool.slots.push(entity);
    }
    pool
}

pub fn spawn_background(
    commands: &mut Commands,
    settings: &RunnerSettings,
    assets: &RunnerAssets,
    cursor: &BackgroundCursor,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    handles: &mut RunnerHandles,
) {
    let Some(material) = background_material(assets, cursor.0, materials) else {
        warn!("no background images configured");
        return;
    };
    let mesh = meshes.add(Mesh::from(shape::Quad::new(settings.background_size)));
    handles.meshes.push(mesh.clone());
    handles.materials.push(material.clone());
    // the quad faces +Z, turn it to face back down the track
    let transform = Transform::from_xyz(settings.background_distance, settings.background_size.y / 4.0, 0.0)
        .with_rotation(Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2));
    commands.spawn((
        Background,
        RunnerEntity,
        PbrBundle {
            mesh,
            material,
            transform,
            ..default()
        },
    ));
}

fn background_material(
    assets: &RunnerAssets,
    index: usize,
    materials: &mut Assets<StandardMaterial>,
) -> Option<Handle<StandardMaterial>> {
    if assets.backgrounds.is_empty() {
        return None;
    }
    let image = assets.backgrounds[index % assets.backgrounds.len()].clone();
    Some(materials.add(StandardMaterial {
        base_color_texture: Some(image),
        unlit: true,
        ..default()
    }))
}

/// Moves to the next background image.
pub fn advance_background(
    assets: &RunnerAssets,
    cursor: &mut BackgroundCursor,
    materials: &mut Assets<StandardMaterial>,
    handles: &mut RunnerHandles,
    backgrounds: &mut Query<&mut Handle<StandardMaterial>, With<Background>>,
) {
    cursor.0 += 1;
    for mut material in backgrounds.iter_mut() {
        let Some(next) = background_material(assets, cursor.0, materials) else {
            return;
        };
        let previous = std::mem::replace(&mut *material, next.clone());
        handles.materials.retain(|handle| handle != &previous);
        handles.materials.push(next);
    }
}

pub fn scroll_floor(
    clock: Res<FrameClock>,
    settings: Res<RunnerSettings>,
    pool: Res<FloorPool>,
    mut transforms: Query<&mut Transform, With<FloorSegment>>,
) {
    let mut xs: SmallVec<[f32; MAX_POOL]> = pool
        .segments
        .iter()
        .map(|entity| transforms.get(*entity).map_or(0.0, |t| t.translation.x))
        .collect();
    scroll_and_recycle(
        &mut xs,
        settings.world_speed * clock.delta(),
        settings.floor_behind,
        settings.floor_segment_length,
        |_| {},
    );
    for (entity, x) in pool.segments.iter().zip(xs) {
        if let Ok(mut transform) = transforms.get_mut(*entity) {
            transform.translation.x = x;
        }
    }
}

pub fn scroll_obstacles(
    clock: Res<FrameClock>,
    settings: Res<RunnerSettings>,
    pool: Res<ObstaclePool>,
    mut rng: ResMut<RunnerRng>,
    mut obstacles: Query<(&mut Transform, &mut Lane), With<Obstacle>>,
) {
    let mut xs: SmallVec<[f32; MAX_POOL]> = pool
        .slots
        .iter()
        .map(|entity| obstacles.get(*entity).map_or(0.0, |(t, _)| t.translation.x))
        .collect();
    let mut recycled: SmallVec<[usize; MAX_POOL]> = SmallVec::new();
    scroll_and_recycle(
        &mut xs,
        settings.world_speed * clock.delta(),
        settings.obstacle_behind,
        settings.obstacle_spacing,
        |i| recycled.push(i),
    );
    for (i, (entity, x)) in pool.slots.iter().zip(xs).enumerate() {
        let Ok((mut transform, mut lane)) = obstacles.get_mut(*entity) else {
            continue;
        };
        transform.translation.x = x;
        if recycled.contains(&i) {
            *lane = rng.lane();
            transform.translation.z = lane.z(settings.lane_width);
        }
    }
}

pub fn accumulate_distance(
    clock: Res<FrameClock>,
    settings: Res<RunnerSettings>,
    mut distance: ResMut<Distance>,
) {
    distance.current += settings.world_speed * clock.delta();
}

/// Puts floor and obstacles back where a fresh run starts.
pub fn reseed_world(
    settings: &RunnerSettings,
    floor: &FloorPool,
    obstacles: &ObstaclePool,
    rng: &mut RunnerRng,
    transforms: &mut Query<(&mut Transform, Option<&mut Lane>), Or<(With<FloorSegment>, With<Obstacle>)>>,
) {
    for (entity, x) in floor.segments.iter().zip(floor_layout(settings)) {
        if let Ok((mut transform, _)) = transforms.get_mut(*entity) {
            transform.translation.x = x;
        }
    }
    for (entity, x) in obstacles.slots.iter().zip(obstacle_layout(settings)) {
        if let Ok((mut transform, lane)) = transforms.get_mut(*entity) {
            let next = rng.lane();
            if let Some(mut lane) = lane {
                *lane = next;
            }
            transform.translation = Vec3::new(x, 0.0, next.z(settings.lane_width));
        }
    }
}
