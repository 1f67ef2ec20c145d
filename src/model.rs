use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

use crate::components::{Collider, FitHeight};
use crate::math::transformed_bounds;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelFit {
    pub scale: f32,
    pub translation: Vec3,
    pub collider: Collider,
}

/// `None` when the bounds are degenerate (no height to scale).
pub fn fit_to_height(min: Vec3, max: Vec3, height: f32) -> Option<ModelFit> {
    let size = max - min;
    if !(size.y > f32::EPSILON) || !size.is_finite() {
        return None;
    }
    let scale = height / size.y;
    let center = (min + max) / 2.0;
    let translation = Vec3::new(-center.x, -min.y, -center.z) * scale;
    Some(ModelFit {
        scale,
        translation,
        collider: Collider::grounded(size * scale),
    })
}

fn relative_transform(
    entity: Entity,
    root: Entity,
    transforms: &Query<&Transform>,
    parents: &Query<&Parent>,
) -> Transform {
    let mut result = transforms.get(entity).copied().unwrap_or_default();
    let mut current = entity;
    while let Ok(parent) = parents.get(current) {
        let parent = parent.get();
        if parent == root {
            break;
        }
        let parent_transform = transforms.get(parent).copied().unwrap_or_default();
        result = parent_transform.mul_transform(result);
        current = parent;
    }
    result
}

// The scene root gets the scale, its parent (carrying FitHeight) the collider.
pub fn prepare_models(
    mut ready: EventReader<SceneInstanceReady>,
    fits: Query<&FitHeight>,
    parents: Query<&Parent>,
    children: Query<&Children>,
    mesh_handles: Query<&Handle<Mesh>>,
    transforms: Query<&Transform>,
    meshes: Res<Assets<Mesh>>,
    mut commands: Commands,
) {
    for event in ready.read() {
        let scene_root = event.parent;
        let Ok(owner) = parents.get(scene_root).map(|p| p.get()) else {
            continue;
        };
        let Ok(fit) = fits.get(owner) else {
            continue;
        };

        // keep whatever facing the spawner gave the scene root
        let facing = Transform::from_rotation(
            transforms.get(scene_root).map_or(Quat::IDENTITY, |t| t.rotation),
        );
        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);
        for descendant in children.iter_descendants(scene_root) {
            let Ok(handle) = mesh_handles.get(descendant) else {
                continue;
            };
            let Some(aabb) = meshes.get(handle).and_then(|mesh| mesh.compute_aabb()) else {
                continue;
            };
            let local = facing.mul_transform(relative_transform(descendant, scene_root, &transforms, &parents));
            let (min, max) = transformed_bounds(&aabb, &local);
            lo = lo.min(min);
            hi = hi.max(max);
        }

        let Some(model_fit) = fit_to_height(lo, hi, fit.0) else {
            info!("model under {owner:?} has no usable geometry, keeping default collider");
            continue;
        };
        commands.entity(scene_root).insert(
            Transform::from_translation(model_fit.translation)
                .with_rotation(facing.rotation)
                .with_scale(Vec3::splat(model_fit.scale)),
        );
        commands.entity(owner).insert(model_fit.collider).remove::<FitHeight>();
    }
}
