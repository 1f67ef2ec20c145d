use bevy::math::Vec3;
use bevy::render::primitives::Aabb;
use bevy::transform::components::Transform;

/// Moves `current` toward `target` by the fraction `1 - e^(-rate * dt)`.
/// Never overshoots, and a zero `dt` leaves `current` untouched.
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let t = 1.0 - (-rate * dt).exp();
    let next = current + (target - current) * t;
    if (target - next).abs() < 1e-4 {
        return target;
    }
    return next;
}

pub fn approach_vec3(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    Vec3::new(
        approach(current.x, target.x, rate, dt),
        approach(current.y, target.y, rate, dt),
        approach(current.z, target.z, rate, dt),
    )
}

/// Positions for `count` pool members laid out `spacing` apart from `start`.
pub fn seed_layout(count: usize, start: f32, spacing: f32) -> impl Iterator<Item = f32> {
    (0..count).map(move |i| start + i as f32 * spacing)
}

/// Min/max corners of a mesh-local box after applying `transform`.
pub fn transformed_bounds(aabb: &Aabb, transform: &Transform) -> (Vec3, Vec3) {
    let min = Vec3::from(aabb.min());
    let max = Vec3::from(aabb.max());
    let mut lo = Vec3::splat(f32::INFINITY);
    let mut hi = Vec3::splat(f32::NEG_INFINITY);
    for x in [min.x, max.x] {
        for y in [min.y, max.y] {
            for z in [min.z, max.z] {
                let p = transform.transform_point(Vec3::new(x, y, z));
                lo = lo.min(p);
                hi = hi.max(p);
            }
        }
    }
    return (lo, hi);
}
