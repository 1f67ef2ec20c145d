use bevy::prelude::*;

use crate::components::{Collider, Obstacle, Player};
use crate::settings::RunnerSettings;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_collider(translation: Vec3, collider: &Collider) -> Self {
        let center = translation + collider.offset;
        Self {
            min: center - collider.half_extents,
            max: center + collider.half_extents,
        }
    }

    // never past the centre
    pub fn shrunk_xz(self, margin: f32) -> Self {
        let half = (self.max - self.min) / 2.0;
        let shrink = Vec3::new(margin.min(half.x), 0.0, margin.min(half.z));
        Self {
            min: self.min + shrink,
            max: self.max - shrink,
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

/// Key of the first obstacle box overlapping `player`; later boxes are not examined.
pub fn first_hit<K>(player: &Bounds, obstacles: impl IntoIterator<Item = (K, Bounds)>) -> Option<K> {
    obstacles
        .into_iter()
        .find(|(_, obstacle)| player.intersects(obstacle))
        .map(|(key, _)| key)
}

#[derive(Event, Clone, Copy, Debug)]
pub struct PlayerHit {
    pub obstacle: Entity,
}

pub fn detect_collisions(
    settings: Res<RunnerSettings>,
    player: Query<(&Transform, &Collider), With<Player>>,
    obstacles: Query<(Entity, &Transform, &Collider), (With<Obstacle>, Without<Player>)>,
    mut hits: EventWriter<PlayerHit>,
) {
    let Ok((player_transform, player_collider)) = player.get_single() else {
        return;
    };
    let player_bounds = Bounds::from_collider(player_transform.translation, player_collider)
        .shrunk_xz(settings.collision_margin);
    let boxes = obstacles
        .iter()
        .map(|(entity, transform, collider)| (entity, Bounds::from_collider(transform.translation, collider)));
    if let Some(obstacle) = first_hit(&player_bounds, boxes) {
        info!("player hit obstacle {obstacle:?}");
        hits.send(PlayerHit { obstacle });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(center: Vec3, half: f32) -> Bounds {
        Bounds {
            min: center - Vec3::splat(half),
            max: center + Vec3::splat(half),
        }
    }

    #[test]
    fn intersection_is_symmetric() {
        let cases = [
            (cube(Vec3::ZERO, 1.0), cube(Vec3::new(1.5, 0.0, 0.0), 1.0)),
            (cube(Vec3::ZERO, 1.0), cube(Vec3::new(2.0, 0.0, 0.0), 1.0)),
            (cube(Vec3::ZERO, 1.0), cube(Vec3::new(2.1, 0.0, 0.0), 1.0)),
            (cube(Vec3::ZERO, 3.0), cube(Vec3::new(0.5, 0.5, 0.5), 0.1)),
            (cube(Vec3::ZERO, 1.0), cube(Vec3::new(0.0, 5.0, 0.0), 1.0)),
        ];
        for (a, b) in cases {
            assert_eq!(a.intersects(&b), b.intersects(&a), "{a:?} vs {b:?}");
        }
        assert!(cases[0].0.intersects(&cases[0].1));
        assert!(cases[1].0.intersects(&cases[1].1));
        assert!(!cases[2].0.intersects(&cases[2].1));
        assert!(cases[3].0.intersects(&cases[3].1));
    }

    #[test]
    fn a_jump_clears_a_low_obstacle() {
        let obstacle = Bounds::from_collider(Vec3::ZERO, &Collider::grounded(Vec3::splat(1.0)));
        let player = Collider::grounded(Vec3::new(0.8, 1.8, 0.8));
        assert!(Bounds::from_collider(Vec3::ZERO, &player).intersects(&obstacle));
        assert!(!Bounds::from_collider(Vec3::new(0.0, 1.2, 0.0), &player).intersects(&obstacle));
    }

    #[test]
    fn neighbouring_lane_does_not_collide() {
        let obstacle = Bounds::from_collider(Vec3::new(0.0, 0.0, 2.5), &Collider::grounded(Vec3::splat(1.6)));
        let player = Bounds::from_collider(Vec3::ZERO, &Collider::grounded(Vec3::new(0.8, 1.8, 0.8)));
        assert!(!player.intersects(&obstacle));
    }

    #[test]
    fn first_hit_stops_at_the_first_overlap() {
        let player = cube(Vec3::ZERO, 1.0);
        let obstacles = [
            (0, cube(Vec3::new(10.0, 0.0, 0.0), 1.0)),
            (1, cube(Vec3::new(0.5, 0.0, 0.0), 1.0)),
            (2, cube(Vec3::new(-0.5, 0.0, 0.0), 1.0)),
        ];
        let mut examined = 0;
        let hit = first_hit(
            &player,
            obstacles.iter().copied().inspect(|_| examined += 1),
        );
        assert_eq!(hit, Some(1));
        assert_eq!(examined, 2);
        assert_eq!(first_hit(&player, [obstacles[0]]), None);
    }

    #[test]
    fn shrink_never_inverts_the_box() {
        let shrunk = cube(Vec3::ZERO, 0.1).shrunk_xz(1.0);
        assert!(shrunk.min.x <= shrunk.max.x);
        assert!(shrunk.min.z <= shrunk.max.z);
        assert_eq!(shrunk.min.y, -0.1);
    }

    #[test]
    fn system_reports_a_single_hit() {
        let mut app = App::new();
        app.add_event::<PlayerHit>()
            .insert_resource(RunnerSettings::default())
            .add_systems(Update, detect_collisions);

        app.world.spawn((
            Player,
            Transform::default(),
            Collider::grounded(Vec3::new(0.8, 1.8, 0.8)),
        ));
        for x in [0.2, 0.4, 30.0] {
            app.world.spawn((
                Obstacle,
                Transform::from_xyz(x, 0.0, 0.0),
                Collider::grounded(Vec3::splat(1.6)),
            ));
        }
        app.update();

        let events = app.world.resource::<Events<PlayerHit>>();
        let mut reader = events.get_reader();
        assert_eq!(reader.read(events).count(), 1);
    }
}
