/// Scrolls members back by `distance` and leapfrogs any below `behind` to the front.
pub fn scroll_and_recycle(
    xs: &mut [f32],
    distance: f32,
    behind: f32,
    spacing: f32,
    on_recycle: impl FnMut(usize),
) -> usize {
    for x in xs.iter_mut() {
        *x -= distance;
    }
    leapfrog(xs, behind, spacing, on_recycle)
}

pub fn leapfrog(
    xs: &mut [f32],
    behind: f32,
    spacing: f32,
    mut on_recycle: impl FnMut(usize),
) -> usize {
    let mut front = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut recycled = 0;
    for (i, x) in xs.iter_mut().enumerate() {
        if *x < behind {
            front += spacing;
            *x = front;
            on_recycle(i);
            recycled += 1;
        }
    }
    recycled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::seed_layout;
    use approx::assert_relative_eq;

    #[test]
    fn segment_behind_threshold_moves_to_front() {
        // speed 18 at 60 fps, threshold -30, segment length 20
        let dt = 1.0 / 60.0;
        let mut xs = [-31.0, -11.0, 9.0, 29.0, 49.0, 69.0];
        let mut moved = Vec::new();
        let n = scroll_and_recycle(&mut xs, 18.0 * dt, -30.0, 20.0, |i| moved.push(i));

        assert_eq!(n, 1);
        assert_eq!(moved, vec![0]);
        let front_after_move = 69.0 - 18.0 * dt;
        assert_relative_eq!(xs[0], front_after_move + 20.0, epsilon = 1e-4);
    }

    #[test]
    fn recycled_members_land_strictly_ahead() {
        for distance in [0.0, 0.01, 0.3, 5.0, 19.9] {
            let mut xs: Vec<f32> = seed_layout(6, -35.0, 20.0).collect();
            let before = xs.clone();
            let mut recycled = Vec::new();
            scroll_and_recycle(&mut xs, distance, -30.0, 20.0, |i| recycled.push(i));
            for i in recycled {
                let others = xs
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, x)| *x);
                for other in others {
                    assert!(xs[i] > other, "distance {distance}: {} <= {other}", xs[i]);
                }
                assert!(xs[i] > before[i]);
            }
        }
    }

    #[test]
    fn several_members_behind_stack_up_in_order() {
        let mut xs = [-50.0, -40.0, 10.0];
        leapfrog(&mut xs, -30.0, 20.0, |_| {});
        assert_eq!(xs, [30.0, 50.0, 10.0]);
    }

    #[test]
    fn spacing_holds_at_steady_state() {
        let dt = 1.0 / 60.0;
        let speed = 18.0;
        for (count, start, spacing, behind) in [(6, -20.0, 20.0, -30.0), (6, 40.0, 24.0, -10.0)] {
            let mut xs: Vec<f32> = seed_layout(count, start, spacing).collect();
            for frame in 0..20_000 {
                scroll_and_recycle(&mut xs, speed * dt, behind, spacing, |_| {});
                let mut sorted = xs.clone();
                sorted.sort_by(f32::total_cmp);
                for pair in sorted.windows(2) {
                    let gap = pair[1] - pair[0];
                    assert!((gap - spacing).abs() < 0.05, "frame {frame}: gap {gap}");
                }
            }
        }
    }

    #[test]
    fn empty_pool_is_a_no_op() {
        let mut xs: [f32; 0] = [];
        assert_eq!(scroll_and_recycle(&mut xs, 1.0, 0.0, 1.0, |_| {}), 0);
    }
}
