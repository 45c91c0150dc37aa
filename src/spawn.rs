//! Placing new vehicles on the road without overlapping any existing one.

use crate::registry::{Placement, Registry};
use crate::util::Interval;
use crate::SimConfig;
use rand::Rng;

/// Spacing of the grid the initial traffic is scattered on.
const INITIAL_GRID: f64 = 50.0;

/// How far beyond the edge of the screen new vehicles appear.
const SPAWN_OFFSET: f64 = 100.0;

/// Draws a speed bucket for a new vehicle.
///
/// Once the simulation is running a stationary vehicle is never spawned,
/// since where it appears depends on which way it is drifting.
pub(crate) fn draw_speed<R: Rng>(rng: &mut R, config: &SimConfig, frame: usize) -> f64 {
    let mut bucket = rng.gen_range(-config.speed_buckets..=config.speed_buckets);
    if bucket == 0 && frame > 0 {
        bucket = if rng.gen_bool(0.5) { -1 } else { 1 };
    }
    bucket as f64 * config.speed_step
}

/// Picks where a new vehicle first appears.
///
/// On the first frame anywhere along the road will do. Afterwards vehicles
/// drifting backwards appear ahead of the screen, and vehicles drifting
/// forwards appear behind it.
pub(crate) fn draw_x<R: Rng>(rng: &mut R, config: &SimConfig, frame: usize, speed: f64) -> f64 {
    if frame == 0 {
        let cells = (config.road_width / INITIAL_GRID) as i64;
        rng.gen_range(-2..cells + 2) as f64 * INITIAL_GRID
    } else if speed > 0.0 {
        -SPAWN_OFFSET
    } else {
        config.road_width + SPAWN_OFFSET
    }
}

/// Picks a lane for a new vehicle.
///
/// Vehicles drifting backwards (positive speed) favour lane 0, vehicles
/// drifting forwards favour the last lane. The lane `k` lanes away from the
/// favoured edge wins `2 * (lane_count - k) - 1` of `lane_count²` draws.
pub(crate) fn draw_lane<R: Rng>(rng: &mut R, lane_count: usize, speed: f64) -> usize {
    if speed == 0.0 {
        return rng.gen_range(0..lane_count);
    }

    // Count outwards from the unfavoured edge with windows of 1, 3, 5, ...
    let mut draw = rng.gen_range(0..lane_count * lane_count) as i64;
    let mut window = 1;
    let mut steps = 0;
    draw -= window;
    while draw >= 0 && steps + 1 < lane_count {
        window += 2;
        draw -= window;
        steps += 1;
    }

    if speed > 0.0 {
        lane_count - 1 - steps
    } else {
        steps
    }
}

/// Finds a free spot for a new vehicle, or `None` if none turns up within the attempt limit.
///
/// The first spot drawn is nudged one lane or one following distance at a
/// time until it is clear of every vehicle on the road, ego included.
pub(crate) fn place<R: Rng>(
    registry: &Registry,
    config: &SimConfig,
    frame: usize,
    rng: &mut R,
) -> Option<Placement> {
    let speed = draw_speed(rng, config, frame);
    let mut x = draw_x(rng, config, frame, speed);
    let mut lane = draw_lane(rng, config.lane_count, speed);

    let window = Interval::padded(0.0, config.road_width, config.purge_margin);
    let screen = Interval::new(-config.vehicle_length, config.road_width);
    let can_move_to = |x: f64| window.contains(x) && (frame == 0 || !screen.surrounds(x));

    for _ in 0..config.spawn_attempts {
        if !registry.is_occupied(lane, x, config.near_test) {
            return Some(Placement { lane, x, speed });
        }
        match rng.gen_range(0..4) {
            0 if lane < config.last_lane() => lane += 1,
            1 if lane > 0 => lane -= 1,
            2 if can_move_to(x + config.near_test) => x += config.near_test,
            3 if can_move_to(x - config.near_test) => x -= config.near_test,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn road(config: &SimConfig) -> Registry {
        Registry::new(
            config.ego_lane,
            config.ego_x,
            config.max_shapes,
            config.lane_pitch,
            config.lane_origin,
        )
        .unwrap()
    }

    #[test]
    fn no_stationary_vehicles_after_start() {
        let config = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1000 {
            let speed = draw_speed(&mut rng, &config, 10);
            assert!(speed != 0.0);
            assert!(speed.abs() <= 0.3 + 1e-9);
        }
    }

    #[test]
    fn spawns_off_screen() {
        let config = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(draw_x(&mut rng, &config, 5, 0.1), -100.0);
        assert_eq!(draw_x(&mut rng, &config, 5, -0.1), 1300.0);
        for _ in 0..100 {
            let x = draw_x(&mut rng, &config, 0, 0.1);
            assert!((-100.0..1300.0).contains(&x));
            assert_eq!(x % 50.0, 0.0);
        }
    }

    #[test]
    fn lane_bias() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut backwards = [0; 3];
        let mut forwards = [0; 3];
        for _ in 0..9000 {
            backwards[draw_lane(&mut rng, 3, 0.1)] += 1;
            forwards[draw_lane(&mut rng, 3, -0.1)] += 1;
        }
        // Expected 5000 / 3000 / 1000
        assert!(backwards[0] > backwards[1] && backwards[1] > backwards[2]);
        assert!(forwards[2] > forwards[1] && forwards[1] > forwards[0]);
        assert!((4500..5500).contains(&backwards[0]));
        assert!((700..1300).contains(&forwards[0]));
    }

    #[test]
    fn single_lane_road() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(draw_lane(&mut rng, 1, 0.2), 0);
            assert_eq!(draw_lane(&mut rng, 1, -0.2), 0);
        }
    }

    #[test]
    fn placement_is_clear() {
        let config = SimConfig::default();
        let mut registry = road(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for frame in [0, 160, 320, 480, 640, 800] {
            if let Some(placement) = place(&registry, &config, frame, &mut rng) {
                assert!(!registry.is_occupied(placement.lane, placement.x, config.near_test));
                assert!(placement.lane < config.lane_count);
                registry.insert(placement, frame).unwrap();
            }
        }
    }

    #[test]
    fn gives_up_on_a_full_road() {
        let config = SimConfig {
            lane_count: 1,
            near_test: 1.0e6,
            ..Default::default()
        };
        let registry = road(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(place(&registry, &config, 160, &mut rng), None);
    }
}
