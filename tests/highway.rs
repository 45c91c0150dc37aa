//! Tests that run the whole highway simulation.

use highway_sim::{SimConfig, Simulation, VehicleId};
use std::collections::{HashMap, HashSet};

/// A configuration without any randomness in free flow, and no spawning.
fn quiet_config() -> SimConfig {
    SimConfig {
        ego_lane: 1,
        ego_increment: 0.0,
        jitter_steps: 0,
        spawn_period: 1_000_000,
        ..Default::default()
    }
}

/// Test that ego catching up with a slower vehicle stops it, and that it recovers afterwards.
#[test]
fn ego_pulls_back_vehicle_ahead() {
    let mut sim = Simulation::seeded(quiet_config(), 1).unwrap();
    let veh = sim.add_vehicle(1, 300.0, 0.1).unwrap();

    sim.step();
    assert!(sim.ego().is_blocked());
    assert_eq!(sim.ego().blocker(), Some(veh));
    assert_eq!(sim.get_vehicle(veh).unwrap().speed(), 0.0);
    assert_eq!(sim.get_vehicle(veh).unwrap().previous_speed(), 0.1);
    assert_eq!(sim.ego().speed(), 0.0);

    let mut steps = 0;
    while sim.ego().is_blocked() {
        sim.step();
        steps += 1;
        assert!(steps < 200, "ego never got free");
    }
    let veh = sim.get_vehicle(veh).unwrap();
    assert_eq!(veh.speed(), veh.previous_speed());
    assert_eq!(veh.speed(), 0.1);
}

/// Test that a blocked vehicle holds its following distance behind ego.
#[test]
fn follower_keeps_distance() {
    let mut sim = Simulation::seeded(quiet_config(), 1).unwrap();
    let veh = sim.add_vehicle(1, 500.0, -0.2).unwrap();
    for _ in 0..30 {
        sim.step();
        let veh = sim.get_vehicle(veh).unwrap();
        assert!(veh.x() > sim.ego().x());
        assert_eq!(sim.ego().x(), 450.0);
    }
    let veh = sim.get_vehicle(veh).unwrap();
    assert!(veh.is_blocked());
    assert_eq!(veh.speed(), 0.0);
}

/// Test that purged vehicles vanish from the road and hand their shapes back.
#[test]
fn purged_vehicles_release_shapes() {
    let mut sim = Simulation::seeded(quiet_config(), 1).unwrap();
    let veh = sim.add_vehicle(2, 2190.0, 0.3).unwrap();
    let shape = sim.get_vehicle(veh).unwrap().shape();

    for _ in 0..10 {
        sim.step();
    }
    assert!(sim.get_vehicle(veh).is_none());
    assert_eq!(sim.recycled_shapes(), 1);
    assert!(!sim.shape(shape).unwrap().visible);
    assert!(sim.iter_shapes().all(|(id, _)| id != shape));
}

#[test]
fn invalid_setup_is_rejected() {
    let config = SimConfig {
        lane_count: 0,
        ..Default::default()
    };
    assert!(Simulation::seeded(config, 0).is_err());

    let mut sim = Simulation::seeded(SimConfig::default(), 0).unwrap();
    assert!(sim.add_vehicle(3, 100.0, 0.1).is_err());
    assert_eq!(sim.iter_vehicles().count(), 1);

    // No hand placement once the simulation has started
    sim.step();
    assert!(sim.add_vehicle(0, 100.0, 0.1).is_err());
    assert_eq!(sim.iter_vehicles().count(), 1);
}

#[test]
fn populates_only_once() {
    let mut sim = Simulation::seeded(SimConfig::default(), 3).unwrap();
    sim.populate();
    let count = sim.iter_vehicles().count();
    assert_eq!(sim.populate(), 0);
    assert_eq!(sim.iter_vehicles().count(), count);
}

#[test]
fn reports_overlapping_vehicles() {
    let config = SimConfig {
        report_period: 1,
        ..quiet_config()
    };
    let mut sim = Simulation::seeded(config, 0).unwrap();
    sim.add_vehicle(0, 100.0, 0.0).unwrap();
    sim.add_vehicle(0, 130.0, 0.0).unwrap();
    sim.step();
    assert_eq!(sim.anomalies().len(), 1);
    assert_eq!(sim.report().vehicles, 2);
    assert_eq!(sim.report().on_screen, 2);
}

/// Test the invariants that must hold on every frame of a busy simulation,
/// including that no two vehicles ever overlap in the same lane.
#[test]
fn invariants_hold_over_long_runs() {
    for seed in 0..8 {
        let config = SimConfig {
            report_period: 1,
            ..Default::default()
        };
        let cooldown = config.lane_change_cooldown;
        let last_lane = config.last_lane() as f64;
        let mut sim = Simulation::seeded(config, seed).unwrap();
        sim.populate();

        let mut changing = HashMap::<VehicleId, bool>::new();
        for _ in 0..3000 {
            sim.step();
            assert!(sim.anomalies().is_empty(), "{:?}", sim.anomalies());
            assert_eq!(sim.ego().speed(), 0.0);
            assert_eq!(sim.ego().x(), 450.0);
            assert_eq!(sim.iter_vehicles().filter(|veh| veh.is_ego()).count(), 1);

            let mut shapes = HashSet::new();
            for veh in sim.iter_vehicles() {
                assert!(veh.lane() >= 0.0 && veh.lane() <= last_lane);
                assert_eq!(veh.is_changing_lanes(), veh.lane_state().direction() != 0);
                assert!(!veh.stuck_behind().contains(&veh.id()));

                // A new lane change only starts after the cooldown
                let was_changing = changing.insert(veh.id(), veh.is_changing_lanes());
                if veh.is_changing_lanes() && was_changing == Some(false) {
                    assert!(sim.frame() > veh.changed_lanes_frame() + cooldown);
                }

                // Each active vehicle owns a distinct, freshly drawn shape
                assert!(shapes.insert(veh.shape()));
                assert!(!sim.shapes().is_free(veh.shape()));
                let shape = sim.shape(veh.shape()).unwrap();
                assert!(shape.visible);
                assert_eq!(shape.position.x, veh.x());
                assert_eq!(shape.position.y, veh.top(100.0, 80.0));
                assert_eq!(shape.fill, veh.fill());
            }
            assert!(sim.shapes().allocated() <= sim.config().max_shapes);
        }
    }
}

/// Test that every successful spawn lands in a clear spot.
#[test]
fn spawns_are_collision_free() {
    for seed in 0..8 {
        let config = SimConfig::default();
        let near_test = config.near_test;
        let mut sim = Simulation::seeded(config, seed).unwrap();
        sim.populate();
        for _ in 0..200 {
            sim.step();
            let Some(id) = sim.spawn() else {
                continue;
            };
            let new = sim.get_vehicle(id).unwrap();
            assert!(new.speed() != 0.0);
            for veh in sim.iter_vehicles().filter(|veh| veh.id() != id) {
                assert!(!(veh.overlaps_lane(new.lane()) && (veh.x() - new.x()).abs() < near_test));
            }
        }
    }
}

/// Test that a small shape budget is never exceeded, and recycled shapes are reused.
#[test]
fn shapes_are_recycled() {
    let config = SimConfig {
        max_shapes: 4,
        spawn_period: 20,
        ..Default::default()
    };
    let mut sim = Simulation::seeded(config, 5).unwrap();
    sim.populate();
    let mut ever_recycled = false;
    for _ in 0..5000 {
        sim.step();
        assert!(sim.shapes().allocated() <= 4);
        ever_recycled |= sim.recycled_shapes() > 0;
    }
    assert!(ever_recycled);
    assert!(sim.iter_vehicles().count() <= 4);
}

/// Test that two simulations with the same seed evolve identically.
#[test]
fn seeded_runs_are_reproducible() {
    let run = |seed| {
        let mut sim = Simulation::seeded(SimConfig::default(), seed).unwrap();
        sim.populate();
        for _ in 0..1000 {
            sim.step();
        }
        let mut state = sim
            .iter_vehicles()
            .map(|veh| (veh.frame_created(), veh.lane(), veh.x(), veh.speed()))
            .collect::<Vec<_>>();
        state.sort_by(|a, b| a.partial_cmp(b).unwrap());
        state
    };
    assert_eq!(run(9), run(9));
}
