//! Speed coordination in the ego vehicle's frame of reference.
//!
//! The ego vehicle never moves on screen. Whatever speed it gains on a tick is
//! taken off every other vehicle instead, and when it is held up the vehicles
//! it is queued behind are pulled back to its own (zero) speed.

use crate::registry::Registry;
use crate::{SimConfig, VehicleId};
use rand::Rng;
use std::iter::once;

/// Applies the car following model and the ego reference frame to every vehicle.
/// Must run after every vehicle's blocker has been determined for this frame.
pub(crate) fn coordinate<R: Rng>(registry: &mut Registry, config: &SimConfig, rng: &mut R) {
    let others = registry.other_ids();
    follow_blockers(registry, &others, config, rng);
    apply_ego_frame(registry, &others, config);
    keep_distance(registry, config);
}

/// Blocked vehicles adopt the fastest speed among the vehicles they are queued behind,
/// free vehicles return to their own speed with a little jitter.
fn follow_blockers<R: Rng>(registry: &mut Registry, others: &[VehicleId], config: &SimConfig, rng: &mut R) {
    for &id in others {
        let vehicles = registry.vehicles();
        let veh = &vehicles[id];
        match veh.blocker() {
            Some(blocker) => {
                let speed = once(blocker)
                    .chain(veh.stuck_behind().iter().copied())
                    .filter_map(|id| vehicles.get(id))
                    .map(|ahead| ahead.speed())
                    .reduce(f64::max);
                if let (Some(speed), Some(veh)) = (speed, registry.get_mut(id)) {
                    veh.set_speed(speed);
                }
            }
            None => {
                let jitter = rng.gen_range(-config.jitter_steps..=config.jitter_steps);
                if let Some(veh) = registry.get_mut(id) {
                    veh.restore_speed();
                    veh.clear_stuck_behind();
                    veh.shift_speeds(jitter as f64 * config.jitter_step);
                }
            }
        }
    }
}

/// Hands the ego vehicle's change of speed on to everyone else and resets it to zero.
fn apply_ego_frame(registry: &mut Registry, others: &[VehicleId], config: &SimConfig) {
    let ego_id = registry.ego_id();
    let ego = registry.ego();
    if ego.is_blocked() {
        let queue = ego.stuck_behind().to_vec();
        for id in queue {
            if let Some(veh) = registry.get_mut(id) {
                veh.set_speed(0.0);
            }
        }
    } else if let Some(ego) = registry.get_mut(ego_id) {
        ego.set_speed(ego.speed() + config.ego_increment);
        ego.clear_stuck_behind();
    }

    let delta = registry.ego().speed();
    for &id in others {
        if let Some(veh) = registry.get_mut(id) {
            veh.shift_speeds(-delta);
        }
    }
    if let Some(ego) = registry.get_mut(ego_id) {
        ego.set_speed(0.0);
    }
}

/// Pushes apart any blocked vehicle that has crept inside the following distance.
/// The ego vehicle stays put, so its blocker is pushed forward instead.
fn keep_distance(registry: &mut Registry, config: &SimConfig) {
    let limit = config.near_test - 1.0;
    let ids = registry.vehicles().keys().collect::<Vec<_>>();
    for id in ids {
        let vehicles = registry.vehicles();
        let veh = &vehicles[id];
        let Some(blocker) = veh.blocker().and_then(|id| vehicles.get(id)) else {
            continue;
        };
        if veh.x() - blocker.x() >= limit {
            continue;
        }
        let (target, delta) = if veh.is_ego() {
            (blocker.id(), -config.nudge)
        } else {
            (id, config.nudge)
        };
        if let Some(veh) = registry.get_mut(target) {
            veh.shift_x(delta);
        }
    }
}
