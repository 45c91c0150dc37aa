//! The car following check and the propagation of queues through chains of blocked vehicles.

use crate::vehicle::Vehicle;
use crate::{VehicleId, VehicleSet};
use smallvec::SmallVec;

/// Whether `ahead` blocks `veh`: same lane, in front, and within the following distance.
pub(crate) fn is_blocking(veh: &Vehicle, ahead: &Vehicle, near_test: f64) -> bool {
    let gap = veh.x() - ahead.x();
    veh.id() != ahead.id() && veh.in_lane(ahead.lane()) && gap > 0.0 && gap < near_test
}

/// Finds the vehicles ahead of `id` that are close enough to hold it back.
///
/// Every blocking vehicle, together with everything that vehicle is itself
/// stuck behind, is added to the stuck-behind set of `id`.
/// Returns the first blocking vehicle found, if any.
pub(crate) fn detect(vehicles: &mut VehicleSet, id: VehicleId, near_test: f64) -> Option<VehicleId> {
    let veh = vehicles.get(id)?;

    let mut blocker = None;
    let mut queue = SmallVec::<[VehicleId; 8]>::new();
    for ahead in vehicles.values() {
        if !is_blocking(veh, ahead, near_test) {
            continue;
        }
        blocker.get_or_insert(ahead.id());
        queue.push(ahead.id());
        queue.extend_from_slice(ahead.stuck_behind());
    }

    let veh = &mut vehicles[id];
    for other in queue {
        veh.add_stuck_behind(other);
    }
    blocker
}

/// Whether another vehicle within `near_test` of `veh` stands in the way of it moving into `lane`.
/// Vehicles that are themselves changing lanes nearby count as being in the way.
pub(crate) fn is_lane_blocked(vehicles: &VehicleSet, veh: &Vehicle, lane: usize, near_test: f64) -> bool {
    vehicles.values().any(|other| {
        other.id() != veh.id()
            && (other.x() - veh.x()).abs() < near_test
            && (other.in_lane(lane as f64) || other.is_changing_lanes())
    })
}
