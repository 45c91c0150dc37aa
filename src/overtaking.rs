//! Lane discipline: keep right whenever possible, and only overtake on the left.

use crate::proximity::is_lane_blocked;
use crate::vehicle::{Direction, Vehicle};
use crate::{SimConfig, VehicleId, VehicleSet};

/// Decides whether vehicle `id` should start a lane change this frame, and starts it if so.
///
/// A cruising vehicle whose cooldown has passed moves right if the lane to its
/// right is clear. Failing that, a vehicle which is `blocked` moves left to
/// overtake if the lane to its left is clear. Returns the direction of the
/// lane change started, if any.
pub(crate) fn plan_lane_change(
    vehicles: &mut VehicleSet,
    id: VehicleId,
    blocked: bool,
    frame: usize,
    config: &SimConfig,
) -> Option<Direction> {
    let veh = vehicles.get(id)?;
    if veh.is_changing_lanes() || !veh.cooled_down(frame, config.lane_change_cooldown) {
        return None;
    }

    let direction = if is_clear(vehicles, veh, Direction::Right, config) {
        Direction::Right
    } else if blocked && is_clear(vehicles, veh, Direction::Left, config) {
        Direction::Left
    } else {
        return None;
    };

    let veh = &mut vehicles[id];
    if veh.begin_lane_change(direction, config.lane_count) {
        log::trace!("{:?} changing lanes {:?} from lane {}", id, direction, veh.lane());
        Some(direction)
    } else {
        None
    }
}

/// Whether there is a lane in `direction` and nobody is in the way of moving into it.
fn is_clear(vehicles: &VehicleSet, veh: &Vehicle, direction: Direction, config: &SimConfig) -> bool {
    veh.adjacent_lane(direction, config.lane_count)
        .map_or(false, |lane| !is_lane_blocked(vehicles, veh, lane, config.near_test))
}
