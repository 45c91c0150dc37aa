use super::Vehicle;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A lane change completes once the vehicle is within this fraction of a lane of its target.
const COMPLETION_TOLERANCE: f64 = 0.01;

/// The direction of a lane change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Towards lane 0, the preferred lane.
    Right,
    /// Away from lane 0, used for overtaking.
    Left,
}

impl Direction {
    /// The change in lane number for one whole lane in this direction.
    pub fn signum(self) -> i32 {
        match self {
            Direction::Right => -1,
            Direction::Left => 1,
        }
    }

    fn sign(self) -> f64 {
        self.signum() as f64
    }
}

/// The lane changing state of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneState {
    /// Travelling along a single lane.
    Cruising,
    /// Moving across to the `target` lane.
    Changing { direction: Direction, target: usize },
}

impl LaneState {
    /// Whether a lane change is in progress.
    pub fn is_changing(&self) -> bool {
        matches!(self, LaneState::Changing { .. })
    }

    /// -1 when changing right, +1 when changing left and 0 when cruising.
    pub fn direction(&self) -> i32 {
        match self {
            LaneState::Cruising => 0,
            LaneState::Changing { direction, .. } => direction.signum(),
        }
    }
}

impl Vehicle {
    /// The lane one whole lane away in `direction`, if it exists on a road of `lane_count` lanes.
    pub(crate) fn adjacent_lane(&self, direction: Direction, lane_count: usize) -> Option<usize> {
        let target = match direction {
            Direction::Right => self.lane.ceil() - 1.0,
            Direction::Left => self.lane.floor() + 1.0,
        };
        (target >= 0.0 && target < lane_count as f64).then_some(target as usize)
    }

    /// Starts a lane change. Returns `false` if already changing
    /// or if there is no lane in that direction.
    pub(crate) fn begin_lane_change(&mut self, direction: Direction, lane_count: usize) -> bool {
        if self.lane_state.is_changing() {
            return false;
        }
        match self.adjacent_lane(direction, lane_count) {
            Some(target) => {
                self.lane_state = LaneState::Changing { direction, target };
                true
            }
            None => false,
        }
    }

    /// Moves the vehicle `step` of a lane towards its target lane.
    /// Returns `true` iff the lane change completed on this frame.
    pub(crate) fn advance_lane_change(&mut self, step: f64, frame: usize) -> bool {
        let LaneState::Changing { direction, target } = self.lane_state else {
            return false;
        };

        let lane = self.lane + direction.sign() * step;
        let remaining = (target as f64 - lane) * direction.sign();
        if remaining < COMPLETION_TOLERANCE {
            self.lane = target as f64;
            self.lane_state = LaneState::Cruising;
            self.changed_lanes_frame = frame;
            true
        } else {
            self.lane = lane;
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle::Role;
    use crate::{ShapeId, VehicleId};
    use assert_approx_eq::assert_approx_eq;

    fn vehicle(lane: usize) -> Vehicle {
        Vehicle::new(
            VehicleId::default(),
            Role::Other,
            lane,
            0.0,
            0.1,
            0,
            ShapeId::default(),
        )
    }

    #[test]
    fn snaps_on_completion() {
        let mut veh = vehicle(1);
        veh.set_lane(1.98);
        assert!(veh.begin_lane_change(Direction::Left, 3));
        assert!(veh.advance_lane_change(0.05, 7));
        assert_eq!(veh.lane(), 2.0);
        assert_eq!(veh.lane_state(), LaneState::Cruising);
        assert_eq!(veh.changed_lanes_frame(), 7);
    }

    #[test]
    fn full_change_takes_twenty_steps() {
        let mut veh = vehicle(2);
        assert!(veh.begin_lane_change(Direction::Right, 3));
        assert_eq!(veh.lane_state().direction(), -1);

        let mut steps = 0;
        while !veh.advance_lane_change(0.05, 100) {
            steps += 1;
            assert!(veh.lane() > 1.0 && veh.lane() < 2.0);
            assert!(veh.is_changing_lanes());
        }
        assert_eq!(steps, 19);
        assert_eq!(veh.lane(), 1.0);
        assert_eq!(veh.lane_state().direction(), 0);
    }

    #[test]
    fn stays_on_road() {
        let mut veh = vehicle(0);
        assert!(!veh.begin_lane_change(Direction::Right, 3));
        let mut veh = vehicle(2);
        assert!(!veh.begin_lane_change(Direction::Left, 3));
        assert_eq!(veh.lane_state(), LaneState::Cruising);
    }

    #[test]
    fn cannot_restart_mid_change() {
        let mut veh = vehicle(1);
        assert!(veh.begin_lane_change(Direction::Left, 3));
        veh.advance_lane_change(0.05, 1);
        assert!(!veh.begin_lane_change(Direction::Right, 3));
        assert_approx_eq!(veh.lane(), 1.05);
    }
}
