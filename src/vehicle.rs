pub use self::lane_change::{Direction, LaneState};
use crate::shape::Fill;
use crate::{ShapeId, VehicleId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

mod lane_change;

/// Two lane values closer than this are the same lane.
const LANE_EPSILON: f64 = 1e-9;

/// The part a vehicle plays in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Role {
    /// The single vehicle whose frame of reference the whole scene is drawn in.
    Ego,
    /// Any other vehicle.
    Other,
}

/// A simulated vehicle.
///
/// Speeds are relative to the ego vehicle: another vehicle with a larger
/// speed drifts backwards (towards larger `x`) relative to ego, while the
/// ego vehicle's own speed is an accumulated delta which is handed on to
/// everyone else and reset to zero every tick.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// Whether this is the ego vehicle.
    role: Role,
    /// The lane, fractional while a lane change is in progress.
    lane: f64,
    /// The horizontal position. Smaller is further ahead.
    x: f64,
    /// The speed relative to the ego vehicle.
    speed: f64,
    /// The free-flow speed, restored once the vehicle is no longer blocked.
    previous_speed: f64,
    /// The lane changing state.
    lane_state: LaneState,
    /// The frame on which the vehicle last completed a lane change.
    changed_lanes_frame: usize,
    /// The frame on which the vehicle was created.
    frame_created: usize,
    /// The vehicles this one is queued behind, directly or through a chain of blocked vehicles.
    stuck_behind: SmallVec<[VehicleId; 4]>,
    /// The vehicle directly ahead which blocked this one during the current tick.
    blocker: Option<VehicleId>,
    /// The vehicle's shape in the rendering pool.
    shape: ShapeId,
}

impl Vehicle {
    /// Creates a new vehicle in free flow.
    pub(crate) fn new(
        id: VehicleId,
        role: Role,
        lane: usize,
        x: f64,
        speed: f64,
        frame: usize,
        shape: ShapeId,
    ) -> Self {
        Self {
            id,
            role,
            lane: lane as f64,
            x,
            speed,
            previous_speed: speed,
            lane_state: LaneState::Cruising,
            changed_lanes_frame: 0,
            frame_created: frame,
            stuck_behind: SmallVec::new(),
            blocker: None,
            shape,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Gets the vehicle's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this is the ego vehicle.
    pub fn is_ego(&self) -> bool {
        self.role == Role::Ego
    }

    /// The current lane. Fractional while changing lanes.
    pub fn lane(&self) -> f64 {
        self.lane
    }

    /// Whether the vehicle is exactly in the given lane.
    pub fn in_lane(&self, lane: f64) -> bool {
        (self.lane - lane).abs() < LANE_EPSILON
    }

    /// Whether the vehicle covers any part of the given lane.
    pub fn overlaps_lane(&self, lane: f64) -> bool {
        (self.lane - lane).abs() < 1.0 - LANE_EPSILON
    }

    /// The horizontal position.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// The speed relative to the ego vehicle.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The free-flow speed.
    pub fn previous_speed(&self) -> f64 {
        self.previous_speed
    }

    /// Gets the vehicle's lane change state.
    pub fn lane_state(&self) -> LaneState {
        self.lane_state
    }

    /// Whether a lane change is in progress.
    pub fn is_changing_lanes(&self) -> bool {
        self.lane_state.is_changing()
    }

    /// The frame on which the last lane change completed.
    pub fn changed_lanes_frame(&self) -> usize {
        self.changed_lanes_frame
    }

    /// The frame on which the vehicle was created.
    pub fn frame_created(&self) -> usize {
        self.frame_created
    }

    /// The vehicles this one is queued behind.
    pub fn stuck_behind(&self) -> &[VehicleId] {
        &self.stuck_behind
    }

    /// The vehicle directly ahead that blocked this one on the last tick.
    pub fn blocker(&self) -> Option<VehicleId> {
        self.blocker
    }

    /// Whether the vehicle was blocked on the last tick.
    pub fn is_blocked(&self) -> bool {
        self.blocker.is_some()
    }

    /// The ID of the vehicle's shape.
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// The fill colour the vehicle should be drawn with.
    pub fn fill(&self) -> Fill {
        match (self.role, self.blocker) {
            (Role::Ego, _) => Fill::Ego,
            (Role::Other, Some(_)) => Fill::Blocked,
            (Role::Other, None) => Fill::Cruising,
        }
    }

    /// The vertical screen position for the vehicle's current lane.
    pub fn top(&self, lane_pitch: f64, lane_origin: f64) -> f64 {
        lane_pitch * self.lane + lane_origin
    }

    /// Whether `frame` is late enough for another lane change to start.
    pub(crate) fn cooled_down(&self, frame: usize, cooldown: usize) -> bool {
        frame > self.changed_lanes_frame + cooldown
    }

    pub(crate) fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Shifts both the current and the free-flow speed.
    pub(crate) fn shift_speeds(&mut self, delta: f64) {
        self.speed += delta;
        self.previous_speed += delta;
    }

    /// Returns to the free-flow speed.
    pub(crate) fn restore_speed(&mut self) {
        self.speed = self.previous_speed;
    }

    pub(crate) fn shift_x(&mut self, delta: f64) {
        self.x += delta;
    }

    pub(crate) fn set_blocker(&mut self, blocker: Option<VehicleId>) {
        self.blocker = blocker;
    }

    /// Records that this vehicle is queued behind `id`.
    pub(crate) fn add_stuck_behind(&mut self, id: VehicleId) {
        if id != self.id && !self.stuck_behind.contains(&id) {
            self.stuck_behind.push(id);
        }
    }

    pub(crate) fn clear_stuck_behind(&mut self) {
        self.stuck_behind.clear();
    }

    /// Moves the vehicle horizontally according to its speed.
    /// The ego vehicle never moves; its speed is absorbed by everyone else.
    pub(crate) fn integrate(&mut self, speed_scale: f64) {
        if self.role == Role::Other {
            self.x += (self.speed * speed_scale).round();
        }
    }

    #[cfg(test)]
    pub(crate) fn set_lane(&mut self, lane: f64) {
        self.lane = lane;
    }
}
