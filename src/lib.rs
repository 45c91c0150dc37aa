pub use cgmath;
pub use config::SimConfig;
pub use diagnostics::{Anomaly, TrafficReport};
pub use shape::{Fill, Point2d, Shape, ShapePool};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::{Direction, LaneState, Role, Vehicle};

mod config;
mod coordinator;
mod diagnostics;
mod overtaking;
mod proximity;
mod registry;
mod shape;
mod simulation;
mod spawn;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
    /// Unique ID of a [Shape] in the rendering pool.
    pub struct ShapeId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
