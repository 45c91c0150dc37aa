use crate::registry::Registry;
use crate::util::Interval;
use crate::{SimConfig, VehicleId};
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two vehicles found overlapping in the same lane.
///
/// The lane changing and following rules should make this impossible,
/// so every anomaly points at a modelling defect.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anomaly {
    /// The frame on which the overlap was found.
    pub frame: usize,
    pub first: VehicleId,
    pub second: VehicleId,
    pub first_x: f64,
    pub second_x: f64,
    /// The frames on which the two vehicles were created.
    pub first_created: usize,
    pub second_created: usize,
}

/// A summary of the traffic on the road.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrafficReport {
    /// The frame the report was taken on.
    pub frame: usize,
    /// The number of vehicles other than ego.
    pub vehicles: usize,
    /// The number of those vehicles at least partly on screen.
    pub on_screen: usize,
    /// The lane and position of each vehicle other than ego.
    pub positions: Vec<(f64, f64)>,
}

/// Finds every pair of vehicles in the same lane closer than one vehicle length.
pub(crate) fn scan_anomalies(registry: &Registry, config: &SimConfig, frame: usize) -> Vec<Anomaly> {
    let vehicles = registry.iter().collect::<Vec<_>>();
    vehicles
        .into_iter()
        .tuple_combinations()
        .filter(|(a, b)| a.in_lane(b.lane()) && (a.x() - b.x()).abs() < config.vehicle_length)
        .map(|(a, b)| Anomaly {
            frame,
            first: a.id(),
            second: b.id(),
            first_x: a.x(),
            second_x: b.x(),
            first_created: a.frame_created(),
            second_created: b.frame_created(),
        })
        .inspect(|anomaly| {
            log::warn!(
                "Disaster at {}, {}! Now: {} Car 1: {} Car 2: {}",
                anomaly.first_x,
                anomaly.second_x,
                anomaly.frame,
                anomaly.first_created,
                anomaly.second_created
            )
        })
        .collect()
}

/// Summarises the traffic other than ego.
pub(crate) fn report(registry: &Registry, config: &SimConfig, frame: usize) -> TrafficReport {
    let screen = Interval::new(-config.vehicle_length, config.road_width);
    let positions = registry
        .others()
        .map(|veh| (veh.lane(), veh.x()))
        .collect::<Vec<_>>();
    TrafficReport {
        frame,
        vehicles: positions.len(),
        on_screen: positions.iter().filter(|(_, x)| screen.surrounds(*x)).count(),
        positions,
    }
}
