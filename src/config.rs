use anyhow::{ensure, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The fixed parameters of a simulation.
///
/// All values are read once at setup and never change mid-run.
/// Distances are in screen units, where one vehicle is 80 units long.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimConfig {
    /// The number of lanes. Lane 0 is the rightmost lane.
    pub lane_count: usize,
    /// The width of the visible stretch of road.
    pub road_width: f64,
    /// The following distance within which a vehicle ahead blocks another.
    pub near_test: f64,
    /// The length of a vehicle.
    pub vehicle_length: f64,
    /// The fraction of a lane covered per tick while changing lanes.
    pub lane_change_step: f64,
    /// The number of ticks after completing a lane change before another may start.
    pub lane_change_cooldown: usize,
    /// A new vehicle is spawned every this many ticks.
    pub spawn_period: usize,
    /// Traffic is reported and scanned for anomalies every this many ticks.
    pub report_period: usize,
    /// How far beyond either end of the road a vehicle may drift before being purged.
    pub purge_margin: f64,
    /// The maximum number of placements tried for a single spawn.
    pub spawn_attempts: usize,
    /// The size of one spawn speed bucket.
    pub speed_step: f64,
    /// Spawn speeds are drawn from `-speed_buckets..=speed_buckets` buckets.
    pub speed_buckets: i32,
    /// Horizontal distance covered per tick per unit of speed.
    pub speed_scale: f64,
    /// The ego vehicle's starting lane.
    pub ego_lane: usize,
    /// The ego vehicle's (fixed) horizontal position.
    pub ego_x: f64,
    /// The speed gained by the ego vehicle on every unblocked tick.
    pub ego_increment: f64,
    /// The size of one free-flow jitter step.
    pub jitter_step: f64,
    /// Free-flow jitter is drawn from `-jitter_steps..=jitter_steps` steps.
    pub jitter_steps: i32,
    /// The correction applied when a vehicle creeps too close to its blocker.
    pub nudge: f64,
    /// The vertical distance between adjacent lanes.
    pub lane_pitch: f64,
    /// The vertical position of lane 0.
    pub lane_origin: f64,
    /// The maximum number of shapes the host will allocate.
    pub max_shapes: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            road_width: 1200.0,
            near_test: 240.0,
            vehicle_length: 80.0,
            lane_change_step: 0.05,
            lane_change_cooldown: 40,
            spawn_period: 160,
            report_period: 160,
            purge_margin: 1000.0,
            spawn_attempts: 1000,
            speed_step: 0.05,
            speed_buckets: 6,
            speed_scale: 10.0,
            ego_lane: 0,
            ego_x: 450.0,
            ego_increment: 0.001,
            jitter_step: 0.001,
            jitter_steps: 5,
            nudge: 3.0,
            lane_pitch: 100.0,
            lane_origin: 80.0,
            max_shapes: 64,
        }
    }
}

impl SimConfig {
    /// Checks that the configuration describes a runnable simulation.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.lane_count > 0, "road must have at least one lane");
        ensure!(
            self.ego_lane < self.lane_count,
            "ego lane {} is outside the road's {} lanes",
            self.ego_lane,
            self.lane_count
        );
        ensure!(self.road_width > 0.0, "road width must be positive");
        ensure!(self.near_test > 0.0, "following distance must be positive");
        ensure!(
            self.lane_change_step > 0.0 && self.lane_change_step < 1.0,
            "lane change step must lie strictly between 0 and 1"
        );
        ensure!(self.spawn_period > 0, "spawn period must be at least one tick");
        ensure!(self.report_period > 0, "report period must be at least one tick");
        ensure!(self.spawn_attempts > 0, "spawner needs at least one attempt");
        ensure!(self.speed_buckets > 0, "spawner needs at least one nonzero speed bucket");
        ensure!(self.speed_step > 0.0, "speed step must be positive");
        ensure!(self.jitter_steps >= 0, "jitter range cannot be negative");
        ensure!(self.purge_margin >= 0.0, "purge margin cannot be negative");
        ensure!(self.max_shapes > 0, "shape pool must hold at least the ego vehicle");
        Ok(())
    }

    /// The index of the leftmost lane.
    pub fn last_lane(&self) -> usize {
        self.lane_count - 1
    }
}
