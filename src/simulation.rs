use crate::coordinator::coordinate;
use crate::diagnostics::{self, Anomaly, TrafficReport};
use crate::overtaking::plan_lane_change;
use crate::proximity;
use crate::registry::{Placement, Registry};
use crate::shape::{Shape, ShapePool};
use crate::spawn;
use crate::util::Interval;
use crate::vehicle::Vehicle;
use crate::{ShapeId, SimConfig, VehicleId};
use anyhow::{ensure, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Log the frame number every this many frames.
const PROGRESS_FRAMES: usize = 800;

/// A highway traffic simulation, drawn in the frame of reference of the ego vehicle.
///
/// All randomness is drawn from `rng`, so two simulations built with the same
/// configuration and identically seeded generators evolve identically.
pub struct Simulation<R = ChaCha8Rng> {
    /// The fixed parameters of the simulation.
    config: SimConfig,
    /// The vehicles on the road and the shapes they are drawn with.
    registry: Registry,
    /// The source of randomness.
    rng: R,
    /// The current frame of simulation.
    frame: usize,
    /// Whether the initial traffic has been scattered.
    populated: bool,
    /// The overlapping vehicles found by the latest scan.
    anomalies: Vec<Anomaly>,
    /// The latest traffic report.
    report: TrafficReport,
    /// The latest traffic report, as JSON.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation<ChaCha8Rng> {
    /// Creates a new simulation with a reproducible random number generator.
    pub fn seeded(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Creates a new simulation with an empty road apart from the ego vehicle.
    pub fn new(config: SimConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let registry = Registry::new(
            config.ego_lane,
            config.ego_x,
            config.max_shapes,
            config.lane_pitch,
            config.lane_origin,
        )?;
        let mut sim = Self {
            config,
            registry,
            rng,
            frame: 0,
            populated: false,
            anomalies: vec![],
            report: Default::default(),
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        };
        sim.registry.sync_shapes();
        Ok(sim)
    }

    /// Scatters the initial traffic along the road.
    /// Only the first call before the simulation starts has any effect.
    /// Returns the number of vehicles added.
    pub fn populate(&mut self) -> usize {
        if self.frame != 0 || self.populated {
            return 0;
        }
        self.populated = true;
        let attempts = self.rng.gen_range(2..5 * self.config.lane_count);
        let added = (0..attempts).filter(|_| self.spawn().is_some()).count();
        log::debug!("Populated the road with {} of {} vehicles", added, attempts);
        added
    }

    /// Adds a vehicle at the given position while setting up the road, without checking for room.
    /// Fails once the simulation has started.
    pub fn add_vehicle(&mut self, lane: usize, x: f64, speed: f64) -> Result<VehicleId> {
        ensure!(
            self.frame == 0,
            "vehicles can only be placed by hand before the first frame"
        );
        ensure!(
            lane < self.config.lane_count,
            "lane {} is outside the road's {} lanes",
            lane,
            self.config.lane_count
        );
        let id = self.registry.insert(Placement { lane, x, speed }, self.frame)?;
        self.registry.sync_shapes();
        Ok(id)
    }

    /// Tries to add a new vehicle in a free spot.
    /// Returns `None` if no spot or no shape could be found, which is not an error.
    pub fn spawn(&mut self) -> Option<VehicleId> {
        if !self.registry.has_shape_available() {
            log::debug!("No shapes left, skipping spawn");
            return None;
        }
        let Some(placement) = spawn::place(&self.registry, &self.config, self.frame, &mut self.rng) else {
            log::debug!("Could not fit a car, too many collisions");
            return None;
        };
        match self.registry.insert(placement, self.frame) {
            Ok(id) => Some(id),
            Err(err) => {
                log::debug!("Could not add a car: {}", err);
                None
            }
        }
    }

    /// Advances the simulation by one frame.
    pub fn step(&mut self) {
        self.frame += 1;
        self.integrate();
        self.observe();
        coordinate(&mut self.registry, &self.config, &mut self.rng);
        self.purge();
        if self.frame % self.config.spawn_period == 0 {
            self.spawn();
        }
        if self.frame % self.config.report_period == 0 {
            self.diagnose();
        }
        if self.frame % PROGRESS_FRAMES == 0 {
            log::info!("Frame {}", self.frame);
        }
        self.registry.sync_shapes();
    }

    /// Moves every vehicle along the road and across any lane change in progress.
    fn integrate(&mut self) {
        for veh in self.registry.vehicles_mut().values_mut() {
            veh.integrate(self.config.speed_scale);
            if veh.advance_lane_change(self.config.lane_change_step, self.frame) {
                log::trace!("{:?} done changing lanes, now in lane {}", veh.id(), veh.lane());
            }
        }
    }

    /// Works out which vehicles are blocked, front to back, and starts any lane changes.
    fn observe(&mut self) {
        let ids = self.registry.ids_front_to_back();
        let vehicles = self.registry.vehicles_mut();
        for id in ids {
            let blocker = proximity::detect(vehicles, id, self.config.near_test);
            vehicles[id].set_blocker(blocker);
            plan_lane_change(vehicles, id, blocker.is_some(), self.frame, &self.config);
        }
    }

    /// Drops the vehicles which have drifted far enough off screen not to come back.
    fn purge(&mut self) {
        let window = Interval::padded(0.0, self.config.road_width, self.config.purge_margin);
        let purged = self.registry.purge(window);
        if purged > 0 {
            log::trace!("Purged {} vehicles", purged);
        }
    }

    /// Scans for overlapping vehicles and reports on the traffic.
    fn diagnose(&mut self) {
        self.anomalies = diagnostics::scan_anomalies(&self.registry, &self.config, self.frame);
        self.report = diagnostics::report(&self.registry, &self.config, self.frame);
        log::debug!(
            "Frame {}: {} vehicles, {} on screen",
            self.frame,
            self.report.vehicles,
            self.report.on_screen
        );

        #[cfg(feature = "debug")]
        {
            self.debug = serde_json::to_value(&self.report).unwrap_or(serde_json::Value::Null);
        }
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets the simulation's configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Gets the ID of the ego vehicle.
    pub fn ego_id(&self) -> VehicleId {
        self.registry.ego_id()
    }

    /// Gets a reference to the ego vehicle.
    pub fn ego(&self) -> &Vehicle {
        self.registry.ego()
    }

    /// Gets a reference to the vehicle with the given ID, if it is still on the road.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> Option<&Vehicle> {
        self.registry.get(vehicle_id)
    }

    /// Returns an iterator over all the vehicles in the simulation, ego included.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.registry.iter()
    }

    /// Gets the pool of shapes the vehicles are drawn with.
    pub fn shapes(&self) -> &ShapePool {
        self.registry.shapes()
    }

    /// Returns an iterator over the shapes of the vehicles on the road.
    pub fn iter_shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.registry.shapes().iter().filter(|(_, shape)| shape.visible)
    }

    /// Gets a shape by ID.
    pub fn shape(&self, shape_id: ShapeId) -> Option<&Shape> {
        self.registry.shape(shape_id)
    }

    /// The number of released shapes awaiting reuse.
    pub fn recycled_shapes(&self) -> usize {
        self.registry.shapes().recycled()
    }

    /// The overlapping vehicles found by the latest scan.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// The latest traffic report.
    pub fn report(&self) -> &TrafficReport {
        &self.report
    }

    /// The latest traffic report, as JSON.
    #[cfg(feature = "debug")]
    pub fn debug_frame(&self) -> &serde_json::Value {
        &self.debug
    }
}
