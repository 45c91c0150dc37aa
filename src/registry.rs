use crate::shape::{Fill, Point2d, Shape, ShapePool};
use crate::util::Interval;
use crate::vehicle::{Role, Vehicle};
use crate::{ShapeId, VehicleId, VehicleSet};
use anyhow::{anyhow, ensure, Result};

/// The active vehicles together with the pool of shapes they are drawn with.
///
/// The ego vehicle is stored alongside every other vehicle, so iterating the
/// set gives the combined "others plus ego" view without touching storage.
#[derive(Clone, Debug)]
pub(crate) struct Registry {
    vehicles: VehicleSet,
    ego: VehicleId,
    shapes: ShapePool,
    lane_pitch: f64,
    lane_origin: f64,
}

/// A vehicle waiting to be inserted into the registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Placement {
    pub lane: usize,
    pub x: f64,
    pub speed: f64,
}

impl Registry {
    /// Creates a registry containing only the ego vehicle.
    pub fn new(
        ego_lane: usize,
        ego_x: f64,
        max_shapes: usize,
        lane_pitch: f64,
        lane_origin: f64,
    ) -> Result<Self> {
        let mut registry = Self {
            vehicles: VehicleSet::with_key(),
            ego: VehicleId::default(),
            shapes: ShapePool::new(max_shapes),
            lane_pitch,
            lane_origin,
        };
        let placement = Placement {
            lane: ego_lane,
            x: ego_x,
            speed: 0.0,
        };
        registry.ego = registry.insert_with_role(Role::Ego, placement, 0)?;
        Ok(registry)
    }

    /// Adds another (non-ego) vehicle, drawing its shape from the pool.
    pub fn insert(&mut self, placement: Placement, frame: usize) -> Result<VehicleId> {
        self.insert_with_role(Role::Other, placement, frame)
    }

    fn insert_with_role(&mut self, role: Role, placement: Placement, frame: usize) -> Result<VehicleId> {
        if role == Role::Ego {
            ensure!(
                self.vehicles.values().all(|veh| !veh.is_ego()),
                "the simulation already has an ego vehicle"
            );
        }
        let shape = Shape::new(
            Point2d::new(
                placement.x,
                self.lane_pitch * placement.lane as f64 + self.lane_origin,
            ),
            match role {
                Role::Ego => Fill::Ego,
                Role::Other => Fill::Cruising,
            },
        );
        let shape = self
            .shapes
            .acquire(shape)
            .ok_or_else(|| anyhow!("no shapes left to draw a new vehicle with"))?;
        Ok(self.vehicles.insert_with_key(|id| {
            Vehicle::new(id, role, placement.lane, placement.x, placement.speed, frame, shape)
        }))
    }

    /// Whether a new vehicle could be given a shape.
    pub fn has_shape_available(&self) -> bool {
        self.shapes.has_room()
    }

    pub fn ego_id(&self) -> VehicleId {
        self.ego
    }

    pub fn ego(&self) -> &Vehicle {
        &self.vehicles[self.ego]
    }

    pub fn vehicles(&self) -> &VehicleSet {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> &mut VehicleSet {
        &mut self.vehicles
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }

    /// Returns an iterator over every active vehicle, ego included.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Returns an iterator over every active vehicle except ego.
    pub fn others(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values().filter(|veh| !veh.is_ego())
    }

    /// A snapshot of the IDs of every non-ego vehicle.
    pub fn other_ids(&self) -> Vec<VehicleId> {
        self.others().map(|veh| veh.id()).collect()
    }

    /// A snapshot of every vehicle ID, ego included, from the front of the road to the back.
    pub fn ids_front_to_back(&self) -> Vec<VehicleId> {
        let mut ids = self
            .vehicles
            .values()
            .map(|veh| (veh.x(), veh.id()))
            .collect::<Vec<_>>();
        ids.sort_by(|a, b| a.0.total_cmp(&b.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether any vehicle covers `lane` within `distance` of `x`.
    pub fn is_occupied(&self, lane: usize, x: f64, distance: f64) -> bool {
        self.vehicles
            .values()
            .any(|veh| veh.overlaps_lane(lane as f64) && (veh.x() - x).abs() < distance)
    }

    /// Removes every non-ego vehicle outside `window`, returning their shapes to the pool.
    /// Returns the number of vehicles removed.
    pub fn purge(&mut self, window: Interval) -> usize {
        let mut released = vec![];
        self.vehicles.retain(|_, veh| {
            let keep = veh.is_ego() || window.contains(veh.x());
            if !keep {
                released.push(veh.shape());
            }
            keep
        });
        for shape in &released {
            self.shapes.release(*shape);
        }
        released.len()
    }

    /// Writes every active vehicle's position and colour to its shape.
    pub fn sync_shapes(&mut self) {
        for veh in self.vehicles.values() {
            if let Some(shape) = self.shapes.get_mut(veh.shape()) {
                shape.position = Point2d::new(veh.x(), veh.top(self.lane_pitch, self.lane_origin));
                shape.fill = veh.fill();
                shape.visible = true;
            }
        }
    }

    pub fn shapes(&self) -> &ShapePool {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }
}
