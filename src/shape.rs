use crate::ShapeId;
use cgmath::Point2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// A 2D point
pub type Point2d = Point2<f64>;

/// The fill colour of a vehicle's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Fill {
    /// The ego vehicle.
    Ego,
    /// Another vehicle in free flow.
    Cruising,
    /// Another vehicle held back by the vehicle ahead.
    Blocked,
}

/// The render state of one vehicle, as handed to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    /// The top-left corner of the shape.
    pub position: Point2d,
    /// The fill colour.
    pub fill: Fill,
    /// Whether the shape belongs to an active vehicle.
    pub visible: bool,
}

impl Shape {
    pub fn new(position: Point2d, fill: Fill) -> Self {
        Self {
            position,
            fill,
            visible: true,
        }
    }
}

/// A capped arena of shapes.
///
/// The host can only allocate a limited number of shapes, so shapes released
/// by purged vehicles are kept on a free list and handed out again before any
/// new shape is allocated.
#[derive(Clone, Debug)]
pub struct ShapePool {
    shapes: SlotMap<ShapeId, Shape>,
    free: Vec<ShapeId>,
    capacity: usize,
}

impl ShapePool {
    /// Creates an empty pool which will allocate at most `capacity` shapes.
    pub fn new(capacity: usize) -> Self {
        Self {
            shapes: SlotMap::with_capacity_and_key(capacity),
            free: vec![],
            capacity,
        }
    }

    /// Hands out a shape initialised to `shape`, recycling a released one if possible.
    /// Returns `None` if the pool is exhausted.
    pub fn acquire(&mut self, shape: Shape) -> Option<ShapeId> {
        if let Some(id) = self.free.pop() {
            // Overwrite every field so nothing of the previous owner survives.
            self.shapes[id] = shape;
            return Some(id);
        }
        if self.shapes.len() >= self.capacity {
            return None;
        }
        Some(self.shapes.insert(shape))
    }

    /// Returns a shape to the free list and hides it.
    pub fn release(&mut self, id: ShapeId) {
        if let Some(shape) = self.shapes.get_mut(id) {
            shape.visible = false;
            if !self.free.contains(&id) {
                self.free.push(id);
            }
        }
    }

    /// Gets a shape by ID.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    /// Returns an iterator over every allocated shape, visible or not.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes.iter()
    }

    /// The number of shapes allocated so far.
    pub fn allocated(&self) -> usize {
        self.shapes.len()
    }

    /// The number of released shapes awaiting reuse.
    pub fn recycled(&self) -> usize {
        self.free.len()
    }

    /// Whether a shape can be handed out without exceeding the capacity.
    pub fn has_room(&self) -> bool {
        !self.free.is_empty() || self.shapes.len() < self.capacity
    }

    /// Whether a shape is waiting on the free list.
    pub fn is_free(&self, id: ShapeId) -> bool {
        self.free.contains(&id)
    }
}
