//! World-space and grid-space geometry.
//!
//! Two coordinate systems meet in the aging engine:
//!
//! - **World space** ([`WorldPoint`], [`BoundingSphere`]) -- continuous
//!   coordinates in metres, used for zone influence regions and the
//!   spatial queries that discover structures near a zone.
//! - **Grid space** ([`GridCell`]) -- integer cell coordinates local to a
//!   single structure, used to address blocks and probe their neighbours.

use serde::{Deserialize, Serialize};

/// A point in world space, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl WorldPoint {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }
}

/// A sphere in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// Centre of the sphere.
    pub center: WorldPoint,
    /// Radius in metres. Never negative for spheres built with [`BoundingSphere::new`].
    pub radius: f64,
}

impl BoundingSphere {
    /// Create a sphere. Negative or non-finite radii collapse to zero.
    pub fn new(center: WorldPoint, radius: f64) -> Self {
        let radius = if radius.is_finite() && radius > 0.0 { radius } else { 0.0 };
        Self { center, radius }
    }

    /// Whether `point` lies inside or on the surface of the sphere.
    pub fn contains(&self, point: &WorldPoint) -> bool {
        self.center.distance_to(point) <= self.radius
    }

    /// Whether two spheres overlap or touch.
    pub fn intersects(&self, other: &Self) -> bool {
        self.center.distance_to(&other.center) <= self.radius + other.radius
    }
}

/// Integer cell coordinates inside a single structure's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridCell {
    /// X cell index.
    pub x: i32,
    /// Y cell index.
    pub y: i32,
    /// Z cell index.
    pub z: i32,
}

impl GridCell {
    /// Create a cell from its indices.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell displaced by `(dx, dy, dz)`, or `None` on overflow.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// Whether this cell lies inside the inclusive box `min..=max`.
    pub fn within(self, min: Self, max: Self) -> bool {
        (min.x..=max.x).contains(&self.x)
            && (min.y..=max.y).contains(&self.y)
            && (min.z..=max.z).contains(&self.z)
    }
}

/// The six cells touching the faces of the inclusive block extent
/// `min..=max`: one step past `max` along +X, +Y, +Z and one step before
/// `min` along -X, -Y, -Z.
///
/// Cells whose coordinates would overflow are omitted; they cannot hold a
/// neighbour.
pub fn face_neighbours(min: GridCell, max: GridCell) -> Vec<GridCell> {
    [
        max.offset(1, 0, 0),
        max.offset(0, 1, 0),
        max.offset(0, 0, 1),
        min.offset(-1, 0, 0),
        min.offset(0, -1, 0),
        min.offset(0, 0, -1),
    ]
    .into_iter()
    .flatten()
    .collect()
}
