//! Facts reported by the host world.
//!
//! These are plain snapshots: the host fills them in when asked and the
//! aging engine never writes back through them. Anything that changes the
//! world goes through the deferred effect queue instead.

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingSphere, GridCell, WorldPoint};
use crate::ids::{StructureId, ZoneId};
use crate::stage::StageId;

/// How the current process participates in the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionRole {
    /// Single-player session; this process owns the world.
    Offline,
    /// Multiplayer host or dedicated server.
    Server,
    /// Multiplayer client; world state is owned elsewhere.
    Client,
}

impl SessionRole {
    /// Whether this process is allowed to age the world.
    pub const fn is_authoritative(self) -> bool {
        matches!(self, Self::Offline | Self::Server)
    }
}

/// A zone-like world object (a planet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Host handle of the zone.
    pub id: ZoneId,
    /// Identifying name matched against zone configuration.
    pub name: String,
    /// Centre of the zone in world space.
    pub center: WorldPoint,
    /// Mean surface radius in metres.
    pub average_radius: f64,
    /// Height of the atmosphere above the mean surface, in metres.
    pub atmosphere_altitude: f64,
}

impl ZoneInfo {
    /// The region over which this zone ages structures: the body plus its
    /// atmosphere.
    pub fn influence_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.average_radius + self.atmosphere_altitude)
    }
}

/// A top-level structure (grid) as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureInfo {
    /// Host handle of the structure.
    pub id: StructureId,
    /// Display name, used in log lines only.
    pub name: String,
    /// Closed or marked for removal.
    pub closed: bool,
    /// Has a physics body. Projections and other ghost grids do not.
    pub physical: bool,
    /// Currently powered.
    pub powered: bool,
    /// Flagged immune to damage by the host.
    pub immune: bool,
    /// A respawn/starter structure, spared by the mercy rule.
    pub respawn: bool,
    /// Total number of blocks in the structure.
    pub block_count: usize,
    /// World-space bounding sphere of the structure.
    pub world_volume: BoundingSphere,
}

/// A block inside a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Anchor cell; together with the structure id this addresses the block.
    pub position: GridCell,
    /// Lowest cell covered by the block.
    pub min: GridCell,
    /// Highest cell covered by the block.
    pub max: GridCell,
    /// Skin currently applied to the block (its aging stage).
    pub skin: StageId,
    /// Block definition subtype name (e.g. `LargeBlockArmorBlock`).
    pub subtype: String,
}

impl BlockInfo {
    /// A block occupying exactly one cell.
    pub fn single_cell(position: GridCell, skin: StageId, subtype: impl Into<String>) -> Self {
        Self {
            position,
            min: position,
            max: position,
            skin,
            subtype: subtype.into(),
        }
    }
}

/// Structural integrity of a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockIntegrity {
    /// Current integrity (mount level).
    pub current: f32,
    /// Integrity of an undamaged block.
    pub max: f32,
}

impl BlockIntegrity {
    /// Nothing left holding the block to its structure.
    pub fn is_fully_dismounted(&self) -> bool {
        self.current <= 0.0
    }
}
