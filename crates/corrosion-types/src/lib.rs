//! Shared type definitions for the Corrosion aging engine.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for zones and structures
//! - [`geometry`] -- World-space points and spheres, grid-space cells
//! - [`stage`] -- Aging stage identities and non-empty stage sequences
//! - [`structs`] -- Snapshots of host facts (zones, structures, blocks)

pub mod geometry;
pub mod ids;
pub mod stage;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use geometry::{BoundingSphere, GridCell, WorldPoint, face_neighbours};
pub use ids::{StructureId, ZoneId};
pub use stage::{StageId, StageSequence, StageStep};
pub use structs::{BlockInfo, BlockIntegrity, SessionRole, StructureInfo, ZoneInfo};
