//! Error types for the `corrosion-world` crate.
//!
//! World-building and mutation operations return [`WorldError`]. When the
//! world answers the aging engine through the host traits, these are
//! converted into [`HostError`].

use corrosion_core::HostError;
use corrosion_types::{GridCell, StructureId, ZoneId};

/// Errors that can occur while building or mutating the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A zone with the same id already exists.
    #[error("duplicate zone id: {0}")]
    DuplicateZone(ZoneId),

    /// A grid with the same id already exists.
    #[error("duplicate grid id: {0}")]
    DuplicateGrid(StructureId),

    /// The grid does not exist.
    #[error("grid not found: {0}")]
    GridNotFound(StructureId),

    /// No block is anchored at the cell.
    #[error("no block anchored at {cell:?} in grid {grid}")]
    BlockNotFound {
        /// The grid.
        grid: StructureId,
        /// The addressed cell.
        cell: GridCell,
    },

    /// A new block would overlap an existing one.
    #[error("cell {cell:?} of grid {grid} is already occupied")]
    CellOccupied {
        /// The grid.
        grid: StructureId,
        /// The first overlapping cell.
        cell: GridCell,
    },

    /// The block's extent is inverted or does not contain its anchor.
    #[error("block anchored at {anchor:?} has an invalid extent")]
    InvalidExtent {
        /// The block's anchor cell.
        anchor: GridCell,
    },
}

impl From<WorldError> for HostError {
    fn from(error: WorldError) -> Self {
        match error {
            WorldError::GridNotFound(id) => Self::StructureNotFound(id),
            WorldError::BlockNotFound { grid, cell } => Self::BlockNotFound {
                structure: grid,
                cell,
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}
