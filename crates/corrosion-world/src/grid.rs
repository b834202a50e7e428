//! A grid: one top-level structure built from blocks on an integer lattice.
//!
//! Blocks are stored by anchor cell. A separate occupancy index maps every
//! covered cell back to its block's anchor, so multi-cell blocks answer
//! neighbour probes on any of their cells.
//!
//! Pressurised rooms come in two flavours: sealed grid cells (used for the
//! per-face exposure test) and sealed world-space volumes (used to detect a
//! grid parked inside another grid's hangar).

use std::collections::{BTreeMap, BTreeSet};

use corrosion_types::{
    BlockInfo, BlockIntegrity, BoundingSphere, GridCell, StageId, StructureId, StructureInfo,
    WorldPoint,
};

use crate::error::WorldError;

/// A block and its current integrity.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBlock {
    /// Shape, skin and subtype.
    pub info: BlockInfo,
    /// Structural integrity.
    pub integrity: BlockIntegrity,
}

/// A top-level structure.
#[derive(Debug, Clone)]
pub struct Grid {
    info: StructureInfo,
    blocks: BTreeMap<GridCell, GridBlock>,
    occupancy: BTreeMap<GridCell, GridCell>,
    sealed_cells: BTreeSet<GridCell>,
    sealed_rooms: Vec<BoundingSphere>,
}

impl Grid {
    /// An empty, unpowered, physical grid occupying `volume`.
    pub fn new(name: impl Into<String>, volume: BoundingSphere) -> Self {
        Self {
            info: StructureInfo {
                id: StructureId::new(),
                name: name.into(),
                closed: false,
                physical: true,
                powered: false,
                immune: false,
                respawn: false,
                block_count: 0,
                world_volume: volume,
            },
            blocks: BTreeMap::new(),
            occupancy: BTreeMap::new(),
            sealed_cells: BTreeSet::new(),
            sealed_rooms: Vec::new(),
        }
    }

    /// The grid's id.
    pub const fn id(&self) -> StructureId {
        self.info.id
    }

    /// Current facts about the grid.
    pub const fn info(&self) -> &StructureInfo {
        &self.info
    }

    /// Set whether the grid is powered.
    pub const fn set_powered(&mut self, powered: bool) {
        self.info.powered = powered;
    }

    /// Set whether the grid is immune to damage.
    pub const fn set_immune(&mut self, immune: bool) {
        self.info.immune = immune;
    }

    /// Mark the grid as a respawn/starter grid.
    pub const fn set_respawn(&mut self, respawn: bool) {
        self.info.respawn = respawn;
    }

    /// Set whether the grid has a physics body.
    pub const fn set_physical(&mut self, physical: bool) {
        self.info.physical = physical;
    }

    /// Mark the grid closed. Closed grids stay queryable until removed.
    pub const fn close(&mut self) {
        self.info.closed = true;
    }

    /// Add a block with full integrity `max_integrity`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidExtent`] if the block's extent is
    /// inverted or misses its anchor, or [`WorldError::CellOccupied`] if it
    /// overlaps an existing block.
    pub fn add_block(&mut self, info: BlockInfo, max_integrity: f32) -> Result<(), WorldError> {
        let anchor = info.position;
        if !anchor.within(info.min, info.max) {
            return Err(WorldError::InvalidExtent { anchor });
        }
        let cells = extent_cells(info.min, info.max);
        if let Some(cell) = cells.iter().find(|c| self.occupancy.contains_key(c)) {
            return Err(WorldError::CellOccupied {
                grid: self.info.id,
                cell: *cell,
            });
        }

        for cell in cells {
            self.occupancy.insert(cell, anchor);
        }
        self.blocks.insert(
            anchor,
            GridBlock {
                info,
                integrity: BlockIntegrity {
                    current: max_integrity,
                    max: max_integrity,
                },
            },
        );
        self.info.block_count = self.blocks.len();
        Ok(())
    }

    /// Add a one-cell armor block of `subtype` painted with `skin`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellOccupied`] if the cell is taken.
    pub fn add_armor(&mut self, cell: GridCell, skin: &str, subtype: &str) -> Result<(), WorldError> {
        self.add_block(BlockInfo::single_cell(cell, StageId::from(skin), subtype), 1.0)
    }

    /// Remove the block anchored at `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::BlockNotFound`] if no block is anchored there.
    pub fn remove_block(&mut self, anchor: GridCell) -> Result<GridBlock, WorldError> {
        let block = self.blocks.remove(&anchor).ok_or(WorldError::BlockNotFound {
            grid: self.info.id,
            cell: anchor,
        })?;
        for cell in extent_cells(block.info.min, block.info.max) {
            self.occupancy.remove(&cell);
        }
        self.info.block_count = self.blocks.len();
        Ok(block)
    }

    /// The block anchored at `anchor`.
    pub fn block(&self, anchor: GridCell) -> Option<&GridBlock> {
        self.blocks.get(&anchor)
    }

    /// Mutable access to the block anchored at `anchor`.
    pub fn block_mut(&mut self, anchor: GridCell) -> Option<&mut GridBlock> {
        self.blocks.get_mut(&anchor)
    }

    /// All blocks, by anchor.
    pub fn blocks(&self) -> impl Iterator<Item = &GridBlock> {
        self.blocks.values()
    }

    /// Whether any block covers `cell`.
    pub fn has_block_at(&self, cell: GridCell) -> bool {
        self.occupancy.contains_key(&cell)
    }

    /// Mark cells as the inside of a sealed, pressurised room.
    pub fn seal_cells(&mut self, cells: impl IntoIterator<Item = GridCell>) {
        self.sealed_cells.extend(cells);
    }

    /// Whether `cell` is inside a sealed room.
    pub fn is_cell_sealed(&self, cell: GridCell) -> bool {
        self.sealed_cells.contains(&cell)
    }

    /// Register a sealed room as a world-space volume (a hangar bay).
    pub fn seal_room(&mut self, room: BoundingSphere) {
        self.sealed_rooms.push(room);
    }

    /// Whether the world-space `point` is inside one of this grid's sealed
    /// rooms.
    pub fn is_point_sealed(&self, point: &WorldPoint) -> bool {
        self.sealed_rooms.iter().any(|room| room.contains(point))
    }
}

/// Every cell of the inclusive box `min..=max`.
pub fn extent_cells(min: GridCell, max: GridCell) -> Vec<GridCell> {
    let mut cells = Vec::new();
    for x in min.x..=max.x {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                cells.push(GridCell::new(x, y, z));
            }
        }
    }
    cells
}
