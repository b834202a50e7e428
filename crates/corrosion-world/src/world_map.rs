//! The world: planets, grids, safe zones, and the session role.
//!
//! [`WorldMap`] owns all world state and implements the mutating host
//! primitives ([`WorldMutator`]). Read access for the aging engine goes
//! through [`SharedWorld`], a cloneable handle that implements
//! [`WorldQuery`] by taking a read lock for each query.

use std::collections::BTreeMap;
use std::sync::Arc;

use corrosion_core::{HostError, WorldMutator, WorldQuery};
use corrosion_types::{
    BlockInfo, BlockIntegrity, BoundingSphere, GridCell, SessionRole, StageId, StructureId,
    StructureInfo, WorldPoint, ZoneId, ZoneInfo,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::WorldError;
use crate::grid::{Grid, GridBlock};

/// All world state.
#[derive(Debug, Clone, Default)]
pub struct WorldMap {
    session: Option<SessionRole>,
    zones: BTreeMap<ZoneId, ZoneInfo>,
    grids: BTreeMap<StructureId, Grid>,
    safe_zones: Vec<BoundingSphere>,
}

impl WorldMap {
    /// An empty world with no session loaded.
    pub const fn new() -> Self {
        Self {
            session: None,
            zones: BTreeMap::new(),
            grids: BTreeMap::new(),
            safe_zones: Vec::new(),
        }
    }

    // -------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------

    /// Set how this process participates in the session.
    pub const fn set_session(&mut self, role: Option<SessionRole>) {
        self.session = role;
    }

    /// The current session role.
    pub const fn session(&self) -> Option<SessionRole> {
        self.session
    }

    // -------------------------------------------------------------------
    // Zones
    // -------------------------------------------------------------------

    /// Add a planet.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateZone`] if the id is taken.
    pub fn add_zone(&mut self, zone: ZoneInfo) -> Result<ZoneId, WorldError> {
        let id = zone.id;
        if self.zones.contains_key(&id) {
            return Err(WorldError::DuplicateZone(id));
        }
        self.zones.insert(id, zone);
        Ok(id)
    }

    /// The planet with `id`.
    pub fn zone(&self, id: ZoneId) -> Option<&ZoneInfo> {
        self.zones.get(&id)
    }

    /// Number of planets.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    // -------------------------------------------------------------------
    // Grids
    // -------------------------------------------------------------------

    /// Add a grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateGrid`] if the id is taken.
    pub fn add_grid(&mut self, grid: Grid) -> Result<StructureId, WorldError> {
        let id = grid.id();
        if self.grids.contains_key(&id) {
            return Err(WorldError::DuplicateGrid(id));
        }
        self.grids.insert(id, grid);
        Ok(id)
    }

    /// The grid with `id`.
    pub fn grid(&self, id: StructureId) -> Option<&Grid> {
        self.grids.get(&id)
    }

    /// Mutable access to the grid with `id`.
    pub fn grid_mut(&mut self, id: StructureId) -> Option<&mut Grid> {
        self.grids.get_mut(&id)
    }

    /// Remove a grid from the world.
    pub fn remove_grid(&mut self, id: StructureId) -> Option<Grid> {
        self.grids.remove(&id)
    }

    /// Number of grids.
    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Iterate over all grids.
    pub fn grids(&self) -> impl Iterator<Item = &Grid> {
        self.grids.values()
    }

    /// The block anchored at `cell` of grid `id`.
    pub fn block(&self, id: StructureId, cell: GridCell) -> Option<&GridBlock> {
        self.grids.get(&id).and_then(|g| g.block(cell))
    }

    fn existing_grid(&self, id: StructureId) -> Result<&Grid, WorldError> {
        self.grids.get(&id).ok_or(WorldError::GridNotFound(id))
    }

    fn existing_block_mut(&mut self, id: StructureId, cell: GridCell) -> Result<&mut GridBlock, WorldError> {
        self.grids
            .get_mut(&id)
            .ok_or(WorldError::GridNotFound(id))?
            .block_mut(cell)
            .ok_or(WorldError::BlockNotFound { grid: id, cell })
    }

    /// Grids whose volume intersects `sphere`.
    pub fn grids_in_sphere(&self, sphere: &BoundingSphere) -> Vec<StructureId> {
        self.grids
            .values()
            .filter(|g| g.info().world_volume.intersects(sphere))
            .map(Grid::id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Safe zones
    // -------------------------------------------------------------------

    /// Add a region where damage is disallowed.
    pub fn add_safe_zone(&mut self, region: BoundingSphere) {
        self.safe_zones.push(region);
    }

    /// Whether grid `id` sits with its centre inside a safe zone.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GridNotFound`] if the grid does not exist.
    pub fn is_in_safe_zone(&self, id: StructureId) -> Result<bool, WorldError> {
        let center = self.existing_grid(id)?.info().world_volume.center;
        Ok(self.safe_zones.iter().any(|zone| zone.contains(&center)))
    }
}

impl WorldMutator for WorldMap {
    fn block_integrity(&self, id: StructureId, cell: GridCell) -> Result<Option<BlockIntegrity>, HostError> {
        Ok(self.block(id, cell).map(|b| b.integrity))
    }

    fn apply_skin(&mut self, id: StructureId, cell: GridCell, stage: &StageId) -> Result<(), HostError> {
        self.existing_block_mut(id, cell)?.info.skin = stage.clone();
        Ok(())
    }

    fn decrease_integrity(&mut self, id: StructureId, cell: GridCell, amount: f32) -> Result<(), HostError> {
        let block = self.existing_block_mut(id, cell)?;
        block.integrity.current = (block.integrity.current - amount).max(0.0);
        Ok(())
    }

    fn remove_block(&mut self, id: StructureId, cell: GridCell) -> Result<(), HostError> {
        self.grids
            .get_mut(&id)
            .ok_or(WorldError::GridNotFound(id))?
            .remove_block(cell)?;
        Ok(())
    }
}

/// A cloneable, thread-safe handle on a [`WorldMap`].
#[derive(Debug, Clone, Default)]
pub struct SharedWorld {
    inner: Arc<RwLock<WorldMap>>,
}

impl SharedWorld {
    /// Share `world`.
    pub fn new(world: WorldMap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Lock the world for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, WorldMap> {
        self.inner.read()
    }

    /// Lock the world for writing. Only the game thread should do this
    /// while the engine is running.
    pub fn write(&self) -> RwLockWriteGuard<'_, WorldMap> {
        self.inner.write()
    }

    fn with_grid<T>(&self, id: StructureId, f: impl FnOnce(&Grid) -> T) -> Result<T, HostError> {
        let world = self.read();
        Ok(f(world.existing_grid(id)?))
    }
}

impl WorldQuery for SharedWorld {
    fn session_role(&self) -> Option<SessionRole> {
        self.read().session()
    }

    fn zones(&self) -> Result<Vec<ZoneInfo>, HostError> {
        Ok(self.read().zones.values().cloned().collect())
    }

    fn structures_in_sphere(&self, sphere: &BoundingSphere) -> Result<Vec<StructureId>, HostError> {
        Ok(self.read().grids_in_sphere(sphere))
    }

    fn structure(&self, id: StructureId) -> Result<Option<StructureInfo>, HostError> {
        Ok(self.read().grid(id).map(|g| g.info().clone()))
    }

    fn blocks(&self, id: StructureId) -> Result<Vec<BlockInfo>, HostError> {
        self.with_grid(id, |g| g.blocks().map(|b| b.info.clone()).collect())
    }

    fn has_block_at(&self, id: StructureId, cell: GridCell) -> Result<bool, HostError> {
        self.with_grid(id, |g| g.has_block_at(cell))
    }

    fn is_cell_airtight(&self, id: StructureId, cell: GridCell) -> Result<bool, HostError> {
        self.with_grid(id, |g| g.is_cell_sealed(cell))
    }

    fn is_point_airtight(&self, id: StructureId, point: WorldPoint) -> Result<bool, HostError> {
        self.with_grid(id, |g| g.is_point_sealed(&point))
    }

    fn is_protected(&self, id: StructureId) -> Result<bool, HostError> {
        Ok(self.read().is_in_safe_zone(id)?)
    }
}
