//! In-crate fakes for the host traits, shared by the unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use corrosion_types::{
    BlockInfo, BlockIntegrity, BoundingSphere, GridCell, SessionRole, StageId, StructureId,
    StructureInfo, WorldPoint, ZoneId, ZoneInfo,
};
use parking_lot::{Mutex, RwLock};

use crate::host::{GameThread, GameThreadJob, HostError, WorldMutator, WorldQuery};

pub(crate) const PLANET_RADIUS: f64 = 60_000.0;

pub(crate) fn zone_info(name: &str) -> ZoneInfo {
    ZoneInfo {
        id: ZoneId::new(),
        name: name.to_owned(),
        center: WorldPoint::ORIGIN,
        average_radius: PLANET_RADIUS,
        atmosphere_altitude: 8_000.0,
    }
}

/// An eligible structure sitting on the surface of a [`zone_info`] planet.
pub(crate) fn structure_info(name: &str) -> StructureInfo {
    StructureInfo {
        id: StructureId::new(),
        name: name.to_owned(),
        closed: false,
        physical: true,
        powered: false,
        immune: false,
        respawn: false,
        block_count: 0,
        world_volume: BoundingSphere::new(WorldPoint::new(0.0, PLANET_RADIUS, 0.0), 10.0),
    }
}

pub(crate) fn armor(cell: GridCell, skin: &str) -> BlockInfo {
    BlockInfo::single_cell(cell, StageId::from(skin), "LargeBlockArmorBlock")
}

#[derive(Debug, Clone)]
pub(crate) struct FakeBlock {
    pub info: BlockInfo,
    pub integrity: BlockIntegrity,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeStructure {
    pub info: StructureInfo,
    pub blocks: BTreeMap<GridCell, FakeBlock>,
    pub airtight_cells: BTreeSet<GridCell>,
    pub encloses_points: bool,
    pub protected: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    role: Option<SessionRole>,
    zones: Vec<ZoneInfo>,
    structures: BTreeMap<StructureId, FakeStructure>,
    ghosts: Vec<StructureId>,
    fail_zones: bool,
    fail_spatial: bool,
}

/// A small mutable world behind a lock, so tests can change it while the
/// code under test holds a shared reference.
#[derive(Debug)]
pub(crate) struct FakeWorld {
    state: RwLock<FakeState>,
}

impl FakeWorld {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(FakeState {
                role: Some(SessionRole::Offline),
                ..FakeState::default()
            }),
        }
    }

    pub(crate) fn with_zones(zones: Vec<ZoneInfo>) -> Self {
        let world = Self::new();
        world.set_zones(zones);
        world
    }

    pub(crate) fn set_zones(&self, zones: Vec<ZoneInfo>) {
        self.state.write().zones = zones;
    }

    pub(crate) fn set_role(&self, role: Option<SessionRole>) {
        self.state.write().role = role;
    }

    pub(crate) fn fail_zone_queries(&self, fail: bool) {
        self.state.write().fail_zones = fail;
    }

    pub(crate) fn fail_spatial_queries(&self, fail: bool) {
        self.state.write().fail_spatial = fail;
    }

    pub(crate) fn add_structure(&self, info: StructureInfo) -> StructureId {
        let id = info.id;
        self.state.write().structures.insert(
            id,
            FakeStructure {
                info,
                blocks: BTreeMap::new(),
                airtight_cells: BTreeSet::new(),
                encloses_points: false,
                protected: false,
            },
        );
        id
    }

    /// Report `id` from spatial queries although it no longer exists.
    pub(crate) fn add_ghost(&self, id: StructureId) {
        self.state.write().ghosts.push(id);
    }

    pub(crate) fn remove_structure(&self, id: StructureId) {
        self.state.write().structures.remove(&id);
    }

    pub(crate) fn add_block(&self, id: StructureId, info: BlockInfo) {
        let mut state = self.state.write();
        if let Some(structure) = state.structures.get_mut(&id) {
            structure.blocks.insert(
                info.position,
                FakeBlock {
                    info,
                    integrity: BlockIntegrity { current: 1.0, max: 1.0 },
                },
            );
            structure.info.block_count = structure.blocks.len();
        }
    }

    /// Fill an `n`-wide cube of single-cell armor blocks starting at the origin cell.
    pub(crate) fn add_cube(&self, id: StructureId, n: i32, skin: &str) {
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    self.add_block(id, armor(GridCell::new(x, y, z), skin));
                }
            }
        }
    }

    pub(crate) fn update_structure(&self, id: StructureId, update: impl FnOnce(&mut FakeStructure)) {
        if let Some(structure) = self.state.write().structures.get_mut(&id) {
            update(structure);
        }
    }

    pub(crate) fn set_integrity(&self, id: StructureId, cell: GridCell, current: f32) {
        self.update_structure(id, |s| {
            if let Some(block) = s.blocks.get_mut(&cell) {
                block.integrity.current = current;
            }
        });
    }

    pub(crate) fn block(&self, id: StructureId, cell: GridCell) -> Option<FakeBlock> {
        self.state
            .read()
            .structures
            .get(&id)
            .and_then(|s| s.blocks.get(&cell).cloned())
    }

    pub(crate) fn info(&self, id: StructureId) -> Option<StructureInfo> {
        self.state.read().structures.get(&id).map(|s| s.info.clone())
    }

    /// Mutable view for running game-thread jobs against this world.
    pub(crate) const fn mutator(&self) -> FakeMutator<'_> {
        FakeMutator(self)
    }

    fn with_structure<T>(
        &self,
        id: StructureId,
        f: impl FnOnce(&FakeStructure) -> T,
    ) -> Result<T, HostError> {
        self.state
            .read()
            .structures
            .get(&id)
            .map(f)
            .ok_or(HostError::StructureNotFound(id))
    }
}

impl WorldQuery for FakeWorld {
    fn session_role(&self) -> Option<SessionRole> {
        self.state.read().role
    }

    fn zones(&self) -> Result<Vec<ZoneInfo>, HostError> {
        let state = self.state.read();
        if state.fail_zones {
            return Err(HostError::Internal {
                message: String::from("zone enumeration failed"),
            });
        }
        Ok(state.zones.clone())
    }

    fn structures_in_sphere(&self, sphere: &BoundingSphere) -> Result<Vec<StructureId>, HostError> {
        let state = self.state.read();
        if state.fail_spatial {
            return Err(HostError::Internal {
                message: String::from("spatial query failed"),
            });
        }
        Ok(state
            .structures
            .values()
            .filter(|s| s.info.world_volume.intersects(sphere))
            .map(|s| s.info.id)
            .chain(state.ghosts.iter().copied())
            .collect())
    }

    fn structure(&self, id: StructureId) -> Result<Option<StructureInfo>, HostError> {
        Ok(self.info(id))
    }

    fn blocks(&self, id: StructureId) -> Result<Vec<BlockInfo>, HostError> {
        self.with_structure(id, |s| s.blocks.values().map(|b| b.info.clone()).collect())
    }

    fn has_block_at(&self, id: StructureId, cell: GridCell) -> Result<bool, HostError> {
        self.with_structure(id, |s| s.blocks.values().any(|b| cell.within(b.info.min, b.info.max)))
    }

    fn is_cell_airtight(&self, id: StructureId, cell: GridCell) -> Result<bool, HostError> {
        self.with_structure(id, |s| s.airtight_cells.contains(&cell))
    }

    fn is_point_airtight(&self, id: StructureId, point: WorldPoint) -> Result<bool, HostError> {
        self.with_structure(id, |s| s.encloses_points && s.info.world_volume.contains(&point))
    }

    fn is_protected(&self, id: StructureId) -> Result<bool, HostError> {
        self.with_structure(id, |s| s.protected)
    }
}

pub(crate) struct FakeMutator<'a>(&'a FakeWorld);

impl WorldMutator for FakeMutator<'_> {
    fn block_integrity(
        &self,
        id: StructureId,
        cell: GridCell,
    ) -> Result<Option<BlockIntegrity>, HostError> {
        Ok(self.0.block(id, cell).map(|b| b.integrity))
    }

    fn apply_skin(&mut self, id: StructureId, cell: GridCell, stage: &StageId) -> Result<(), HostError> {
        let mut state = self.0.state.write();
        let block = state
            .structures
            .get_mut(&id)
            .and_then(|s| s.blocks.get_mut(&cell))
            .ok_or(HostError::BlockNotFound { structure: id, cell })?;
        block.info.skin = stage.clone();
        Ok(())
    }

    fn decrease_integrity(&mut self, id: StructureId, cell: GridCell, amount: f32) -> Result<(), HostError> {
        let mut state = self.0.state.write();
        let block = state
            .structures
            .get_mut(&id)
            .and_then(|s| s.blocks.get_mut(&cell))
            .ok_or(HostError::BlockNotFound { structure: id, cell })?;
        block.integrity.current = (block.integrity.current - amount).max(0.0);
        Ok(())
    }

    fn remove_block(&mut self, id: StructureId, cell: GridCell) -> Result<(), HostError> {
        let mut state = self.0.state.write();
        let structure = state
            .structures
            .get_mut(&id)
            .ok_or(HostError::StructureNotFound(id))?;
        structure
            .blocks
            .remove(&cell)
            .ok_or(HostError::BlockNotFound { structure: id, cell })?;
        structure.info.block_count = structure.blocks.len();
        Ok(())
    }
}

/// Runs every job immediately against a shared [`FakeWorld`] and records
/// debug messages.
#[derive(Debug)]
pub(crate) struct InlineGameThread {
    world: Arc<FakeWorld>,
    closed: Mutex<bool>,
    invoked: Mutex<usize>,
    messages: Mutex<Vec<(String, String)>>,
}

impl InlineGameThread {
    pub(crate) fn new(world: Arc<FakeWorld>) -> Self {
        Self {
            world,
            closed: Mutex::new(false),
            invoked: Mutex::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn close(&self) {
        *self.closed.lock() = true;
    }

    pub(crate) fn invoked(&self) -> usize {
        *self.invoked.lock()
    }

    pub(crate) fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }
}

impl GameThread for InlineGameThread {
    fn invoke(&self, job: GameThreadJob) -> Result<(), HostError> {
        if *self.closed.lock() {
            return Err(HostError::GameThreadClosed);
        }
        {
            let mut invoked = self.invoked.lock();
            *invoked = invoked.saturating_add(1);
        }
        job(&mut self.world.mutator());
        Ok(())
    }

    fn show_message(&self, title: &str, body: &str) {
        self.messages.lock().push((title.to_owned(), body.to_owned()));
    }
}
