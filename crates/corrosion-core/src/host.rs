//! Interfaces to the host simulation.
//!
//! The aging engine never owns the world it ages. Everything it needs from
//! the host is expressed through three traits:
//!
//! - [`WorldQuery`] -- read-only queries (zones, spatial lookups, block
//!   enumeration, airtightness, protected regions). Called from both the
//!   tick thread and the background sampling worker, so implementations
//!   must be `Send + Sync`.
//! - [`WorldMutator`] -- the mutating primitives (apply a skin, reduce
//!   integrity, remove a block). Only ever invoked on the host's game
//!   thread, inside a [`GameThreadJob`].
//! - [`GameThread`] -- hands a job over to the host's authoritative
//!   thread. Mutating world state anywhere else is unsafe.
//!
//! All calls are synchronous and return [`HostError`] on failure. A stale
//! handle (a structure that was closed since it was discovered) is not an
//! error for the `Option`-returning lookups; they report `None`.

use corrosion_types::{
    BlockInfo, BlockIntegrity, BoundingSphere, GridCell, SessionRole, StageId, StructureId,
    StructureInfo, WorldPoint, ZoneInfo,
};

/// Errors reported by host collaborators.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The referenced structure no longer exists.
    #[error("structure {0} not found")]
    StructureNotFound(StructureId),

    /// No block occupies the referenced cell.
    #[error("no block at {cell:?} in structure {structure}")]
    BlockNotFound {
        /// The owning structure.
        structure: StructureId,
        /// The cell that was addressed.
        cell: GridCell,
    },

    /// The game thread is gone and can no longer accept jobs.
    #[error("game thread unavailable")]
    GameThreadClosed,

    /// Any other failure inside the host.
    #[error("host error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

/// Read-only access to the host world.
pub trait WorldQuery: Send + Sync {
    /// How this process participates in the session, or `None` if no
    /// session is loaded yet.
    fn session_role(&self) -> Option<SessionRole>;

    /// All zone-like world objects.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host cannot enumerate its entities.
    fn zones(&self) -> Result<Vec<ZoneInfo>, HostError>;

    /// Top-level structures whose volume intersects `sphere`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the spatial query fails.
    fn structures_in_sphere(&self, sphere: &BoundingSphere) -> Result<Vec<StructureId>, HostError>;

    /// Current facts about a structure, or `None` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the lookup itself fails.
    fn structure(&self, id: StructureId) -> Result<Option<StructureInfo>, HostError>;

    /// Every block of a structure.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::StructureNotFound`] for a stale handle.
    fn blocks(&self, id: StructureId) -> Result<Vec<BlockInfo>, HostError>;

    /// Whether any block of the structure covers `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::StructureNotFound`] for a stale handle.
    fn has_block_at(&self, id: StructureId, cell: GridCell) -> Result<bool, HostError>;

    /// Whether `cell` of the structure lies inside a sealed, pressurised room.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::StructureNotFound`] for a stale handle.
    fn is_cell_airtight(&self, id: StructureId, cell: GridCell) -> Result<bool, HostError>;

    /// Whether the world-space `point` lies inside a sealed room of the
    /// structure.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::StructureNotFound`] for a stale handle.
    fn is_point_airtight(&self, id: StructureId, point: WorldPoint) -> Result<bool, HostError>;

    /// Whether the structure sits in a region where damage is disallowed
    /// (a safe zone).
    ///
    /// # Errors
    ///
    /// Returns [`HostError::StructureNotFound`] for a stale handle.
    fn is_protected(&self, id: StructureId) -> Result<bool, HostError>;
}

/// Mutating world primitives, used only on the game thread.
pub trait WorldMutator {
    /// Integrity of the block at `cell`, or `None` if there is no block
    /// there (or the structure is gone).
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the lookup itself fails.
    fn block_integrity(
        &self,
        id: StructureId,
        cell: GridCell,
    ) -> Result<Option<BlockIntegrity>, HostError>;

    /// Paint `stage` onto the block at `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the block cannot be addressed.
    fn apply_skin(&mut self, id: StructureId, cell: GridCell, stage: &StageId)
    -> Result<(), HostError>;

    /// Reduce the block's integrity by `amount` (absolute units).
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the block cannot be addressed.
    fn decrease_integrity(
        &mut self,
        id: StructureId,
        cell: GridCell,
        amount: f32,
    ) -> Result<(), HostError>;

    /// Remove the block from its structure entirely.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the block cannot be addressed.
    fn remove_block(&mut self, id: StructureId, cell: GridCell) -> Result<(), HostError>;
}

/// A unit of work to run on the host's game thread.
pub type GameThreadJob = Box<dyn FnOnce(&mut dyn WorldMutator) + Send + 'static>;

/// Hand-off onto the host's authoritative thread.
pub trait GameThread: Send + Sync {
    /// Schedule `job` to run on the game thread. The job may run after
    /// this call returns.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::GameThreadClosed`] if the game thread no
    /// longer accepts work.
    fn invoke(&self, job: GameThreadJob) -> Result<(), HostError>;

    /// Show a debug message to the local player. Off unless the host
    /// wires a display.
    fn show_message(&self, _title: &str, _body: &str) {}
}
