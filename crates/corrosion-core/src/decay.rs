//! The block degradation state machine.
//!
//! Each sampled block is judged in two screens followed by stage
//! resolution:
//!
//! 1. [`screen_structure`] -- per-structure eligibility (closed, power
//!    rule, immunity, safe zones, sealed inside another structure). Run
//!    once per structure per pass.
//! 2. [`screen_block`] -- per-block eligibility (skin blacklist, exposure
//!    through an open face, the zone's advancement roll).
//! 3. [`resolve_stage`] -- pure: what the block becomes next.
//!
//! [`decide`] composes all three for a single candidate. The first failing
//! check wins and is reported as a [`SkipReason`]; nothing here mutates the
//! world.

use corrosion_types::{BlockInfo, StageId, StageStep, StructureInfo, face_neighbours};
use rand::Rng;

use crate::config::AgingConfig;
use crate::host::{HostError, WorldQuery};
use crate::registry::ResolvedZone;

/// Largest structure whose blocks are all treated as exposed without
/// probing their neighbours.
pub const TRIVIALLY_EXPOSED_BLOCK_COUNT: usize = 6;

/// Errors raised while deciding a candidate's fate.
#[derive(Debug, thiserror::Error)]
pub enum DecayError {
    /// A host query failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The zone's stage sequence cannot place the block.
    #[error("zone {zone} has an unusable aging stage sequence")]
    BrokenStageSequence {
        /// Name of the zone.
        zone: String,
    },
}

/// Why a candidate was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The structure is closed or marked for removal.
    Closed,
    /// The structure has no physics body.
    NotPhysical,
    /// The structure is powered and the power rule applies.
    Powered,
    /// The structure is flagged immune to damage.
    Immune,
    /// The structure sits in a safe zone.
    Protected,
    /// The structure is inside another structure's sealed room.
    Sealed,
    /// The block's skin or subtype is blacklisted.
    Blacklisted,
    /// Every face of the block is covered or airtight.
    Enclosed,
    /// The advancement roll failed.
    Unlucky,
    /// The block is at the terminal stage and damage is disabled.
    Terminal,
    /// The block is at the terminal stage of a respawn structure.
    Mercy,
}

impl SkipReason {
    /// Short lowercase label for log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::NotPhysical => "not_physical",
            Self::Powered => "powered",
            Self::Immune => "immune",
            Self::Protected => "protected",
            Self::Sealed => "sealed",
            Self::Blacklisted => "blacklisted",
            Self::Enclosed => "enclosed",
            Self::Unlucky => "unlucky",
            Self::Terminal => "terminal",
            Self::Mercy => "mercy",
        }
    }
}

impl core::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fate of one candidate block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Leave the block as it is.
    Skip(SkipReason),
    /// Repaint the block with the given stage.
    AdvanceStage(StageId),
    /// Damage the block structurally.
    Damage,
}

impl Decision {
    /// Whether this decision produces an effect.
    pub const fn is_effect(&self) -> bool {
        !matches!(self, Self::Skip(_))
    }
}

/// A block under evaluation together with its structure and zone.
#[derive(Debug, Clone, Copy)]
pub struct DegradationCandidate<'a> {
    /// The owning structure.
    pub structure: &'a StructureInfo,
    /// The block.
    pub block: &'a BlockInfo,
    /// The zone the structure was discovered in.
    pub zone: &'a ResolvedZone,
}

impl DegradationCandidate<'_> {
    /// The block's current aging stage (its skin).
    pub const fn current_stage(&self) -> &StageId {
        &self.block.skin
    }
}

/// Judge the structure-level checks. Returns the first failing check, or
/// `None` if the structure's blocks may be considered.
///
/// # Errors
///
/// Returns [`HostError`] if a safe-zone or airtightness query fails.
pub fn screen_structure(
    structure: &StructureInfo,
    zone: &ResolvedZone,
    config: &AgingConfig,
    world: &dyn WorldQuery,
) -> Result<Option<SkipReason>, HostError> {
    if structure.closed {
        return Ok(Some(SkipReason::Closed));
    }
    if !structure.physical {
        return Ok(Some(SkipReason::NotPhysical));
    }
    if (config.only_aged_unpowered_grids || zone.only_aged_unpowered_grids) && structure.powered {
        return Ok(Some(SkipReason::Powered));
    }
    if structure.immune {
        return Ok(Some(SkipReason::Immune));
    }
    if world.is_protected(structure.id)? {
        return Ok(Some(SkipReason::Protected));
    }
    if is_sealed(structure, world)? {
        return Ok(Some(SkipReason::Sealed));
    }
    Ok(None)
}

/// Whether another structure reports the centre of `structure` as inside
/// one of its sealed rooms (a hangar or an enclosing base).
fn is_sealed(structure: &StructureInfo, world: &dyn WorldQuery) -> Result<bool, HostError> {
    let center = structure.world_volume.center;
    for other in world.structures_in_sphere(&structure.world_volume)? {
        if other == structure.id {
            continue;
        }
        match world.is_point_airtight(other, center) {
            Ok(true) => return Ok(true),
            Ok(false) | Err(HostError::StructureNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

/// Judge the block-level checks, including the zone's advancement roll.
/// Returns the first failing check, or `None` if the block advances.
///
/// # Errors
///
/// Returns [`HostError`] if a neighbour probe fails.
pub fn screen_block<R: Rng>(
    candidate: &DegradationCandidate<'_>,
    config: &AgingConfig,
    world: &dyn WorldQuery,
    rng: &mut R,
) -> Result<Option<SkipReason>, HostError> {
    let block = candidate.block;
    if config.is_skin_blacklisted(&block.skin) || config.is_blacklisted(&block.subtype) {
        return Ok(Some(SkipReason::Blacklisted));
    }
    if !has_open_face(candidate.structure, block, world)? {
        return Ok(Some(SkipReason::Enclosed));
    }
    // `random::<f64>()` is in [0, 1), so 1.0 always passes and 0.0 never does.
    if rng.random::<f64>() >= candidate.zone.advance_probability {
        return Ok(Some(SkipReason::Unlucky));
    }
    Ok(None)
}

/// Whether at least one face of the block touches open, unpressurised
/// space.
///
/// # Errors
///
/// Returns [`HostError`] if a neighbour probe fails.
pub fn has_open_face(
    structure: &StructureInfo,
    block: &BlockInfo,
    world: &dyn WorldQuery,
) -> Result<bool, HostError> {
    if structure.block_count <= TRIVIALLY_EXPOSED_BLOCK_COUNT {
        return Ok(true);
    }
    for cell in face_neighbours(block.min, block.max) {
        if !world.has_block_at(structure.id, cell)? && !world.is_cell_airtight(structure.id, cell)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Decide what a block carrying `current` becomes next.
///
/// A protective stage is stripped first, whatever the ordinary sequence
/// says. Otherwise the block steps along the zone's aging stages; at the
/// terminal stage it is damaged when block damage is enabled and the mercy
/// rule does not spare its structure.
///
/// # Errors
///
/// Returns [`DecayError::BrokenStageSequence`] if the zone's sequence
/// cannot place the block.
pub fn resolve_stage(
    current: &StageId,
    zone: &ResolvedZone,
    structure: &StructureInfo,
    config: &AgingConfig,
) -> Result<Decision, DecayError> {
    if let Some(next) = zone.protection_successor(current) {
        return Ok(Decision::AdvanceStage(next.clone()));
    }

    let step = zone
        .aging_stages
        .step_from(current)
        .ok_or_else(|| DecayError::BrokenStageSequence {
            zone: zone.name.clone(),
        })?;

    Ok(match step {
        StageStep::Advance(next) => Decision::AdvanceStage(next.clone()),
        StageStep::Terminal if !config.aging_damages_blocks => Decision::Skip(SkipReason::Terminal),
        StageStep::Terminal if structure.respawn && !config.no_mercy => Decision::Skip(SkipReason::Mercy),
        StageStep::Terminal => Decision::Damage,
    })
}

/// Run every check and stage resolution for one candidate.
///
/// # Errors
///
/// Returns [`DecayError`] if a host query fails or the zone's stage
/// sequence is unusable.
pub fn decide<R: Rng>(
    candidate: &DegradationCandidate<'_>,
    config: &AgingConfig,
    world: &dyn WorldQuery,
    rng: &mut R,
) -> Result<Decision, DecayError> {
    if let Some(reason) = screen_structure(candidate.structure, candidate.zone, config, world)? {
        return Ok(Decision::Skip(reason));
    }
    if let Some(reason) = screen_block(candidate, config, world, rng)? {
        return Ok(Decision::Skip(reason));
    }
    resolve_stage(candidate.current_stage(), candidate.zone, candidate.structure, config)
}
