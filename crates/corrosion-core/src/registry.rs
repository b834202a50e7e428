//! Zone registry: the set of world zones that age structures, with their
//! aging parameters resolved and precomputed.
//!
//! The registry is rebuilt from scratch on every refresh and swapped in as
//! a whole. A sampling pass takes a [`snapshot`](ZoneRegistry::snapshot)
//! (a cheap `Arc` clone) when it starts and keeps using it even if a
//! refresh lands mid-pass; no [`ResolvedZone`] is ever mutated in place.

use std::collections::HashMap;
use std::sync::Arc;

use corrosion_types::{BoundingSphere, StageId, StageSequence, ZoneId, ZoneInfo};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::{AgingConfig, DEFAULT_AGING_STAGES, ScheduleConfig, ZoneConfig, ZoneMatchPolicy};
use crate::host::{HostError, WorldQuery};

/// A world zone matched against a [`ZoneConfig`], ready for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedZone {
    /// Host handle of the matched zone.
    pub zone: ZoneId,
    /// World name of the zone.
    pub name: String,
    /// The `name_match` of the configuration entry that matched.
    pub matched_by: String,
    /// Region searched for structures: the zone body plus its atmosphere.
    pub influence: BoundingSphere,
    /// Chance that an otherwise eligible block advances during one pass.
    pub advance_probability: f64,
    /// Skip powered structures in this zone.
    pub only_aged_unpowered_grids: bool,
    /// Protective stage substitutions, origin to successor. A base-stage
    /// successor reveals the bare material.
    pub extra_protection: HashMap<StageId, StageId>,
    /// Ordinary aging stages; the last one is terminal.
    pub aging_stages: StageSequence,
}

impl ResolvedZone {
    /// Resolve a zone against one configuration entry.
    ///
    /// Returns `None` when the entry's aging rate is not a positive finite
    /// number of seconds.
    pub fn resolve(info: &ZoneInfo, zone_config: &ZoneConfig, schedule: &ScheduleConfig) -> Option<Self> {
        let advance_probability =
            advance_probability(schedule.dispatch_interval_seconds(), zone_config.aging_rate)?;

        let aging_stages = StageSequence::with_fallback(
            zone_config.aging_stages.iter().map(StageId::new),
            DEFAULT_AGING_STAGES.iter().copied().map(StageId::from),
        )?;

        let mut extra_protection = HashMap::new();
        for stage in &zone_config.extra_protection_stages {
            let origin = StageId::new(stage.origin.as_str());
            if origin.is_base() {
                continue;
            }
            extra_protection
                .entry(origin)
                .or_insert_with(|| StageId::new(stage.next.as_str()));
        }

        Some(Self {
            zone: info.id,
            name: info.name.clone(),
            matched_by: zone_config.name_match.clone(),
            influence: info.influence_sphere(),
            advance_probability,
            only_aged_unpowered_grids: zone_config.only_aged_unpowered_grids,
            extra_protection,
            aging_stages,
        })
    }

    /// The successor of a protective stage, if `stage` is one.
    pub fn protection_successor(&self, stage: &StageId) -> Option<&StageId> {
        self.extra_protection.get(stage)
    }
}

/// Per-pass advancement probability: the real time between passes over
/// the zone's aging rate, clamped to `[0, 1]`.
///
/// Returns `None` for a rate that is not a positive finite number.
pub fn advance_probability(dispatch_interval_seconds: f64, aging_rate: f64) -> Option<f64> {
    if !aging_rate.is_finite() || aging_rate <= 0.0 {
        return None;
    }
    let probability = dispatch_interval_seconds / aging_rate;
    if probability.is_nan() {
        return None;
    }
    Some(probability.clamp(0.0, 1.0))
}

/// Match world zones against the configured zone list.
///
/// Configuration entries with an empty `name_match` never match; entries
/// with an unusable aging rate are skipped with a warning.
pub fn resolve_zones(world_zones: &[ZoneInfo], config: &AgingConfig) -> Vec<ResolvedZone> {
    let mut resolved = Vec::new();

    for info in world_zones {
        for zone_config in &config.zones {
            if zone_config.name_match.is_empty() || !info.name.contains(zone_config.name_match.as_str()) {
                continue;
            }

            match ResolvedZone::resolve(info, zone_config, &config.schedule) {
                Some(zone) => {
                    debug!(
                        zone = %zone.name,
                        matched_by = %zone.matched_by,
                        advance_probability = zone.advance_probability,
                        stages = zone.aging_stages.len(),
                        protective_stages = zone.extra_protection.len(),
                        "Zone matched"
                    );
                    resolved.push(zone);
                }
                None => warn!(
                    zone = %info.name,
                    matched_by = %zone_config.name_match,
                    aging_rate = zone_config.aging_rate,
                    "Zone config has an unusable aging rate, skipping"
                ),
            }

            if config.zone_match == ZoneMatchPolicy::FirstMatch {
                break;
            }
        }
    }

    resolved
}

/// The current set of resolved zones.
#[derive(Debug)]
pub struct ZoneRegistry {
    zones: RwLock<Arc<[ResolvedZone]>>,
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        let empty: Arc<[ResolvedZone]> = Arc::from(Vec::new());
        Self {
            zones: RwLock::new(empty),
        }
    }

    /// The current zone set. Stays valid (and unchanged) across later
    /// refreshes.
    pub fn snapshot(&self) -> Arc<[ResolvedZone]> {
        Arc::clone(&self.zones.read())
    }

    /// Number of zones in the current set.
    pub fn len(&self) -> usize {
        self.zones.read().len()
    }

    /// Whether the current set is empty.
    pub fn is_empty(&self) -> bool {
        self.zones.read().is_empty()
    }

    /// Replace the whole zone set.
    pub fn replace(&self, zones: Vec<ResolvedZone>) {
        let next: Arc<[ResolvedZone]> = Arc::from(zones);
        *self.zones.write() = next;
    }

    /// Rebuild the zone set from the host's current zones. Returns the new
    /// zone count.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host cannot list its zones; the
    /// previous zone set is kept.
    pub fn refresh(&self, world: &dyn WorldQuery, config: &AgingConfig) -> Result<usize, HostError> {
        let world_zones = world.zones()?;
        let resolved = resolve_zones(&world_zones, config);
        let count = resolved.len();
        self.replace(resolved);
        Ok(count)
    }
}
