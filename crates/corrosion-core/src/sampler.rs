//! The sampling engine: one pass over every registered zone.
//!
//! A pass looks at a bounded random sample of structures per zone and a
//! bounded random sample of blocks per structure, runs the decay state
//! machine on each, and queues an effect for every block that should
//! change. It reads the world only; all mutation happens later through the
//! effect queue.
//!
//! Failures are contained: a host error abandons the current zone and the
//! pass moves on. A structure that disappears mid-pass is simply skipped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use corrosion_types::StructureInfo;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::AgingConfig;
use crate::decay::{self, DecayError, Decision, DegradationCandidate};
use crate::effects::{DeferredEffect, EffectError, EffectSender};
use crate::host::{HostError, WorldQuery};
use crate::registry::ResolvedZone;

/// Errors that end a sampling pass early.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// The effect queue was dropped; there is nowhere to put results.
    #[error(transparent)]
    Queue(#[from] EffectError),
}

/// Errors that abandon a single zone.
#[derive(Debug, thiserror::Error)]
enum ZoneError {
    #[error(transparent)]
    Decay(#[from] DecayError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Queue(#[from] EffectError),
}

/// Counters and timing for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Wall-clock time the pass started.
    pub started_at: DateTime<Utc>,
    /// How long the pass took.
    pub elapsed: Duration,
    /// Zones examined.
    pub zones_visited: u32,
    /// Zones abandoned because of a host error.
    pub zones_failed: u32,
    /// Structures drawn from spatial queries.
    pub structures_sampled: u32,
    /// Sampled structures that no longer existed.
    pub structures_stale: u32,
    /// Sampled structures rejected by the structure screen.
    pub structures_skipped: u32,
    /// Blocks run through the state machine.
    pub blocks_evaluated: u32,
    /// Effects queued.
    pub effects_enqueued: u32,
}

impl PassSummary {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            zones_visited: 0,
            zones_failed: 0,
            structures_sampled: 0,
            structures_stale: 0,
            structures_skipped: 0,
            blocks_evaluated: 0,
            effects_enqueued: 0,
        }
    }
}

fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

/// Choose up to `k` distinct items uniformly at random, in random order.
///
/// Partial Fisher-Yates shuffle: only the first `k` positions are
/// shuffled, so the cost is linear in `k` after the move.
pub fn sample_distinct<T, R: Rng>(mut items: Vec<T>, k: usize, rng: &mut R) -> Vec<T> {
    let n = items.len();
    let k = k.min(n);
    for i in 0..k {
        let j = rng.random_range(i..n);
        items.swap(i, j);
    }
    items.truncate(k);
    items
}

/// Runs sampling passes with a fixed configuration.
#[derive(Debug, Clone)]
pub struct SamplingEngine {
    config: Arc<AgingConfig>,
}

impl SamplingEngine {
    /// An engine using `config`.
    pub const fn new(config: Arc<AgingConfig>) -> Self {
        Self { config }
    }

    /// The configuration this engine samples with.
    pub fn config(&self) -> &AgingConfig {
        &self.config
    }

    /// Run one pass over `zones`, queueing effects into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::Queue`] if the effect queue has been
    /// dropped. Host failures never end the pass.
    pub fn run_pass<R: Rng>(
        &self,
        zones: &[ResolvedZone],
        world: &dyn WorldQuery,
        sink: &EffectSender,
        rng: &mut R,
    ) -> Result<PassSummary, SamplerError> {
        let clock = Instant::now();
        let mut summary = PassSummary::start();

        for zone in zones {
            bump(&mut summary.zones_visited);
            match self.sample_zone(zone, world, sink, rng, &mut summary) {
                Ok(()) => {}
                Err(ZoneError::Queue(e)) => return Err(e.into()),
                Err(e) => {
                    bump(&mut summary.zones_failed);
                    warn!(zone = %zone.name, error = %e, "Zone abandoned for this pass");
                }
            }
        }

        summary.elapsed = clock.elapsed();
        info!(
            zones = summary.zones_visited,
            zones_failed = summary.zones_failed,
            structures = summary.structures_sampled,
            blocks = summary.blocks_evaluated,
            effects = summary.effects_enqueued,
            elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Sampling pass finished"
        );
        Ok(summary)
    }

    fn sample_zone<R: Rng>(
        &self,
        zone: &ResolvedZone,
        world: &dyn WorldQuery,
        sink: &EffectSender,
        rng: &mut R,
        summary: &mut PassSummary,
    ) -> Result<(), ZoneError> {
        let nearby = world.structures_in_sphere(&zone.influence)?;
        let chosen = sample_distinct(nearby, self.config.sampling.structures_per_zone, rng);

        for id in chosen {
            bump(&mut summary.structures_sampled);
            let Some(structure) = world.structure(id)? else {
                bump(&mut summary.structures_stale);
                continue;
            };
            match self.sample_structure(&structure, zone, world, sink, rng, summary) {
                Err(ZoneError::Host(HostError::StructureNotFound(_))
                | ZoneError::Decay(DecayError::Host(HostError::StructureNotFound(_)))) => {
                    bump(&mut summary.structures_stale);
                    debug!(structure = %structure.name, "Structure vanished mid-pass");
                }
                other => other?,
            }
        }
        Ok(())
    }

    fn sample_structure<R: Rng>(
        &self,
        structure: &StructureInfo,
        zone: &ResolvedZone,
        world: &dyn WorldQuery,
        sink: &EffectSender,
        rng: &mut R,
        summary: &mut PassSummary,
    ) -> Result<(), ZoneError> {
        let config = self.config.as_ref();
        if let Some(reason) = decay::screen_structure(structure, zone, config, world)? {
            bump(&mut summary.structures_skipped);
            debug!(structure = %structure.name, zone = %zone.name, reason = %reason, "Structure skipped");
            return Ok(());
        }

        let blocks = sample_distinct(world.blocks(structure.id)?, config.sampling.blocks_per_structure, rng);
        for block in &blocks {
            bump(&mut summary.blocks_evaluated);
            let candidate = DegradationCandidate { structure, block, zone };

            let decision = match decay::screen_block(&candidate, config, world, rng)? {
                Some(reason) => Decision::Skip(reason),
                None => decay::resolve_stage(candidate.current_stage(), zone, structure, config)?,
            };
            debug!(
                structure = %structure.name,
                block = ?block.position,
                stage = %block.skin,
                decision = ?decision,
                "Block evaluated"
            );

            if let Some(effect) =
                DeferredEffect::from_decision(decision, structure.id, block.position, config.sampling.effective_damage_quantum())
            {
                sink.enqueue(effect)?;
                bump(&mut summary.effects_enqueued);
            }
        }
        Ok(())
    }
}
