//! Deferred effects and the queue that carries them to the game thread.
//!
//! The sampling worker never touches the world. Each non-skip decision
//! becomes a [`DeferredEffect`] addressed by structure id and grid cell,
//! pushed through an [`EffectSender`]. The tick thread pops one effect per
//! drain with [`EffectQueue::drain_one`] and hands it to the host's
//! [`GameThread`], where it is applied against the live world exactly
//! once. A target that vanished in the meantime turns the effect into a
//! no-op.

use std::sync::Arc;

use corrosion_types::{GridCell, StageId, StructureId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::{DEFAULT_DAMAGE_QUANTUM, SamplingConfig};
use crate::decay::Decision;
use crate::host::{GameThread, HostError, WorldMutator};

/// Errors from the effect queue.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    /// The consuming side of the queue is gone.
    #[error("effect queue closed")]
    QueueClosed,
}

/// A world mutation decided by a sampling pass, applied later on the game
/// thread.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredEffect {
    /// Repaint a block with a new stage.
    AdvanceStage {
        /// Owning structure.
        structure: StructureId,
        /// Grid position of the block.
        block: GridCell,
        /// Stage to apply.
        stage: StageId,
    },
    /// Damage a block that has reached its terminal stage.
    Damage {
        /// Owning structure.
        structure: StructureId,
        /// Grid position of the block.
        block: GridCell,
        /// Fraction of the block's full integrity to remove.
        quantum: f32,
    },
}

/// What applying an effect did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The block was repainted.
    Reskinned,
    /// The block lost integrity.
    Damaged,
    /// The block was fully dismounted and has been removed.
    Removed,
    /// The structure or block no longer exists; nothing was done.
    TargetMissing,
}

impl DeferredEffect {
    /// The effect for `decision`, or `None` for a skip.
    pub fn from_decision(decision: Decision, structure: StructureId, block: GridCell, quantum: f32) -> Option<Self> {
        match decision {
            Decision::Skip(_) => None,
            Decision::AdvanceStage(stage) => Some(Self::AdvanceStage {
                structure,
                block,
                stage,
            }),
            Decision::Damage => Some(Self::Damage {
                structure,
                block,
                quantum,
            }),
        }
    }

    /// The structure and block this effect addresses.
    pub const fn target(&self) -> (StructureId, GridCell) {
        match self {
            Self::AdvanceStage { structure, block, .. } | Self::Damage { structure, block, .. } => {
                (*structure, *block)
            }
        }
    }

    /// Apply the effect to the live world.
    ///
    /// A damaged block whose integrity has already reached zero is removed
    /// instead of damaged further. An unusable quantum (not finite, not
    /// above zero, or above one) is replaced by the default, so damage never
    /// heals a block or dismounts it in one hit.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if a mutating primitive fails.
    pub fn apply(&self, world: &mut dyn WorldMutator) -> Result<EffectOutcome, HostError> {
        let (structure, block) = self.target();
        let Some(integrity) = world.block_integrity(structure, block)? else {
            return Ok(EffectOutcome::TargetMissing);
        };

        match self {
            Self::AdvanceStage { stage, .. } => {
                world.apply_skin(structure, block, stage)?;
                Ok(EffectOutcome::Reskinned)
            }
            Self::Damage { quantum, .. } => {
                if integrity.is_fully_dismounted() {
                    world.remove_block(structure, block)?;
                    Ok(EffectOutcome::Removed)
                } else {
                    let quantum =
                        SamplingConfig::checked_damage_quantum(*quantum).unwrap_or(DEFAULT_DAMAGE_QUANTUM);
                    world.decrease_integrity(structure, block, quantum * integrity.max)?;
                    Ok(EffectOutcome::Damaged)
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::AdvanceStage { structure, block, stage } => {
                format!("{stage} applied to block {block:?} of {structure}")
            }
            Self::Damage { structure, block, .. } => {
                format!("block {block:?} of {structure} damaged")
            }
        }
    }
}

/// Create a connected sender/queue pair.
pub fn effect_queue() -> (EffectSender, EffectQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EffectSender { tx }, EffectQueue { rx })
}

/// Producer side of the effect queue. Cheap to clone; safe to use from the
/// sampling worker.
#[derive(Debug, Clone)]
pub struct EffectSender {
    tx: mpsc::UnboundedSender<DeferredEffect>,
}

impl EffectSender {
    /// Queue an effect for application.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::QueueClosed`] if the queue has been dropped.
    pub fn enqueue(&self, effect: DeferredEffect) -> Result<(), EffectError> {
        self.tx.send(effect).map_err(|_closed| EffectError::QueueClosed)
    }
}

/// Consumer side of the effect queue, owned by the tick thread.
#[derive(Debug)]
pub struct EffectQueue {
    rx: mpsc::UnboundedReceiver<DeferredEffect>,
}

impl EffectQueue {
    /// Number of effects waiting.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Pop the oldest effect without applying it.
    pub fn try_pop(&mut self) -> Option<DeferredEffect> {
        self.rx.try_recv().ok()
    }

    /// Pop the oldest effect and hand it to the game thread. Returns the
    /// handed-off effect, or `None` if the queue was empty.
    ///
    /// Failures while applying the effect are logged and dropped; the
    /// effect is not retried. With `notify` set, every applied effect is
    /// also reported through [`GameThread::show_message`].
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the game thread refuses the job. The popped
    /// effect is lost.
    pub fn drain_one(
        &mut self,
        game_thread: &Arc<dyn GameThread>,
        notify: bool,
    ) -> Result<Option<DeferredEffect>, HostError> {
        let Some(effect) = self.try_pop() else {
            return Ok(None);
        };

        let job_effect = effect.clone();
        let display = notify.then(|| Arc::clone(game_thread));
        game_thread.invoke(Box::new(move |world: &mut dyn WorldMutator| {
            match job_effect.apply(world) {
                Ok(outcome) => {
                    debug!(effect = ?job_effect, outcome = ?outcome, "Effect applied");
                    if let Some(display) = display.filter(|_| outcome != EffectOutcome::TargetMissing) {
                        display.show_message("Corrosion", &job_effect.describe());
                    }
                }
                Err(e) => debug!(effect = ?job_effect, error = %e, "Effect failed, dropped"),
            }
        }))?;

        Ok(Some(effect))
    }
}
