//! Aging engine core: configuration, zone registry, decay state machine,
//! sampling, deferred effects, and the tick scheduler.
//!
//! The host world is reached only through the traits in [`host`]; this
//! crate never owns world state.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration and its on-disk store
//! - [`host`] -- Collaborator traits implemented by the host world
//! - [`clock`] -- Tick counter and phase cadence
//! - [`registry`] -- Zones matched against configuration, swapped wholesale
//! - [`decay`] -- Eligibility checks and stage resolution for one block
//! - [`sampler`] -- Bounded random sampling passes over all zones
//! - [`effects`] -- Deferred effects and their queue to the game thread
//! - [`scheduler`] -- Per-tick orchestration of the phases above

pub mod clock;
pub mod config;
pub mod decay;
pub mod effects;
pub mod host;
pub mod registry;
pub mod sampler;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use config::{AgingConfig, ConfigError, ConfigStore};
pub use decay::{Decision, DecayError, SkipReason};
pub use effects::{DeferredEffect, EffectOutcome};
pub use host::{GameThread, GameThreadJob, HostError, WorldMutator, WorldQuery};
pub use registry::{ResolvedZone, ZoneRegistry};
pub use sampler::{PassSummary, SamplingEngine};
pub use scheduler::{SchedulerState, TickReport, TickScheduler};
