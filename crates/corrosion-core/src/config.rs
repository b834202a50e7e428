//! Configuration loading and typed config structures for the aging engine.
//!
//! The configuration lives in `corrosion-config.yaml` inside the world's
//! storage directory. It is read once at startup by [`ConfigStore::load`]
//! and is immutable afterwards; the engine shares it as an
//! `Arc<AgingConfig>`.
//!
//! Loading never fails: a missing file is created from the built-in
//! defaults, and an unreadable or malformed file is left untouched while
//! the defaults are used for this run.

use std::path::{Path, PathBuf};

use corrosion_types::StageId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// File name of the persisted configuration inside the storage directory.
pub const CONFIG_FILE_NAME: &str = "corrosion-config.yaml";

/// Fraction of full integrity removed by one damage effect unless
/// configured otherwise.
pub const DEFAULT_DAMAGE_QUANTUM: f32 = 0.5;

/// Stage sequence used by zones that do not list their own.
pub const DEFAULT_AGING_STAGES: [&str; 2] = ["Rusty_Armor", "Heavy_Rust_Armor"];

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse or emit YAML content.
    #[error("failed to process config YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// How world zones are matched against the configured zone list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneMatchPolicy {
    /// A world zone takes the first configured entry whose `name_match`
    /// it contains.
    #[default]
    FirstMatch,
    /// Every configured entry whose `name_match` the world zone contains
    /// registers its own resolved zone.
    AllMatches,
}

/// Top-level aging configuration.
///
/// Mirrors the structure of `corrosion-config.yaml`. Every field has a
/// default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingConfig {
    /// Skip powered structures in every zone.
    #[serde(default)]
    pub only_aged_unpowered_grids: bool,

    /// Blocks at the terminal stage take structural damage.
    #[serde(default)]
    pub aging_damages_blocks: bool,

    /// Damage respawn/starter structures too.
    #[serde(default)]
    pub no_mercy: bool,

    /// Zone matching policy.
    #[serde(default)]
    pub zone_match: ZoneMatchPolicy,

    /// Surface effect applications through the host's message display.
    #[serde(default)]
    pub debug_messages: bool,

    /// Per-zone aging parameters, in match order.
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,

    /// Substrings that exempt a block from aging when found in its skin or
    /// block subtype.
    #[serde(default = "default_block_skin_blacklist")]
    pub block_skin_blacklist: Vec<String>,

    /// Tick cadence of the scheduler phases.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Bounds on the work done by one sampling pass.
    #[serde(default)]
    pub sampling: SamplingConfig,
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            only_aged_unpowered_grids: false,
            aging_damages_blocks: false,
            no_mercy: false,
            zone_match: ZoneMatchPolicy::default(),
            debug_messages: false,
            zones: default_zones(),
            block_skin_blacklist: default_block_skin_blacklist(),
            schedule: ScheduleConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

impl AgingConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.sampling.sanitize();
        Ok(config)
    }

    /// Render the configuration as YAML, in the format [`parse`](Self::parse) reads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Whether `subject` (a skin or block subtype name) contains any
    /// blacklisted substring. Empty blacklist entries are ignored.
    pub fn is_blacklisted(&self, subject: &str) -> bool {
        self.block_skin_blacklist
            .iter()
            .any(|needle| !needle.is_empty() && subject.contains(needle.as_str()))
    }

    /// Whether the stage `skin` contains any blacklisted substring.
    pub fn is_skin_blacklisted(&self, skin: &StageId) -> bool {
        self.block_skin_blacklist.iter().any(|needle| skin.contains(needle))
    }
}

/// Aging parameters for zones whose name contains `name_match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Substring matched against the world zone's name.
    pub name_match: String,

    /// Mean real-time seconds between advancement opportunities for a
    /// sampled block.
    #[serde(default = "default_aging_rate")]
    pub aging_rate: f64,

    /// Skip powered structures in this zone.
    #[serde(default)]
    pub only_aged_unpowered_grids: bool,

    /// Protective stages stripped before ordinary aging begins.
    #[serde(default)]
    pub extra_protection_stages: Vec<ExtraProtectionStage>,

    /// Ordered aging stages; empty means [`DEFAULT_AGING_STAGES`].
    #[serde(default)]
    pub aging_stages: Vec<String>,
}

impl ZoneConfig {
    /// A zone entry with the given match and rate and no other overrides.
    pub fn new(name_match: impl Into<String>, aging_rate: f64) -> Self {
        Self {
            name_match: name_match.into(),
            aging_rate,
            only_aged_unpowered_grids: false,
            extra_protection_stages: Vec::new(),
            aging_stages: Vec::new(),
        }
    }
}

/// One protective-stage substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraProtectionStage {
    /// Skin that counts as a protective layer.
    pub origin: String,

    /// Skin revealed when the layer is stripped; empty reveals the base
    /// material.
    #[serde(default)]
    pub next: String,
}

impl ExtraProtectionStage {
    /// A substitution from `origin` to `next`.
    pub fn new(origin: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            next: next.into(),
        }
    }
}

/// Tick cadence of the scheduler phases. An interval of zero disables the
/// phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Ticks between draining one deferred effect.
    #[serde(default = "default_drain_interval_ticks")]
    pub drain_interval_ticks: u64,

    /// Ticks between zone registry refreshes.
    #[serde(default = "default_refresh_interval_ticks")]
    pub refresh_interval_ticks: u64,

    /// Ticks between sampling pass dispatches.
    #[serde(default = "default_dispatch_interval_ticks")]
    pub dispatch_interval_ticks: u64,

    /// Host simulation steps per real-time second.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            drain_interval_ticks: default_drain_interval_ticks(),
            refresh_interval_ticks: default_refresh_interval_ticks(),
            dispatch_interval_ticks: default_dispatch_interval_ticks(),
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

impl ScheduleConfig {
    /// Real-time seconds between sampling pass dispatches. Zero when either
    /// the dispatch interval or the tick rate is zero.
    pub fn dispatch_interval_seconds(&self) -> f64 {
        if self.ticks_per_second == 0 {
            return 0.0;
        }
        ticks_as_f64(self.dispatch_interval_ticks) / ticks_as_f64(self.ticks_per_second)
    }
}

/// Bounds on the work done by one sampling pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Distinct structures evaluated per zone per pass.
    #[serde(default = "default_structures_per_zone")]
    pub structures_per_zone: usize,

    /// Distinct blocks evaluated per selected structure.
    #[serde(default = "default_blocks_per_structure")]
    pub blocks_per_structure: usize,

    /// Fraction of a block's full integrity removed by one damage effect.
    #[serde(default = "default_damage_quantum")]
    pub damage_quantum: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            structures_per_zone: default_structures_per_zone(),
            blocks_per_structure: default_blocks_per_structure(),
            damage_quantum: default_damage_quantum(),
        }
    }
}

impl SamplingConfig {
    /// `quantum` if it is a usable damage fraction: finite, above zero and
    /// at most one.
    pub fn checked_damage_quantum(quantum: f32) -> Option<f32> {
        (quantum.is_finite() && quantum > 0.0 && quantum <= 1.0).then_some(quantum)
    }

    /// The configured damage quantum, or [`DEFAULT_DAMAGE_QUANTUM`] if the
    /// configured one is unusable.
    pub fn effective_damage_quantum(&self) -> f32 {
        Self::checked_damage_quantum(self.damage_quantum).unwrap_or(DEFAULT_DAMAGE_QUANTUM)
    }

    /// Replace an unusable damage quantum with the default.
    fn sanitize(&mut self) {
        if Self::checked_damage_quantum(self.damage_quantum).is_none() {
            warn!(
                damage_quantum = self.damage_quantum,
                fallback = DEFAULT_DAMAGE_QUANTUM,
                "Damage quantum must be in (0, 1], using default"
            );
            self.damage_quantum = DEFAULT_DAMAGE_QUANTUM;
        }
    }
}

/// Reads and writes [`AgingConfig`] in a world storage directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// A store for `corrosion-config.yaml` inside `storage_dir`.
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            path: storage_dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, falling back to defaults on any failure.
    ///
    /// If the file is absent the defaults are written out first so the
    /// operator has something to edit. A malformed file is not repaired.
    pub fn load(&self) -> AgingConfig {
        if !self.path.exists() {
            let defaults = AgingConfig::default();
            match self.save(&defaults) {
                Ok(()) => info!(path = %self.path.display(), "Default configuration written"),
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to write default configuration"
                ),
            }
            return defaults;
        }

        match AgingConfig::from_file(&self.path) {
            Ok(config) => {
                info!(
                    path = %self.path.display(),
                    zones = config.zones.len(),
                    aging_damages_blocks = config.aging_damages_blocks,
                    "Configuration loaded"
                );
                config
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Configuration unreadable, using defaults"
                );
                AgingConfig::default()
            }
        }
    }

    /// Write `config` to the store, creating the storage directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    pub fn save(&self, config: &AgingConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, config.to_yaml()?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn ticks_as_f64(ticks: u64) -> f64 {
    u32::try_from(ticks).map_or(f64::from(u32::MAX), f64::from)
}

fn default_zones() -> Vec<ZoneConfig> {
    vec![
        ZoneConfig {
            only_aged_unpowered_grids: true,
            ..ZoneConfig::new("Earth", 300.0)
        },
        ZoneConfig {
            aging_stages: strings(&["Mossy_Armor", "Rusty_Armor", "Heavy_Rust_Armor"]),
            ..ZoneConfig::new("Alien", 180.0)
        },
        ZoneConfig {
            extra_protection_stages: vec![
                ExtraProtectionStage::new("Battered_Armor", ""),
                ExtraProtectionStage::new("Clean_Armor", ""),
            ],
            aging_stages: strings(&["Mossy_Armor", "Frozen_Armor"]),
            ..ZoneConfig::new("Triton", 100.0)
        },
        ZoneConfig {
            extra_protection_stages: vec![
                ExtraProtectionStage::new("Battered_Armor", ""),
                ExtraProtectionStage::new("Clean_Armor", ""),
                ExtraProtectionStage::new("Silver_Armor", ""),
                ExtraProtectionStage::new("Frozen_Armor", "Mossy_Armor"),
                ExtraProtectionStage::new("Mossy_Armor", ""),
            ],
            aging_stages: strings(&["Dust_Armor", "Rusty_Armor", "Heavy_Rust_Armor"]),
            ..ZoneConfig::new("Pertam", 60.0)
        },
        ZoneConfig::new("Venus", 50.0),
    ]
}

fn default_block_skin_blacklist() -> Vec<String> {
    strings(&["Concrete", "Wood"])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

const fn default_aging_rate() -> f64 {
    300.0
}

const fn default_drain_interval_ticks() -> u64 {
    180
}

const fn default_refresh_interval_ticks() -> u64 {
    3540
}

const fn default_dispatch_interval_ticks() -> u64 {
    3600
}

const fn default_ticks_per_second() -> u64 {
    60
}

const fn default_structures_per_zone() -> usize {
    5
}

const fn default_blocks_per_structure() -> usize {
    10
}

const fn default_damage_quantum() -> f32 {
    DEFAULT_DAMAGE_QUANTUM
}
