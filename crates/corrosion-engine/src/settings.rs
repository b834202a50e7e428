//! Host settings read from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `CORROSION_WORLD_DIR` | `.` | Directory holding `corrosion-config.yaml` |
//! | `CORROSION_MAX_TICKS` | `0` | Stop after this many steps (0 runs until Ctrl-C) |
//! | `CORROSION_TICK_MS` | `16` | Wall-clock milliseconds per simulation step |
//! | `CORROSION_LOG_JSON` | unset | Emit JSON log lines when set to `1` or `true` |

use std::path::PathBuf;
use std::time::Duration;

use crate::error::EngineError;

const WORLD_DIR: &str = "CORROSION_WORLD_DIR";
const MAX_TICKS: &str = "CORROSION_MAX_TICKS";
const TICK_MS: &str = "CORROSION_TICK_MS";
const LOG_JSON: &str = "CORROSION_LOG_JSON";

const DEFAULT_TICK_MS: u64 = 16;

/// How the headless host runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    /// World storage directory.
    pub world_dir: PathBuf,
    /// Step limit. Zero means unbounded.
    pub max_ticks: u64,
    /// Wall-clock time per simulation step.
    pub tick_interval: Duration,
    /// Emit structured JSON logs instead of the human format.
    pub json_logs: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            world_dir: PathBuf::from("."),
            max_ticks: 0,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            json_logs: false,
        }
    }
}

impl HostSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value if
    /// it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let defaults = Self::default();
        let world_dir = lookup(WORLD_DIR)
            .filter(|dir| !dir.trim().is_empty())
            .map_or(defaults.world_dir, PathBuf::from);
        let max_ticks = parse_u64(MAX_TICKS, lookup(MAX_TICKS))?.unwrap_or(defaults.max_ticks);
        let tick_interval = parse_u64(TICK_MS, lookup(TICK_MS))?
            .map_or(defaults.tick_interval, Duration::from_millis);
        let json_logs = match lookup(LOG_JSON) {
            None => false,
            Some(value) => parse_flag(LOG_JSON, value)?,
        };

        Ok(Self {
            world_dir,
            max_ticks,
            tick_interval,
            json_logs,
        })
    }
}

fn parse_u64(name: &'static str, value: Option<String>) -> Result<Option<u64>, EngineError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_parse| EngineError::Setting { name, value })
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, EngineError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        _ => Err(EngineError::Setting { name, value }),
    }
}
