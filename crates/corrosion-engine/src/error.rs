//! Error types for the engine binary.
//!
//! [`EngineError`] covers everything that can stop the host from starting.
//! Once the tick loop runs, failures are logged by the scheduler and never
//! surface here.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An environment setting could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    Setting {
        /// The environment variable.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The starting world could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: corrosion_world::WorldError,
    },
}
