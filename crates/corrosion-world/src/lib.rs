//! In-memory host world for the Corrosion aging engine.
//!
//! Implements the host traits from `corrosion-core` over a small world of
//! planets and block grids, so the engine can run headless and be tested
//! end to end.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world building and mutation.
//! - [`grid`] -- [`Grid`]: blocks on an integer lattice with occupancy
//!   and sealed rooms.
//! - [`world_map`] -- [`WorldMap`] (owns all state, implements the
//!   mutating primitives) and [`SharedWorld`] (the read-side handle).
//! - [`game_thread`] -- Job hand-off onto the thread that owns the world.
//! - [`starting_world`] -- Default world used by the headless host.

pub mod error;
pub mod game_thread;
pub mod grid;
pub mod starting_world;
pub mod world_map;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use game_thread::{GameThreadExecutor, GameThreadHandle, game_thread};
pub use grid::{Grid, GridBlock};
pub use starting_world::{StartingWorldIds, create_starting_world};
pub use world_map::{SharedWorld, WorldMap};
