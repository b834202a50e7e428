//! Headless host for the Corrosion aging engine.
//!
//! Stands in for a game server: it builds the starting world, hands the
//! aging scheduler a world view and a game thread, and steps the scheduler
//! at a fixed rate until the tick limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Read host settings from the environment
//! 2. Initialize structured logging (tracing)
//! 3. Load `corrosion-config.yaml` from the world directory
//! 4. Create the starting world
//! 5. Wire the game thread and the tick scheduler
//! 6. Run the host loop
//! 7. Log the result and the final state of every grid

mod error;
mod runner;
mod settings;

use std::sync::Arc;

use corrosion_core::{ConfigStore, GameThread, TickScheduler, WorldQuery};
use corrosion_world::{SharedWorld, create_starting_world, game_thread};
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::settings::HostSettings;

/// Application entry point for the headless host.
///
/// # Errors
///
/// Returns an error if the settings are malformed or the starting world
/// cannot be built.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Settings come first so they can pick the log format.
    let settings = HostSettings::from_env()?;

    // 2. Initialize structured logging.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if settings.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        world_dir = %settings.world_dir.display(),
        max_ticks = settings.max_ticks,
        "corrosion-engine starting"
    );

    // 3. Load configuration.
    let config = Arc::new(ConfigStore::new(&settings.world_dir).load());

    // 4. Create the starting world.
    let (world_map, ids) = create_starting_world().map_err(EngineError::from)?;
    info!(
        zone_count = world_map.zone_count(),
        grid_count = world_map.grid_count(),
        first_zone = %ids.earth,
        "Starting world created"
    );
    let world = SharedWorld::new(world_map);

    // 5. Wire the game thread and the scheduler.
    let (handle, mut executor) = game_thread(world.clone());
    let mut scheduler = TickScheduler::new(
        config,
        Arc::new(world.clone()) as Arc<dyn WorldQuery>,
        Arc::new(handle) as Arc<dyn GameThread>,
        Handle::current(),
    );

    // 6. Run the host loop.
    let result = runner::run_host(&mut scheduler, &mut executor, &settings, shutdown_signal()).await;

    // 7. Log results.
    runner::log_run_end(&result);
    log_world_state(&world);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "corrosion-engine shutdown complete"
    );

    Ok(())
}

/// Resolve on Ctrl-C. If the handler cannot be installed, never resolve,
/// leaving the tick limit as the only way out.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Log how far each grid has aged.
fn log_world_state(world: &SharedWorld) {
    let world = world.read();
    for grid in world.grids() {
        let aged = grid.blocks().filter(|b| !b.info.skin.is_base()).count();
        let damaged = grid
            .blocks()
            .filter(|b| b.integrity.current < b.integrity.max)
            .count();
        info!(
            grid = grid.info().name,
            blocks = grid.info().block_count,
            aged,
            damaged,
            "Final grid state"
        );
    }
}
