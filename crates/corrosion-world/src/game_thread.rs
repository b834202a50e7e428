//! The game thread: the only place world state is mutated.
//!
//! [`game_thread`] returns a [`GameThreadHandle`], which the aging engine
//! uses to submit jobs from anywhere, and a [`GameThreadExecutor`], which
//! the host loop owns and pumps once per simulation step. Jobs run in
//! submission order under the world's write lock.

use corrosion_core::{GameThread, GameThreadJob, HostError};
use tokio::sync::mpsc;
use tracing::info;

use crate::world_map::SharedWorld;

/// Create a connected handle/executor pair for `world`.
pub fn game_thread(world: SharedWorld) -> (GameThreadHandle, GameThreadExecutor) {
    let (tx, rx) = mpsc::unbounded_channel();
    (GameThreadHandle { tx }, GameThreadExecutor { rx, world })
}

/// Submits jobs to the game thread.
#[derive(Debug, Clone)]
pub struct GameThreadHandle {
    tx: mpsc::UnboundedSender<GameThreadJob>,
}

impl GameThread for GameThreadHandle {
    fn invoke(&self, job: GameThreadJob) -> Result<(), HostError> {
        self.tx.send(job).map_err(|_closed| HostError::GameThreadClosed)
    }

    fn show_message(&self, title: &str, body: &str) {
        info!(title, body, "Debug message");
    }
}

/// Runs submitted jobs. Owned by the host loop.
pub struct GameThreadExecutor {
    rx: mpsc::UnboundedReceiver<GameThreadJob>,
    world: SharedWorld,
}

impl core::fmt::Debug for GameThreadExecutor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameThreadExecutor")
            .field("pending", &self.rx.len())
            .finish_non_exhaustive()
    }
}

impl GameThreadExecutor {
    /// Jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Run every job submitted so far. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran: usize = 0;
        while let Ok(job) = self.rx.try_recv() {
            let mut world = self.world.write();
            job(&mut *world);
            ran = ran.saturating_add(1);
        }
        ran
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::world_map::WorldMap;
    use corrosion_core::WorldMutator;
    use corrosion_types::{BoundingSphere, GridCell, StageId, WorldPoint};

    #[test]
    fn jobs_run_only_when_pumped_and_in_order() {
        let mut map = WorldMap::new();
        let mut grid = Grid::new("Mast", BoundingSphere::new(WorldPoint::ORIGIN, 2.0));
        grid.add_armor(GridCell::new(0, 0, 0), "", "LargeBlockArmorBlock").unwrap();
        let id = map.add_grid(grid).unwrap();
        let shared = SharedWorld::new(map);
        let (handle, mut executor) = game_thread(shared.clone());

        for stage in ["Rusty_Armor", "Heavy_Rust_Armor"] {
            handle
                .invoke(Box::new(move |world: &mut dyn WorldMutator| {
                    world
                        .apply_skin(id, GridCell::new(0, 0, 0), &StageId::from(stage))
                        .unwrap();
                }))
                .unwrap();
        }

        assert_eq!(executor.pending(), 2);
        let skin = |w: &SharedWorld| w.read().block(id, GridCell::new(0, 0, 0)).unwrap().info.skin.clone();
        assert!(skin(&shared).is_base());

        assert_eq!(executor.run_pending(), 2);
        assert_eq!(skin(&shared), StageId::from("Heavy_Rust_Armor"));
        assert_eq!(executor.run_pending(), 0);
    }

    #[test]
    fn dropped_executor_closes_the_handle() {
        let (handle, executor) = game_thread(SharedWorld::default());
        drop(executor);
        let result = handle.invoke(Box::new(|_world: &mut dyn WorldMutator| {}));
        assert!(matches!(result, Err(HostError::GameThreadClosed)));
    }
}
