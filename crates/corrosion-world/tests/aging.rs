//! End-to-end aging tests: the scheduler driving sampling passes against
//! the starting world, with effects applied through the game thread.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use corrosion_core::config::{ExtraProtectionStage, SamplingConfig, ScheduleConfig, ZoneConfig};
use corrosion_core::{AgingConfig, GameThread, TickScheduler, WorldQuery};
use corrosion_types::{GridCell, SessionRole, StageId, StructureId};
use corrosion_world::{GameThreadExecutor, SharedWorld, StartingWorldIds, create_starting_world, game_thread};
use tokio::runtime::Handle;

/// Passes every ten simulated seconds with one-second aging rates, so every
/// eligible block advances on every pass. Sampling covers whole zones.
fn certain_config() -> AgingConfig {
    AgingConfig {
        zones: vec![
            ZoneConfig {
                only_aged_unpowered_grids: true,
                ..ZoneConfig::new("Earth", 1.0)
            },
            ZoneConfig {
                extra_protection_stages: vec![ExtraProtectionStage::new("Clean_Armor", "")],
                aging_stages: vec![String::from("Mossy_Armor"), String::from("Frozen_Armor")],
                ..ZoneConfig::new("Triton", 1.0)
            },
        ],
        schedule: ScheduleConfig {
            drain_interval_ticks: 1,
            refresh_interval_ticks: 10_000,
            dispatch_interval_ticks: 500,
            ticks_per_second: 50,
        },
        sampling: SamplingConfig {
            structures_per_zone: 50,
            blocks_per_structure: 500,
            damage_quantum: 0.5,
        },
        ..AgingConfig::default()
    }
}

struct Harness {
    world: SharedWorld,
    ids: StartingWorldIds,
    scheduler: TickScheduler,
    executor: GameThreadExecutor,
}

impl Harness {
    fn new(config: AgingConfig) -> Self {
        let (map, ids) = create_starting_world().unwrap();
        let world = SharedWorld::new(map);
        let (handle, executor) = game_thread(world.clone());
        let scheduler = TickScheduler::new(
            Arc::new(config),
            Arc::new(world.clone()) as Arc<dyn WorldQuery>,
            Arc::new(handle) as Arc<dyn GameThread>,
            Handle::current(),
        );
        Self {
            world,
            ids,
            scheduler,
            executor,
        }
    }

    /// Run `ticks` host steps, waiting for each dispatched pass to finish
    /// and pumping the game thread after every step.
    async fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.scheduler.on_tick();
            if let Some(pass) = self.scheduler.take_pass_handle() {
                pass.await.unwrap();
            }
            self.executor.run_pending();
        }
    }

    fn skins(&self, grid: StructureId) -> Vec<StageId> {
        self.world
            .read()
            .grid(grid)
            .unwrap()
            .blocks()
            .map(|b| b.info.skin.clone())
            .collect()
    }

    fn all_skins_are(&self, grid: StructureId, stage: &str) -> bool {
        self.skins(grid).iter().all(|s| *s == StageId::from(stage))
    }

    fn keep_only(&self, keep: &[StructureId]) {
        let mut world = self.world.write();
        let doomed: Vec<StructureId> = world.grids().map(|g| g.id()).filter(|id| !keep.contains(id)).collect();
        for id in doomed {
            world.remove_grid(id);
        }
    }

    fn paint(&self, grid: StructureId, stage: &str) {
        let mut world = self.world.write();
        let grid = world.grid_mut(grid).unwrap();
        let anchors: Vec<GridCell> = grid.blocks().map(|b| b.info.position).collect();
        for anchor in anchors {
            grid.block_mut(anchor).unwrap().info.skin = StageId::from(stage);
        }
    }
}

#[tokio::test]
async fn one_pass_ages_exactly_the_eligible_blocks() {
    let mut h = Harness::new(certain_config());
    // One pass at tick 500, drained before the next one is due.
    h.run(999).await;

    let outpost = h.world.read().grid(h.ids.outpost).unwrap().clone();
    let pillar = GridCell::new(2, 1, 2);
    for block in outpost.blocks() {
        if block.info.position == pillar {
            assert!(block.info.skin.is_base(), "interior pillar must not age");
        } else {
            assert_eq!(block.info.skin, StageId::from("Rusty_Armor"));
        }
    }

    assert!(h.all_skins_are(h.ids.rover, "Rusty_Armor"));
    assert!(h.all_skins_are(h.ids.hangar, "Rusty_Armor"));

    assert!(h.all_skins_are(h.ids.bunker, "Concrete_Armor"));
    assert!(h.all_skins_are(h.ids.base, ""));
    assert!(h.all_skins_are(h.ids.ship, ""));
    assert!(h.all_skins_are(h.ids.station, ""));
    assert!(h.all_skins_are(h.ids.lander, ""));

    // Protective paint is stripped down to bare material first.
    assert!(h.all_skins_are(h.ids.triton_outpost, ""));
    assert_eq!(h.scheduler.pending_effects(), 0);
}

#[tokio::test]
async fn matching_the_moon_ages_the_lander() {
    let mut config = certain_config();
    config.zones.push(ZoneConfig::new("Moon", 1.0));
    let mut h = Harness::new(config);
    h.run(999).await;

    assert!(h.all_skins_are(h.ids.lander, "Rusty_Armor"));
    assert!(h.all_skins_are(h.ids.rover, "Rusty_Armor"));
}

#[tokio::test]
async fn second_pass_continues_along_the_sequence() {
    let mut h = Harness::new(certain_config());
    h.run(1_500).await;

    assert!(h.all_skins_are(h.ids.rover, "Heavy_Rust_Armor"));
    assert!(h.all_skins_are(h.ids.triton_outpost, "Mossy_Armor"));
}

#[tokio::test]
async fn terminal_blocks_are_damaged_except_on_respawn_grids() {
    let config = AgingConfig {
        aging_damages_blocks: true,
        ..certain_config()
    };
    let mut h = Harness::new(config);
    h.paint(h.ids.hangar, "Heavy_Rust_Armor");
    h.paint(h.ids.rover, "Heavy_Rust_Armor");

    h.run(1_000).await;

    let world = h.world.read();
    let hangar = world.grid(h.ids.hangar).unwrap();
    assert_eq!(hangar.info().block_count, 16);
    assert!(hangar.blocks().all(|b| b.integrity.current < b.integrity.max));

    let rover = world.grid(h.ids.rover).unwrap();
    assert!(rover.blocks().all(|b| b.integrity.current >= b.integrity.max));
}

#[tokio::test]
async fn repeated_damage_removes_blocks() {
    let config = AgingConfig {
        aging_damages_blocks: true,
        schedule: ScheduleConfig {
            dispatch_interval_ticks: 100,
            ..certain_config().schedule
        },
        ..certain_config()
    };
    let mut h = Harness::new(config);
    h.keep_only(&[h.ids.hangar, h.ids.ship]);
    h.paint(h.ids.hangar, "Heavy_Rust_Armor");

    // Passes at ticks 100 and 200 bring integrity to zero; the one at 300
    // removes the blocks.
    h.run(400).await;

    assert_eq!(h.world.read().grid(h.ids.hangar).unwrap().info().block_count, 0);
    assert_eq!(h.world.read().grid(h.ids.ship).unwrap().info().block_count, 3);
}

#[tokio::test]
async fn clients_never_age_the_world() {
    let mut h = Harness::new(certain_config());
    h.world.write().set_session(Some(SessionRole::Client));

    h.run(1_000).await;

    assert!(h.all_skins_are(h.ids.outpost, ""));
    assert_eq!(h.scheduler.tick(), 0);
}
