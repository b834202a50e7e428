//! The tick scheduler: the host calls [`TickScheduler::on_tick`] once per
//! simulation step and the scheduler decides which phases run.
//!
//! # Phases
//!
//! On every call, in order:
//!
//! 1. **Activate** -- the first call in an authoritative session refreshes
//!    the zone registry and moves the scheduler to `Running`.
//! 2. **Drain** -- every `drain_interval_ticks`, hand one queued effect to
//!    the game thread.
//! 3. **Advance** the tick counter.
//! 4. **Refresh** -- every `refresh_interval_ticks`, rebuild the registry.
//! 5. **Dispatch** -- every `dispatch_interval_ticks`, start a sampling
//!    pass on a blocking worker, unless the previous pass is still running.
//!
//! Nothing happens at all until the host reports an authoritative session
//! (offline or server). A failing phase is logged and the tick carries on;
//! `on_tick` itself never fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, TickClock};
use crate::config::AgingConfig;
use crate::effects::{EffectQueue, EffectSender, effect_queue};
use crate::host::{GameThread, HostError, WorldQuery};
use crate::registry::ZoneRegistry;
use crate::sampler::{PassSummary, SamplingEngine};

/// Errors raised inside a scheduler phase. Logged at the tick boundary.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The tick counter cannot advance.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// A host call made by a phase failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Lifecycle of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No authoritative session seen yet.
    Uninitialized,
    /// Activated; phases run on their cadence.
    Running,
}

/// Single-flight gate for sampling passes.
#[derive(Debug, Clone, Default)]
pub struct InFlightGate {
    busy: Arc<AtomicBool>,
}

impl InFlightGate {
    /// An open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate. Returns `None` if a pass already holds it.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Whether a pass currently holds the gate.
    pub fn is_in_flight(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`InFlightGate`]. Reopens the gate when dropped,
/// including during a panic unwind.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// What one call to [`TickScheduler::on_tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the session was authoritative; all other fields are unset
    /// when it was not.
    pub active: bool,
    /// Tick number after advancing.
    pub tick: u64,
    /// Whether the drain phase ran.
    pub drain_ran: bool,
    /// Whether an effect was handed to the game thread.
    pub effect_handed_off: bool,
    /// Zone count after a successful registry refresh.
    pub refreshed_zones: Option<usize>,
    /// Whether a sampling pass was started.
    pub dispatched: bool,
    /// Whether a due dispatch was dropped because a pass was in flight.
    pub dispatch_dropped: bool,
}

/// Drives registry refreshes, sampling passes and effect draining from the
/// host's tick.
pub struct TickScheduler {
    config: Arc<AgingConfig>,
    world: Arc<dyn WorldQuery>,
    game_thread: Arc<dyn GameThread>,
    registry: Arc<ZoneRegistry>,
    engine: SamplingEngine,
    sender: EffectSender,
    queue: EffectQueue,
    clock: TickClock,
    gate: InFlightGate,
    state: SchedulerState,
    runtime: Handle,
    last_pass: Option<JoinHandle<Option<PassSummary>>>,
}

impl core::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("state", &self.state)
            .field("tick", &self.clock.tick())
            .field("zones", &self.registry.len())
            .field("pending_effects", &self.queue.pending())
            .field("in_flight", &self.gate.is_in_flight())
            .finish_non_exhaustive()
    }
}

impl TickScheduler {
    /// A scheduler that samples `world`, applies effects through
    /// `game_thread`, and runs passes on `runtime`'s blocking pool.
    pub fn new(
        config: Arc<AgingConfig>,
        world: Arc<dyn WorldQuery>,
        game_thread: Arc<dyn GameThread>,
        runtime: Handle,
    ) -> Self {
        let (sender, queue) = effect_queue();
        Self {
            engine: SamplingEngine::new(Arc::clone(&config)),
            config,
            world,
            game_thread,
            registry: Arc::new(ZoneRegistry::new()),
            sender,
            queue,
            clock: TickClock::new(),
            gate: InFlightGate::new(),
            state: SchedulerState::Uninitialized,
            runtime,
            last_pass: None,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Ticks counted since activation.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The zone registry.
    pub const fn registry(&self) -> &Arc<ZoneRegistry> {
        &self.registry
    }

    /// The single-flight gate guarding sampling passes.
    pub const fn gate(&self) -> &InFlightGate {
        &self.gate
    }

    /// Effects waiting to be drained.
    pub fn pending_effects(&self) -> usize {
        self.queue.pending()
    }

    /// Take the handle of the most recently dispatched pass, if any.
    pub const fn take_pass_handle(&mut self) -> Option<JoinHandle<Option<PassSummary>>> {
        self.last_pass.take()
    }

    fn is_authoritative(&self) -> bool {
        self.world
            .session_role()
            .is_some_and(corrosion_types::SessionRole::is_authoritative)
    }

    /// Run the phases due on this simulation step.
    pub fn on_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_authoritative() {
            return report;
        }
        report.active = true;

        if self.state == SchedulerState::Uninitialized {
            self.refresh_phase(&mut report);
            self.state = SchedulerState::Running;
            info!(
                zones = self.registry.len(),
                first_pass_in_ticks = self.clock.ticks_until_next(self.config.schedule.dispatch_interval_ticks),
                "Aging scheduler running"
            );
        }

        if self.clock.is_due(self.config.schedule.drain_interval_ticks) {
            report.drain_ran = true;
            match self.drain_phase() {
                Ok(handed_off) => report.effect_handed_off = handed_off,
                Err(e) => warn!(tick = self.clock.tick(), error = %e, "Effect drain failed"),
            }
        }

        match self.clock.advance() {
            Ok(tick) => report.tick = tick,
            Err(e) => {
                warn!(error = %SchedulerError::from(e), "Tick counter stalled");
                return report;
            }
        }

        if self.clock.is_due(self.config.schedule.refresh_interval_ticks) {
            self.refresh_phase(&mut report);
        }

        if self.clock.is_due(self.config.schedule.dispatch_interval_ticks) {
            self.dispatch_phase(&mut report);
        }

        report
    }

    fn refresh_phase(&self, report: &mut TickReport) {
        match self.registry.refresh(self.world.as_ref(), &self.config) {
            Ok(zones) => {
                report.refreshed_zones = Some(zones);
                debug!(tick = self.clock.tick(), zones, "Zone registry refreshed");
            }
            Err(e) => warn!(
                tick = self.clock.tick(),
                error = %SchedulerError::from(e),
                "Zone refresh failed, keeping previous zones"
            ),
        }
    }

    fn drain_phase(&mut self) -> Result<bool, SchedulerError> {
        let drained = self
            .queue
            .drain_one(&self.game_thread, self.config.debug_messages)?;
        Ok(drained.is_some())
    }

    fn dispatch_phase(&mut self, report: &mut TickReport) {
        let Some(guard) = self.gate.try_acquire() else {
            report.dispatch_dropped = true;
            debug!(tick = self.clock.tick(), "Sampling pass still running, dispatch dropped");
            return;
        };

        let zones = self.registry.snapshot();
        let world = Arc::clone(&self.world);
        let engine = self.engine.clone();
        let sender = self.sender.clone();
        let tick = self.clock.tick();

        debug!(tick, zones = zones.len(), "Sampling pass dispatched");
        self.last_pass = Some(self.runtime.spawn_blocking(move || {
            let _guard = guard;
            let mut rng = rand::rng();
            match engine.run_pass(&zones, world.as_ref(), &sender, &mut rng) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(tick, error = %e, "Sampling pass aborted");
                    None
                }
            }
        }));
        report.dispatched = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{ScheduleConfig, ZoneConfig};
    use crate::testing::{FakeWorld, InlineGameThread, structure_info, zone_info};
    use corrosion_types::{GridCell, SessionRole, StageId, StructureId};

    fn config(schedule: ScheduleConfig) -> Arc<AgingConfig> {
        Arc::new(AgingConfig {
            zones: vec![ZoneConfig::new("Earth", 1.0)],
            schedule,
            ..AgingConfig::default()
        })
    }

    fn fast_schedule() -> ScheduleConfig {
        ScheduleConfig {
            drain_interval_ticks: 1,
            refresh_interval_ticks: 1_000,
            dispatch_interval_ticks: 2,
            ticks_per_second: 2,
        }
    }

    fn earth_world() -> (Arc<FakeWorld>, StructureId) {
        let world = Arc::new(FakeWorld::with_zones(vec![zone_info("EarthLike")]));
        let id = world.add_structure(structure_info("Outpost"));
        world.add_cube(id, 3, "");
        (world, id)
    }

    fn scheduler(
        config: Arc<AgingConfig>,
        world: &Arc<FakeWorld>,
    ) -> (TickScheduler, Arc<InlineGameThread>) {
        let game = Arc::new(InlineGameThread::new(Arc::clone(world)));
        let scheduler = TickScheduler::new(
            config,
            Arc::clone(world) as Arc<dyn WorldQuery>,
            Arc::clone(&game) as Arc<dyn GameThread>,
            Handle::current(),
        );
        (scheduler, game)
    }

    #[test]
    fn gate_admits_one_holder_at_a_time() {
        let gate = InFlightGate::new();
        let guard = gate.try_acquire().unwrap();
        assert!(gate.is_in_flight());
        assert!(gate.try_acquire().is_none());
        drop(guard);
        assert!(!gate.is_in_flight());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn gate_reopens_when_holder_panics() {
        let gate = InFlightGate::new();
        let guard = gate.try_acquire().unwrap();
        let result = std::thread::spawn(move || {
            let _guard = guard;
            panic!("pass blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(!gate.is_in_flight());
    }

    #[tokio::test]
    async fn nothing_runs_without_an_authoritative_session() {
        let (world, _) = earth_world();
        let (mut scheduler, _) = scheduler(config(fast_schedule()), &world);

        world.set_role(None);
        assert_eq!(scheduler.on_tick(), TickReport::default());
        world.set_role(Some(SessionRole::Client));
        assert_eq!(scheduler.on_tick(), TickReport::default());

        assert_eq!(scheduler.state(), SchedulerState::Uninitialized);
        assert_eq!(scheduler.tick(), 0);
        assert!(scheduler.registry().is_empty());

        world.set_role(Some(SessionRole::Server));
        assert!(scheduler.on_tick().active);
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[tokio::test]
    async fn first_tick_refreshes_the_registry() {
        let (world, _) = earth_world();
        let (mut scheduler, _) = scheduler(config(ScheduleConfig::default()), &world);

        let report = scheduler.on_tick();
        assert_eq!(report.refreshed_zones, Some(1));
        assert_eq!(report.tick, 1);
        assert!(report.drain_ran);
        assert!(!report.dispatched);
    }

    #[tokio::test]
    async fn phases_follow_their_cadence() {
        let (world, _) = earth_world();
        let schedule = ScheduleConfig {
            drain_interval_ticks: 3,
            refresh_interval_ticks: 5,
            dispatch_interval_ticks: 7,
            ticks_per_second: 60,
        };
        let (mut scheduler, _) = scheduler(config(schedule), &world);

        let mut drains = Vec::new();
        let mut refreshes = Vec::new();
        let mut dispatches = Vec::new();
        for _ in 0..15 {
            let before = scheduler.tick();
            let report = scheduler.on_tick();
            if report.drain_ran {
                drains.push(before);
            }
            if report.refreshed_zones.is_some() {
                refreshes.push(report.tick);
            }
            if report.dispatched {
                dispatches.push(report.tick);
            }
            if let Some(pass) = scheduler.take_pass_handle() {
                pass.await.unwrap();
            }
        }

        assert_eq!(drains, vec![0, 3, 6, 9, 12]);
        // Activation refresh on the first call, then every fifth tick.
        assert_eq!(refreshes, vec![1, 5, 10, 15]);
        assert_eq!(dispatches, vec![7, 14]);
    }

    #[tokio::test]
    async fn zero_intervals_disable_phases() {
        let (world, _) = earth_world();
        let schedule = ScheduleConfig {
            drain_interval_ticks: 0,
            refresh_interval_ticks: 0,
            dispatch_interval_ticks: 0,
            ticks_per_second: 60,
        };
        let (mut scheduler, _) = scheduler(config(schedule), &world);

        scheduler.on_tick();
        for _ in 0..20 {
            let report = scheduler.on_tick();
            assert!(!report.drain_ran);
            assert!(report.refreshed_zones.is_none());
            assert!(!report.dispatched);
        }
    }

    #[tokio::test]
    async fn due_dispatch_is_dropped_while_a_pass_is_in_flight() {
        let (world, _) = earth_world();
        let (mut scheduler, _) = scheduler(config(fast_schedule()), &world);

        let held = scheduler.gate().try_acquire().unwrap();
        scheduler.on_tick();
        let report = scheduler.on_tick();
        assert_eq!(report.tick, 2);
        assert!(report.dispatch_dropped);
        assert!(!report.dispatched);
        assert!(scheduler.take_pass_handle().is_none());

        drop(held);
        scheduler.on_tick();
        let report = scheduler.on_tick();
        assert!(report.dispatched);
        let summary = scheduler.take_pass_handle().unwrap().await.unwrap().unwrap();
        assert_eq!(summary.zones_visited, 1);
        assert!(!scheduler.gate().is_in_flight());
    }

    #[tokio::test]
    async fn dispatched_effects_reach_the_world_one_per_drain() {
        let (world, id) = earth_world();
        let (mut scheduler, game) = scheduler(config(fast_schedule()), &world);

        scheduler.on_tick();
        assert!(scheduler.on_tick().dispatched);
        let summary = scheduler.take_pass_handle().unwrap().await.unwrap().unwrap();
        assert!(summary.effects_enqueued > 0);

        let queued = scheduler.pending_effects();
        assert_eq!(queued, usize::try_from(summary.effects_enqueued).unwrap());

        let report = scheduler.on_tick();
        assert!(report.effect_handed_off);
        assert_eq!(game.invoked(), 1);
        assert_eq!(scheduler.pending_effects(), queued.saturating_sub(1));

        let rusty = (0..3)
            .flat_map(|x| (0..3).flat_map(move |y| (0..3).map(move |z| GridCell::new(x, y, z))))
            .filter(|cell| world.block(id, *cell).unwrap().info.skin == StageId::from("Rusty_Armor"))
            .count();
        assert_eq!(rusty, 1);
        assert!(game.messages().is_empty());
    }

    #[tokio::test]
    async fn debug_messages_surface_applied_effects() {
        let (world, _) = earth_world();
        let noisy = Arc::new(AgingConfig {
            debug_messages: true,
            ..(*config(fast_schedule())).clone()
        });
        let (mut scheduler, game) = scheduler(noisy, &world);

        scheduler.on_tick();
        scheduler.on_tick();
        scheduler.take_pass_handle().unwrap().await.unwrap();
        scheduler.on_tick();

        assert_eq!(game.messages().len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_zones() {
        let (world, _) = earth_world();
        let schedule = ScheduleConfig {
            refresh_interval_ticks: 2,
            ..fast_schedule()
        };
        let (mut scheduler, _) = scheduler(config(schedule), &world);

        scheduler.on_tick();
        assert_eq!(scheduler.registry().len(), 1);

        world.fail_zone_queries(true);
        let report = scheduler.on_tick();
        assert_eq!(report.tick, 2);
        assert!(report.refreshed_zones.is_none());
        assert_eq!(scheduler.registry().len(), 1);
    }

    #[tokio::test]
    async fn closed_game_thread_does_not_stop_the_tick() {
        let (world, _) = earth_world();
        let (mut scheduler, game) = scheduler(config(fast_schedule()), &world);

        scheduler.on_tick();
        scheduler.on_tick();
        scheduler.take_pass_handle().unwrap().await.unwrap();
        game.close();

        let report = scheduler.on_tick();
        assert!(report.drain_ran);
        assert!(!report.effect_handed_off);
        assert_eq!(report.tick, 3);
    }
}
