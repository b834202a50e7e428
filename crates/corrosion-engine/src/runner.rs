//! Host loop: steps the aging scheduler and pumps the game thread.
//!
//! Each step calls [`TickScheduler::on_tick`] and then runs whatever jobs
//! the step handed to the game thread, the same order a live server uses
//! (update callback first, then queued invocations). The loop stops at the
//! step limit or when the shutdown future resolves.

use std::future::Future;

use corrosion_core::{TickReport, TickScheduler};
use corrosion_world::GameThreadExecutor;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::settings::HostSettings;

/// Why the host loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The configured step limit was reached.
    MaxTicksReached,
    /// The shutdown signal fired.
    ShutdownRequested,
}

/// Totals for one run of the host loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Host steps executed.
    pub total_ticks: u64,
    /// Sampling passes started.
    pub passes_dispatched: u64,
    /// Dispatches skipped because a pass was still running.
    pub passes_dropped: u64,
    /// Zone refreshes that succeeded.
    pub zone_refreshes: u64,
    /// Game-thread jobs run.
    pub jobs_run: u64,
    /// The report from the last step, if any ran.
    pub last_report: Option<TickReport>,
}

impl RunResult {
    const fn new(end_reason: RunEndReason) -> Self {
        Self {
            end_reason,
            total_ticks: 0,
            passes_dispatched: 0,
            passes_dropped: 0,
            zone_refreshes: 0,
            jobs_run: 0,
            last_report: None,
        }
    }

    fn record(&mut self, report: TickReport, jobs: usize) {
        self.total_ticks = self.total_ticks.saturating_add(1);
        if report.dispatched {
            self.passes_dispatched = self.passes_dispatched.saturating_add(1);
        }
        if report.dispatch_dropped {
            self.passes_dropped = self.passes_dropped.saturating_add(1);
        }
        if report.refreshed_zones.is_some() {
            self.zone_refreshes = self.zone_refreshes.saturating_add(1);
        }
        self.jobs_run = self
            .jobs_run
            .saturating_add(u64::try_from(jobs).unwrap_or(u64::MAX));
        self.last_report = Some(report);
    }
}

/// Run the host loop until the step limit or `shutdown` resolves.
///
/// A `max_ticks` of zero runs until shutdown. Steps are paced by
/// `tick_interval`; a zero interval runs steps back to back, yielding to
/// the runtime between them so background passes make progress.
pub async fn run_host(
    scheduler: &mut TickScheduler,
    executor: &mut GameThreadExecutor,
    settings: &HostSettings,
    shutdown: impl Future<Output = ()>,
) -> RunResult {
    info!(
        max_ticks = settings.max_ticks,
        tick_interval_ms = u64::try_from(settings.tick_interval.as_millis()).unwrap_or(u64::MAX),
        "Host loop starting"
    );

    let mut result = RunResult::new(RunEndReason::MaxTicksReached);
    let mut pacer = (!settings.tick_interval.is_zero()).then(|| {
        let mut interval = time::interval(settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    tokio::pin!(shutdown);

    loop {
        if settings.max_ticks > 0 && result.total_ticks >= settings.max_ticks {
            info!(max_ticks = settings.max_ticks, "Tick limit reached");
            result.end_reason = RunEndReason::MaxTicksReached;
            return result;
        }

        let step = async {
            match pacer.as_mut() {
                Some(interval) => {
                    interval.tick().await;
                }
                None => tokio::task::yield_now().await,
            }
        };

        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(total_ticks = result.total_ticks, "Shutdown requested");
                result.end_reason = RunEndReason::ShutdownRequested;
                return result;
            }
            () = step => {}
        }

        let report = scheduler.on_tick();
        let jobs = executor.run_pending();
        if report.dispatched {
            debug!(tick = report.tick, "Sampling pass dispatched");
        }
        if report.dispatch_dropped {
            debug!(tick = report.tick, "Sampling pass still running, dispatch skipped");
        }
        result.record(report, jobs);
    }
}

/// Log the outcome of a host run.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        passes_dispatched = result.passes_dispatched,
        passes_dropped = result.passes_dropped,
        zone_refreshes = result.zone_refreshes,
        jobs_run = result.jobs_run,
        "Host loop ended"
    );

    match result.last_report {
        Some(ref report) if report.active => {
            info!(tick = report.tick, "Final aging tick");
        }
        Some(_) => warn!("Session never became authoritative; nothing aged"),
        None => warn!("Host loop ended with no steps executed"),
    }
}
