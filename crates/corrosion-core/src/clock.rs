//! Tick counter and phase cadence for the scheduler.
//!
//! The host calls the scheduler once per simulation step. The clock counts
//! those steps and answers whether a phase with a given interval is due on
//! the current one. The tick number is the only state; cadence is always
//! derived from it.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Counts host simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickClock {
    /// Number of steps counted so far.
    tick: u64,
}

impl TickClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// A clock starting at `tick`.
    pub const fn from_tick(tick: u64) -> Self {
        Self { tick }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether a phase repeating every `interval` ticks falls on the current
    /// tick. An interval of zero is never due.
    pub fn is_due(&self, interval: u64) -> bool {
        self.tick.checked_rem(interval) == Some(0)
    }

    /// Ticks remaining until the next multiple of `interval` strictly after
    /// the current tick, or `None` for a zero interval.
    pub fn ticks_until_next(&self, interval: u64) -> Option<u64> {
        let into = self.tick.checked_rem(interval)?;
        interval.checked_sub(into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_clock_starts_at_zero() {
        let clock = TickClock::new();
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn advance_increments_tick() {
        let mut clock = TickClock::new();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn advance_at_max_overflows() {
        let mut clock = TickClock::from_tick(u64::MAX);
        assert!(clock.advance().is_err());
        assert_eq!(clock.tick(), u64::MAX);
    }

    #[test]
    fn due_on_multiples_only() {
        assert!(TickClock::from_tick(0).is_due(180));
        assert!(TickClock::from_tick(3600).is_due(3600));
        assert!(TickClock::from_tick(3540).is_due(3540));
        assert!(!TickClock::from_tick(3599).is_due(3600));
    }

    #[test]
    fn zero_interval_is_never_due() {
        assert!(!TickClock::from_tick(0).is_due(0));
        assert!(!TickClock::from_tick(100).is_due(0));
        assert_eq!(TickClock::from_tick(100).ticks_until_next(0), None);
    }

    #[test]
    fn ticks_until_next_counts_forward() {
        assert_eq!(TickClock::from_tick(0).ticks_until_next(3600), Some(3600));
        assert_eq!(TickClock::from_tick(3599).ticks_until_next(3600), Some(1));
        assert_eq!(TickClock::from_tick(3600).ticks_until_next(3600), Some(3600));
    }
}
