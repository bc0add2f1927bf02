//! Fixed-interval tick scheduling.
//!
//! Deadlines sit on a fixed grid starting one interval after arming. When a
//! tick runs past one or more deadlines, the overdue tick fires at once and
//! the missed ones are dropped rather than queued.
use std::time::{Duration, Instant};

use sampler_traits::Clock;

#[derive(Debug)]
pub struct Pacer<C: Clock> {
    clock: C,
    next: Option<Instant>,
    interval: Duration,
    skipped: u64,
}

impl<C: Clock> Pacer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            next: None,
            interval: Duration::ZERO,
            skipped: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Deadlines dropped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Forget the schedule; the next wait re-arms one interval from now.
    pub fn disarm(&mut self) {
        self.next = None;
    }

    /// Advance the schedule and return how long to sleep before the next
    /// tick, plus how many deadlines were dropped. Changing `interval`
    /// re-arms the schedule.
    pub fn schedule(&mut self, interval: Duration) -> (Duration, u64) {
        let interval = interval.max(Duration::from_millis(1));
        let now = self.clock.now();
        let due = match self.next {
            Some(due) if self.interval == interval => due,
            _ => now + interval,
        };
        self.interval = interval;

        if now < due {
            self.next = Some(due + interval);
            return (due - now, 0);
        }

        let late = now - due;
        let missed = u64::try_from(late.as_nanos() / interval.as_nanos()).unwrap_or(u64::MAX);
        let advance = u32::try_from(missed.saturating_add(1)).unwrap_or(u32::MAX);
        self.next = Some(due + interval.saturating_mul(advance));
        self.skipped = self.skipped.saturating_add(missed);
        (Duration::ZERO, missed)
    }

    /// Sleep on the clock until the next tick is due.
    pub fn wait(&mut self, interval: Duration) -> u64 {
        let (pause, missed) = self.schedule(interval);
        if !pause.is_zero() {
            self.clock.sleep(pause);
        }
        missed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampler_traits::ManualClock;

    #[test]
    fn first_tick_is_one_interval_out() {
        let clock = ManualClock::new();
        let mut p = Pacer::new(&clock);
        assert_eq!(p.wait(Duration::from_millis(10)), 0);
        assert_eq!(clock.elapsed(), Duration::from_millis(10));
        p.wait(Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(20));
    }

    #[test]
    fn overruns_skip_instead_of_queueing() {
        let clock = ManualClock::new();
        let mut p = Pacer::new(&clock);
        let ms = Duration::from_millis(10);
        p.wait(ms); // t=10
        clock.advance(Duration::from_millis(25)); // tick ran until t=35
        assert_eq!(p.wait(ms), 1); // t=20 fires late, t=30 dropped
        assert_eq!(clock.elapsed(), Duration::from_millis(35));
        p.wait(ms);
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
        assert_eq!(p.skipped(), 1);
    }

    #[test]
    fn changing_interval_rearms() {
        let clock = ManualClock::new();
        let mut p = Pacer::new(&clock);
        p.wait(Duration::from_millis(1000));
        p.wait(Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(1010));
    }
}
