use std::time::Duration;

/// Accumulates frame time and reports when a replication tick is due
pub struct TickTimer {
    interval: Duration,
    accumulated: Duration,
    tick: u64,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
            tick: 0,
        }
    }

    /// Returns true when at least one tick interval has elapsed. Several
    /// elapsed intervals still produce a single tick; the remainder carries over.
    pub fn update(&mut self, delta: Duration) -> bool {
        self.accumulated += delta;
        if self.accumulated < self.interval {
            return false;
        }
        if self.interval.is_zero() {
            self.accumulated = Duration::ZERO;
        } else {
            let elapsed = self.accumulated.as_nanos() / self.interval.as_nanos();
            let consumed = self.interval.as_nanos() * elapsed;
            self.accumulated -= Duration::from_nanos(consumed as u64);
        }
        self.tick += 1;
        true
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
