//! Time management utilities

use std::time::{Duration, Instant};

/// Fixed-rate tick timer with drift correction
///
/// Deadlines are scheduled from the previous deadline rather than from the
/// moment a tick finished, so small oversleeps do not accumulate. When the
/// loop falls more than `max_catch_up` periods behind, the schedule is
/// re-anchored to the current instant instead of bursting through the backlog.
pub struct TickTimer {
    period: Duration,
    max_catch_up: u32,
    next_deadline: Instant,
    last_tick: Instant,
    delta_time: f32,
    total_time: f64,
    tick_count: u64,
    resyncs: u64,
}

impl TickTimer {
    /// Create a timer ticking `rate_hz` times per second
    pub fn new(rate_hz: u32, max_catch_up: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
        let now = Instant::now();
        Self {
            period,
            max_catch_up: max_catch_up.max(1),
            next_deadline: now + period,
            last_tick: now,
            delta_time: 0.0,
            total_time: 0.0,
            tick_count: 0,
            resyncs: 0,
        }
    }

    /// Restart the schedule from now
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_tick = now;
        self.next_deadline = now + self.period;
    }

    /// Nominal tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left until the next deadline (zero when late)
    pub fn time_until_next(&self) -> Duration {
        self.next_deadline.saturating_duration_since(Instant::now())
    }

    /// Sleep until the next deadline
    pub fn wait(&self) {
        let remaining = self.time_until_next();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }

    /// Mark a tick as started and return the actual elapsed seconds since the previous one
    pub fn advance(&mut self) -> f32 {
        self.advance_at(Instant::now())
    }

    fn advance_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += elapsed.as_secs_f64();
        self.last_tick = now;
        self.tick_count += 1;

        self.next_deadline += self.period;
        let lag_limit = self.period * self.max_catch_up;
        if now > self.next_deadline + lag_limit {
            log::warn!(
                "Tick loop fell {:.1} ms behind schedule, resynchronizing",
                now.duration_since(self.next_deadline).as_secs_f64() * 1000.0
            );
            self.next_deadline = now + self.period;
            self.resyncs += 1;
        }

        self.delta_time
    }

    /// Seconds measured for the last tick
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Total measured time since the timer was created
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of ticks advanced so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of times the schedule had to be re-anchored
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Average ticks per second since creation
    pub fn average_tps(&self) -> f64 {
        if self.total_time > 0.0 {
            self.tick_count as f64 / self.total_time
        } else {
            0.0
        }
    }
}
