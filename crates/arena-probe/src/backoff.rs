//! Exponential backoff between probe attempts.

use std::time::Duration;

use arena_core::ProbeConfig;

/// Produces the delay before each retry: starts at the initial
/// interval and scales by the multiplier, capped at the maximum
/// per-attempt interval. The overall elapsed-time bound is enforced
/// by the prober, not here.
#[derive(Debug)]
pub(crate) struct Backoff {
    next: Duration,
    multiplier: f64,
    max: Duration,
}

impl Backoff {
    pub(crate) fn new(config: &ProbeConfig) -> Self {
        Self {
            next: config.initial_interval,
            multiplier: config.multiplier,
            max: config.max_interval,
        }
    }

    /// Current delay; advances the schedule for the next call.
    pub(crate) fn advance(&mut self) -> Duration {
        let current = self.next;
        self.next = self.next.mul_f64(self.multiplier).min(self.max);
        current
    }
}
