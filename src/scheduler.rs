//! Read windows derived from the duty cycle.
//!
//! With a duty cycle of `n` minutes the sensor measures for 30 seconds and
//! sleeps for the rest of the period, so silence on the line is expected for
//! up to `n` minutes. The window adds a fixed drift margin on top of that.

use crate::constants::DUTY_CYCLE_DRIFT_PERCENT;
use crate::types::DutyCycle;
use std::time::{Duration, Instant};

/// Length of the read window for a duty cycle, in seconds
pub fn duty_cycle_timeout(duty_cycle: u8) -> f64 {
    let period = 60.0 * f64::from(duty_cycle);
    period + DUTY_CYCLE_DRIFT_PERCENT / 100.0 * period
}

/// Start and length of the current read window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycleWindow {
    pub start: Instant,
    pub timeout: Duration,
}

/// Source of the current time
pub type Clock = fn() -> Instant;

#[derive(Debug, Clone)]
pub struct DutyCycleScheduler {
    duty_cycle: DutyCycle,
    window: DutyCycleWindow,
    clock: Clock,
}

impl DutyCycleScheduler {
    pub fn new(duty_cycle: DutyCycle) -> Self {
        Self::with_clock(duty_cycle, Instant::now)
    }

    /// Scheduler reading the time from `clock`; the window starts now
    pub fn with_clock(duty_cycle: DutyCycle, clock: Clock) -> Self {
        let mut scheduler = Self::starting_at(duty_cycle, clock());
        scheduler.clock = clock;
        scheduler
    }

    pub fn starting_at(duty_cycle: DutyCycle, start: Instant) -> Self {
        DutyCycleScheduler {
            duty_cycle,
            window: DutyCycleWindow {
                start,
                timeout: Duration::from_secs_f64(duty_cycle_timeout(duty_cycle.minutes())),
            },
            clock: Instant::now,
        }
    }

    /// Switch to another duty cycle; the window restarts now
    pub fn set_duty_cycle(&mut self, duty_cycle: DutyCycle) {
        *self = Self::with_clock(duty_cycle, self.clock);
        log::debug!(
            "Duty cycle {} gives a read timeout of {:?}",
            duty_cycle,
            self.window.timeout
        );
    }

    /// Read the time from `clock` from now on; the window restarts
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
        self.restart();
    }

    pub fn now(&self) -> Instant {
        (self.clock)()
    }

    pub fn restart(&mut self) {
        self.restart_at(self.now());
    }

    pub fn restart_at(&mut self, start: Instant) {
        self.window.start = start;
    }

    pub fn duty_cycle(&self) -> DutyCycle {
        self.duty_cycle
    }

    pub fn window(&self) -> DutyCycleWindow {
        self.window
    }

    pub fn is_continuous(&self) -> bool {
        self.duty_cycle.is_continuous()
    }

    /// Whether a read may still be attempted at `now`
    pub fn is_open_at(&self, now: Instant) -> bool {
        if self.is_continuous() {
            return true;
        }
        now >= self.window.start && now < self.window.start + self.window.timeout
    }

    pub fn is_open(&self) -> bool {
        self.is_open_at(self.now())
    }
}
