//! Hardware seams for the interlock: relay output lines and a monotonic clock.

use std::{
    fmt::Display,
    thread,
    time::{Duration, Instant},
};

use crate::types::PinLevel;

pub trait RelayDriver {
    type Error: Display;

    /// Must latch `initial` before enabling the output stage.
    fn configure_output(&mut self, pin: u8, initial: PinLevel) -> Result<(), Self::Error>;

    fn write(&mut self, pin: u8, level: PinLevel) -> Result<(), Self::Error>;
}

pub trait Clock {
    /// Monotonic.
    fn now_ms(&self) -> u64;

    fn delay_ms(&mut self, ms: u64);
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }

    fn delay_ms(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}
