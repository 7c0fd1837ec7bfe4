//! In-memory relay board and clock for host builds and tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::debug;
use thiserror::Error;

use crate::{
    hal::{Clock, RelayDriver},
    types::PinLevel,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("pin {0} is not configured as an output")]
    NotOutput(u8),
    #[error("simulated write failure on pin {0}")]
    WriteFailed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Level(u8, PinLevel),
    Output(u8),
}

#[derive(Debug, Default)]
pub struct SimRelayBoard {
    levels: HashMap<u8, PinLevel>,
    outputs: HashSet<u8>,
    failing: HashSet<u8>,
    events: Vec<SimEvent>,
}

impl SimRelayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> Option<PinLevel> {
        self.levels.get(&pin).copied()
    }

    pub fn is_output(&self, pin: u8) -> bool {
        self.outputs.contains(&pin)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Make every subsequent write to `pin` fail until [`Self::restore`] is called.
    pub fn fail_writes(&mut self, pin: u8) {
        self.failing.insert(pin);
    }

    pub fn restore(&mut self, pin: u8) {
        self.failing.remove(&pin);
    }

    fn set_level(&mut self, pin: u8, level: PinLevel) -> Result<(), SimError> {
        if self.failing.contains(&pin) {
            return Err(SimError::WriteFailed(pin));
        }
        debug!("sim relay pin {pin} -> {level:?}");
        self.levels.insert(pin, level);
        self.events.push(SimEvent::Level(pin, level));
        Ok(())
    }
}

impl RelayDriver for SimRelayBoard {
    type Error = SimError;

    fn configure_output(&mut self, pin: u8, initial: PinLevel) -> Result<(), SimError> {
        self.set_level(pin, initial)?;
        self.outputs.insert(pin);
        self.events.push(SimEvent::Output(pin));
        Ok(())
    }

    fn write(&mut self, pin: u8, level: PinLevel) -> Result<(), SimError> {
        if !self.is_output(pin) {
            return Err(SimError::NotOutput(pin));
        }
        self.set_level(pin, level)
    }
}

/// Clock advanced explicitly. Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
    }
}
