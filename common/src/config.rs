use serde::{Deserialize, Serialize};

use crate::{error::InterlockError, types::Channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayPins {
    pub heat: u8,
    pub ac: u8,
    pub fan: u8,
}

impl Default for RelayPins {
    fn default() -> Self {
        Self {
            heat: 7,
            ac: 8,
            fan: 6,
        }
    }
}

impl RelayPins {
    pub fn pin(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Heat => self.heat,
            Channel::Ac => self.ac,
            Channel::Fan => self.fan,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterlockConfig {
    pub pins: RelayPins,
    /// Relay boards pulled low to energize. Logical ON writes `Low` when set.
    pub active_low: bool,
    pub heat_off_delay_ms: u64,
    pub ac_off_delay_ms: u64,
    pub startup_wait_ms: u64,
    pub fan_settle_ms: u64,
}

const MAX_FAN_SETTLE_MS: u64 = 1_000;

impl Default for InterlockConfig {
    fn default() -> Self {
        Self {
            pins: RelayPins::default(),
            active_low: true,
            heat_off_delay_ms: 120_000,
            ac_off_delay_ms: 300_000,
            startup_wait_ms: 60_000,
            fan_settle_ms: 10,
        }
    }
}

impl InterlockConfig {
    pub fn sanitize(&mut self) {
        self.fan_settle_ms = self.fan_settle_ms.min(MAX_FAN_SETTLE_MS);
    }

    pub fn validate(&self) -> Result<(), InterlockError> {
        let RelayPins { heat, ac, fan } = self.pins;
        if heat == ac || heat == fan || ac == fan {
            return Err(InterlockError::DuplicatePin { heat, ac, fan });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub interlock: InterlockConfig,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

fn default_status_interval_ms() -> u64 {
    10_000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interlock: InterlockConfig::default(),
            debug_logging: false,
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.interlock.sanitize();
        self.status_interval_ms = self.status_interval_ms.clamp(1_000, 600_000);
    }
}
