use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Heat,
    Ac,
    Fan,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Heat, Channel::Ac, Channel::Fan];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "HEAT",
            Self::Ac => "AC",
            Self::Fan => "FAN",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Heat => 0,
            Self::Ac => 1,
            Self::Fan => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single user-facing summary of what the relays are doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Off,
    Heat,
    Ac,
    Fan,
    Wait,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Ac => "AC",
            Self::Fan => "FAN",
            Self::Wait => "WAIT",
        }
    }

    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::Heat => Self::Heat,
            Channel::Ac => Self::Ac,
            Channel::Fan => Self::Fan,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    pub fn is_high(self) -> bool {
        self == Self::High
    }

    /// Electrical level that represents `on` for a relay with the given polarity.
    pub fn for_state(on: bool, active_low: bool) -> Self {
        if on != active_low {
            Self::High
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub on: bool,
    pub pin: u8,
    #[serde(rename = "lastOnMs")]
    pub last_on_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterlockStatus {
    pub action: Action,
    pub heat: ChannelStatus,
    pub ac: ChannelStatus,
    pub fan: ChannelStatus,
    pub waiting: bool,
    #[serde(rename = "waitRemainingSec")]
    pub wait_remaining_sec: u64,
    #[serde(rename = "debugLogging")]
    pub debug_logging: bool,
    #[serde(rename = "relayWrites")]
    pub relay_writes: u64,
    #[serde(rename = "failedWrites")]
    pub failed_writes: u64,
    #[serde(rename = "lastError")]
    pub last_error: Option<String>,
}
