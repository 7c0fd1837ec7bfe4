use log::{info, warn};

use crate::{
    config::InterlockConfig,
    error::InterlockError,
    hal::{Clock, RelayDriver},
    types::{Action, Channel, ChannelStatus, InterlockStatus, PinLevel},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayDiagnostics {
    // Counts failed attempts too.
    pub relay_writes: u64,
    pub failed_writes: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    on: bool,
    last_on_ms: Option<u64>,
}

/// Heat/AC/fan arbiter. Nothing runs in the background; callers retry
/// rejected requests on a later poll.
#[derive(Debug)]
pub struct RelayInterlock<D, C> {
    config: InterlockConfig,
    driver: D,
    clock: C,
    channels: [ChannelState; 3],
    wait_until_ms: u64,
    debug: bool,
    diagnostics: RelayDiagnostics,
}

impl<D: RelayDriver, C: Clock> RelayInterlock<D, C> {
    pub fn new(
        mut config: InterlockConfig,
        mut driver: D,
        clock: C,
    ) -> Result<Self, InterlockError> {
        config.sanitize();
        config.validate()?;

        let inactive = PinLevel::for_state(false, config.active_low);
        for channel in Channel::ALL {
            let pin = config.pins.pin(channel);
            driver
                .configure_output(pin, inactive)
                .map_err(|err| InterlockError::OutputSetup {
                    pin,
                    message: err.to_string(),
                })?;
        }

        let wait_until_ms = clock.now_ms().saturating_add(config.startup_wait_ms);
        Ok(Self {
            config,
            driver,
            clock,
            channels: [ChannelState::default(); 3],
            wait_until_ms,
            debug: false,
            diagnostics: RelayDiagnostics::default(),
        })
    }

    /// Returns `true` if `channel` is on when the call returns.
    pub fn turn_on(&mut self, channel: Channel) -> bool {
        if self.is_on(channel) {
            return true;
        }
        if self.is_waiting() {
            return false;
        }

        match channel {
            Channel::Heat => {
                if self.is_on(Channel::Ac) {
                    self.turn_off(Channel::Ac);
                    return false;
                }
                if self.is_on(Channel::Fan) {
                    self.turn_off(Channel::Fan);
                }
                self.set_relay(Channel::Heat, true)
            }
            Channel::Ac => {
                if self.is_on(Channel::Heat) {
                    self.turn_off(Channel::Heat);
                    return false;
                }
                if !self.set_relay(Channel::Ac, true) {
                    return false;
                }
                // Stagger the inrush of the compressor and blower contactors.
                self.clock.delay_ms(self.config.fan_settle_ms);
                if self.set_relay(Channel::Fan, true) {
                    return true;
                }
                warn!("fan relay failed to engage, backing AC out");
                self.turn_off(Channel::Ac);
                false
            }
            Channel::Fan => self.set_relay(Channel::Fan, true),
        }
    }

    pub fn turn_off(&mut self, channel: Channel) {
        if !self.is_on(channel) {
            return;
        }

        match channel {
            Channel::Heat => {
                self.set_relay(Channel::Heat, false);
                self.start_wait(self.config.heat_off_delay_ms);
            }
            Channel::Ac => {
                self.set_relay(Channel::Ac, false);
                self.set_relay(Channel::Fan, false);
                self.start_wait(self.config.ac_off_delay_ms);
            }
            Channel::Fan => {
                if self.is_on(Channel::Ac) {
                    self.turn_off(Channel::Ac);
                } else {
                    self.set_relay(Channel::Fan, false);
                }
            }
        }
    }

    pub fn turn_all_off(&mut self) {
        self.turn_off(Channel::Heat);
        self.turn_off(Channel::Ac);
        self.turn_off(Channel::Fan);
    }

    pub fn is_on(&self, channel: Channel) -> bool {
        self.channels[channel.index()].on
    }

    pub fn is_waiting(&self) -> bool {
        self.clock.now_ms() < self.wait_until_ms
    }

    pub fn wait_remaining_ms(&self) -> u64 {
        self.wait_until_ms.saturating_sub(self.clock.now_ms())
    }

    pub fn waiting_secs_left(&self) -> u64 {
        self.wait_remaining_ms() / 1_000
    }

    pub fn last_on_ms(&self, channel: Channel) -> Option<u64> {
        self.channels[channel.index()].last_on_ms
    }

    pub fn current_action(&self) -> Action {
        if self.is_waiting() {
            return Action::Wait;
        }
        // Channel::ALL is in priority order.
        Channel::ALL
            .into_iter()
            .find(|&channel| self.is_on(channel))
            .map_or(Action::Off, Action::for_channel)
    }

    pub fn is_action(&self, action: Action) -> bool {
        self.current_action() == action
    }

    pub fn set_debug_logging(&mut self, enable: bool) {
        self.debug = enable;
    }

    pub fn is_debug_logging(&self) -> bool {
        self.debug
    }

    pub fn config(&self) -> &InterlockConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &RelayDiagnostics {
        &self.diagnostics
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn status(&self) -> InterlockStatus {
        let channel_status = |channel: Channel| ChannelStatus {
            on: self.is_on(channel),
            pin: self.config.pins.pin(channel),
            last_on_ms: self.last_on_ms(channel),
        };

        InterlockStatus {
            action: self.current_action(),
            heat: channel_status(Channel::Heat),
            ac: channel_status(Channel::Ac),
            fan: channel_status(Channel::Fan),
            waiting: self.is_waiting(),
            wait_remaining_sec: self.waiting_secs_left(),
            debug_logging: self.debug,
            relay_writes: self.diagnostics.relay_writes,
            failed_writes: self.diagnostics.failed_writes,
            last_error: self.diagnostics.last_error.clone(),
        }
    }

    // A failed ON leaves the channel off. OFF is recorded even if the write fails.
    fn set_relay(&mut self, channel: Channel, on: bool) -> bool {
        if self.channels[channel.index()].on == on {
            return true;
        }

        if self.debug {
            let verb = if on { "Enabling" } else { "Disabling" };
            info!("{verb} {channel}");
        }

        let pin = self.config.pins.pin(channel);
        let level = PinLevel::for_state(on, self.config.active_low);
        self.diagnostics.relay_writes = self.diagnostics.relay_writes.saturating_add(1);

        if let Err(err) = self.driver.write(pin, level) {
            warn!("relay write for {channel} on pin {pin} failed: {err}");
            self.diagnostics.failed_writes = self.diagnostics.failed_writes.saturating_add(1);
            self.diagnostics.last_error = Some(err.to_string());
            if on {
                return false;
            }
        }

        let now_ms = self.clock.now_ms();
        let state = &mut self.channels[channel.index()];
        if on {
            state.last_on_ms = Some(now_ms);
        }
        state.on = on;
        true
    }

    fn start_wait(&mut self, duration_ms: u64) {
        if self.debug {
            info!("Waiting for {} sec", duration_ms / 1_000);
        }
        self.wait_until_ms = self.clock.now_ms().saturating_add(duration_ms);
    }
}
