use log::info;
use relay_interlock::{Action, Channel, Clock, InterlockStatus, RelayDriver, RelayInterlock};

use crate::command::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ack,
    /// Demand recorded; the control tick keeps retrying it.
    Deferred(Channel),
    Status {
        status: InterlockStatus,
        demand: Option<Channel>,
    },
    Quit,
}

/// Application side of the interlock: holds the operator's demand and keeps
/// re-requesting it, since the interlock never retries on its own.
pub struct RelayApp<D, C> {
    interlock: RelayInterlock<D, C>,
    demand: Option<Channel>,
    last_action: Option<Action>,
}

impl<D: RelayDriver, C: Clock> RelayApp<D, C> {
    pub fn new(interlock: RelayInterlock<D, C>) -> Self {
        Self {
            interlock,
            demand: None,
            last_action: None,
        }
    }

    pub fn interlock(&self) -> &RelayInterlock<D, C> {
        &self.interlock
    }

    pub fn apply(&mut self, command: Command) -> Reply {
        let reply = match command {
            Command::Demand(channel) => {
                self.demand = Some(channel);
                if self.interlock.turn_on(channel) {
                    Reply::Ack
                } else {
                    Reply::Deferred(channel)
                }
            }
            Command::Off(None) => {
                self.demand = None;
                self.interlock.turn_all_off();
                Reply::Ack
            }
            Command::Off(Some(channel)) => {
                // Stopping the fan under AC stops the AC as well.
                let releases_demand = self.demand == Some(channel)
                    || (channel == Channel::Fan && self.demand == Some(Channel::Ac));
                if releases_demand {
                    self.demand = None;
                }
                self.interlock.turn_off(channel);
                Reply::Ack
            }
            Command::Status => Reply::Status {
                status: self.interlock.status(),
                demand: self.demand,
            },
            Command::Debug(enable) => {
                self.interlock.set_debug_logging(enable);
                info!("relay debug logging {}", if enable { "on" } else { "off" });
                Reply::Ack
            }
            Command::Quit => Reply::Quit,
        };
        self.note_action();
        reply
    }

    /// Called once per control period.
    pub fn tick(&mut self) {
        if let Some(channel) = self.demand {
            if !self.interlock.is_on(channel) && self.interlock.turn_on(channel) {
                info!("demand for {channel} engaged");
            }
        }
        self.note_action();
    }

    pub fn shutdown(&mut self) {
        self.demand = None;
        self.interlock.turn_all_off();
        self.note_action();
    }

    fn note_action(&mut self) {
        let action = self.interlock.current_action();
        if self.last_action == Some(action) {
            return;
        }
        self.last_action = Some(action);

        if action == Action::Wait {
            info!(
                "current action: {action} ({}s left)",
                self.interlock.waiting_secs_left()
            );
        } else {
            info!("current action: {action}");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use relay_interlock::{InterlockConfig, ManualClock, SimRelayBoard};

    use super::*;

    fn app() -> (RelayApp<SimRelayBoard, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let interlock =
            RelayInterlock::new(InterlockConfig::default(), SimRelayBoard::new(), clock.clone())
                .unwrap();
        (RelayApp::new(interlock), clock)
    }

    #[test]
    fn demand_during_startup_engages_after_wait() {
        let (mut app, clock) = app();

        assert_eq!(
            app.apply(Command::Demand(Channel::Heat)),
            Reply::Deferred(Channel::Heat)
        );
        app.tick();
        assert!(!app.interlock().is_on(Channel::Heat));

        clock.advance(60_000);
        app.tick();
        assert!(app.interlock().is_on(Channel::Heat));
        assert_eq!(app.demand, Some(Channel::Heat));
    }

    #[test]
    fn switching_modes_waits_out_the_cooldown() {
        let (mut app, clock) = app();
        clock.advance(60_000);
        assert_eq!(app.apply(Command::Demand(Channel::Ac)), Reply::Ack);

        assert_eq!(
            app.apply(Command::Demand(Channel::Heat)),
            Reply::Deferred(Channel::Heat)
        );
        assert!(!app.interlock().is_on(Channel::Ac));
        assert!(!app.interlock().is_on(Channel::Fan));

        clock.advance(299_000);
        app.tick();
        assert!(!app.interlock().is_on(Channel::Heat));

        clock.advance(1_000);
        app.tick();
        assert!(app.interlock().is_on(Channel::Heat));
    }

    #[test]
    fn stopping_fan_drops_ac_demand() {
        let (mut app, clock) = app();
        clock.advance(60_000);
        app.apply(Command::Demand(Channel::Ac));

        app.apply(Command::Off(Some(Channel::Fan)));
        assert_eq!(app.demand, None);
        assert!(!app.interlock().is_on(Channel::Ac));

        clock.advance(300_000);
        app.tick();
        assert!(!app.interlock().is_on(Channel::Ac));
    }

    #[test]
    fn off_other_channel_keeps_demand() {
        let (mut app, clock) = app();
        app.apply(Command::Demand(Channel::Fan));
        app.apply(Command::Off(Some(Channel::Heat)));
        assert_eq!(app.demand, Some(Channel::Fan));

        clock.advance(60_000);
        app.tick();
        assert!(app.interlock().is_on(Channel::Fan));
    }

    #[test]
    fn off_releases_everything() {
        let (mut app, clock) = app();
        clock.advance(60_000);
        app.apply(Command::Demand(Channel::Heat));

        assert_eq!(app.apply(Command::Off(None)), Reply::Ack);
        assert_eq!(app.demand, None);
        assert!(!app.interlock().is_on(Channel::Heat));
        assert_eq!(app.interlock().current_action(), Action::Wait);
    }

    #[test]
    fn status_and_debug_replies() {
        let (mut app, _clock) = app();

        assert_eq!(app.apply(Command::Debug(true)), Reply::Ack);
        app.apply(Command::Demand(Channel::Fan));
        let Reply::Status { status, demand } = app.apply(Command::Status) else {
            panic!("expected status reply");
        };
        assert_eq!(demand, Some(Channel::Fan));
        assert!(status.debug_logging);
        assert_eq!(status.action, Action::Wait);
        assert_eq!(status.wait_remaining_sec, 60);

        assert_eq!(app.apply(Command::Quit), Reply::Quit);
    }

    #[test]
    fn shutdown_turns_everything_off() {
        let (mut app, clock) = app();
        clock.advance(60_000);
        app.apply(Command::Demand(Channel::Ac));

        app.shutdown();

        assert_eq!(app.demand, None);
        for channel in Channel::ALL {
            assert!(!app.interlock().is_on(channel));
        }
    }
}
