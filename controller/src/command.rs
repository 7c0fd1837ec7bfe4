use std::str::FromStr;

use relay_interlock::Channel;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Keep requesting the channel until the interlock accepts it.
    Demand(Channel),
    /// Drop the demand and release one channel, or everything when `None`.
    Off(Option<Channel>),
    Status,
    Debug(bool),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try heat, ac, fan, off, status, debug, quit)")]
    Unknown(String),
    #[error("unknown channel `{0}` (expected heat, ac or fan)")]
    UnknownChannel(String),
    #[error("expected `debug on` or `debug off`")]
    DebugArgument,
    #[error("unexpected argument `{0}`")]
    TrailingArgument(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let lower = line.trim().to_ascii_lowercase();
        let mut words = lower.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(CommandError::TrailingArgument(extra.to_string()));
        }

        let command = match (verb, argument) {
            ("off", None) => Self::Off(None),
            ("off", Some(channel)) => Self::Off(Some(parse_channel(channel)?)),
            ("status", None) => Self::Status,
            ("quit" | "exit", None) => Self::Quit,
            ("debug", Some("on" | "true" | "1")) => Self::Debug(true),
            ("debug", Some("off" | "false" | "0")) => Self::Debug(false),
            ("debug", _) => return Err(CommandError::DebugArgument),
            (verb, None) => match parse_channel(verb) {
                Ok(channel) => Self::Demand(channel),
                Err(_) => return Err(CommandError::Unknown(verb.to_string())),
            },
            (_, Some(extra)) => return Err(CommandError::TrailingArgument(extra.to_string())),
        };
        Ok(command)
    }
}

fn parse_channel(word: &str) -> Result<Channel, CommandError> {
    match word {
        "heat" => Ok(Channel::Heat),
        "ac" | "cool" => Ok(Channel::Ac),
        "fan" => Ok(Channel::Fan),
        other => Err(CommandError::UnknownChannel(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_demands_case_insensitively() {
        assert_eq!("heat".parse::<Command>(), Ok(Command::Demand(Channel::Heat)));
        assert_eq!("  AC ".parse::<Command>(), Ok(Command::Demand(Channel::Ac)));
        assert_eq!("cool".parse::<Command>(), Ok(Command::Demand(Channel::Ac)));
        assert_eq!("Fan".parse::<Command>(), Ok(Command::Demand(Channel::Fan)));
    }

    #[test]
    fn parses_off_variants() {
        assert_eq!("off".parse::<Command>(), Ok(Command::Off(None)));
        assert_eq!("off fan".parse::<Command>(), Ok(Command::Off(Some(Channel::Fan))));
        assert_eq!(
            "off boiler".parse::<Command>(),
            Err(CommandError::UnknownChannel("boiler".to_string()))
        );
    }

    #[test]
    fn parses_debug_and_control_words() {
        assert_eq!("debug on".parse::<Command>(), Ok(Command::Debug(true)));
        assert_eq!("debug 0".parse::<Command>(), Ok(Command::Debug(false)));
        assert_eq!("debug".parse::<Command>(), Err(CommandError::DebugArgument));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "heat now".parse::<Command>(),
            Err(CommandError::TrailingArgument("now".to_string()))
        );
        assert_eq!(
            "off heat now".parse::<Command>(),
            Err(CommandError::TrailingArgument("now".to_string()))
        );
    }
}
