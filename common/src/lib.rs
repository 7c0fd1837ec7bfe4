pub mod config;
pub mod error;
pub mod hal;
pub mod interlock;
pub mod sim;
pub mod types;

pub use config::{InterlockConfig, RelayPins, RuntimeConfig};
pub use error::InterlockError;
pub use hal::{Clock, RelayDriver, SystemClock};
pub use interlock::{RelayDiagnostics, RelayInterlock};
pub use sim::{ManualClock, SimRelayBoard};
pub use types::{Action, Channel, ChannelStatus, InterlockStatus, PinLevel};
