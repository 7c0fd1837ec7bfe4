use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterlockError {
    #[error("relay pins must be distinct (heat={heat}, ac={ac}, fan={fan})")]
    DuplicatePin { heat: u8, ac: u8, fan: u8 },
    #[error("failed to configure relay output on pin {pin}: {message}")]
    OutputSetup { pin: u8, message: String },
}
