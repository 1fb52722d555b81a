//! Error types for SDS011 protocol operations.

use crate::types::DeviceId;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for SDS011 operations.
pub type Result<T> = std::result::Result<T, Sds011Error>;

/// Error types for SDS011 sensor communication.
#[derive(Error, Debug)]
pub enum Sds011Error {
    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// Transport failure: short write, silent sensor or an aborted read
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Caller supplied a value outside its domain
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Buffer length or framing does not match the frame kind
    #[error("Malformed frame: {0}")]
    Format(String),

    /// Computed checksum differs from the transmitted one
    #[error("Checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
    Checksum {
        /// Checksum computed over the received bytes
        computed: u8,
        /// Checksum byte carried by the frame
        received: u8,
    },

    /// Reply echoes a different command than the one sent
    #[error("Reply echoes command {echoed:#04x}, expected {sent:#04x}")]
    EchoMismatch {
        /// Code of the command that was sent
        sent: u8,
        /// Code found in the reply
        echoed: u8,
    },

    /// Frame carries another device identifier than the bound one
    #[error("Frame from device {received} does not belong to device {bound}")]
    IdentityMismatch {
        /// Identifier bound on the first frame of the session
        bound: DeviceId,
        /// Identifier carried by the offending frame
        received: DeviceId,
    },

    /// Operation invalid for the current work state or report mode
    #[error("Invalid sensor state: {0}")]
    State(&'static str),

    /// Duty cycle window elapsed without data
    #[error("No data received within {}s", .waited.as_secs_f64())]
    Timeout {
        /// Length of the window that elapsed
        waited: Duration,
    },
}

impl Sds011Error {
    /// Whether the error originates from the underlying link
    pub fn is_transport(&self) -> bool {
        matches!(self, Sds011Error::Transport(_) | Sds011Error::SerialPort(_))
    }
}
