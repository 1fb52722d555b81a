//! Frame encoding and decoding.
//!
//! Command frames are 19 bytes long:
//!
//! ```text
//! AA B4 cmd submode value 00 00 00 00 00 00 00 00 00 00 FF FF checksum AB
//! ```
//!
//! Response frames are 10 bytes long:
//!
//! ```text
//! AA C5|C0 d0 d1 d2 d3 id1 id2 checksum AB
//! ```
//!
//! Both checksums are the low byte of the sum of everything between the
//! type marker and the checksum byte.

use crate::constants::*;
use crate::error::{Result, Sds011Error};
use crate::types::{Command, CommandMode, DeviceId, Firmware};

/// Checksum of a frame without its checksum byte and tail.
///
/// Only buffers of exactly `COMMAND_LENGTH - 2` or `RESPONSE_LENGTH - 2`
/// bytes starting with the head marker are accepted, so a partially read
/// frame can never pass as valid.
pub fn checksum(data: &[u8]) -> Result<u8> {
    if data.len() != COMMAND_LENGTH - 2 && data.len() != RESPONSE_LENGTH - 2 {
        return Err(Sds011Error::Format(format!(
            "checksum input has to be {} or {} bytes, got {}",
            COMMAND_LENGTH - 2,
            RESPONSE_LENGTH - 2,
            data.len()
        )));
    }
    if data[0] != HEAD {
        return Err(Sds011Error::Format(format!(
            "frame starts with {:#04x} instead of {:#04x}",
            data[0], HEAD
        )));
    }

    Ok(data[CHECKSUM_START..]
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b)))
}

/// A command frame sent to the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub command: Command,
    pub mode: CommandMode,
    pub value: u8,
}

impl CommandFrame {
    pub fn new(command: Command, mode: CommandMode, value: u8) -> Self {
        CommandFrame {
            command,
            mode,
            value,
        }
    }

    /// Query the current value of a setting
    pub fn get(command: Command) -> Self {
        Self::new(command, CommandMode::Getting, 0)
    }

    /// Change a setting
    pub fn set(command: Command, value: u8) -> Self {
        Self::new(command, CommandMode::Setting, value)
    }

    /// Ask for a measurement; the request carries no sub-mode nor value
    pub fn request() -> Self {
        Self::new(Command::Request, CommandMode::Getting, 0)
    }

    /// Serialize into a wire frame
    pub fn encode(&self) -> [u8; COMMAND_LENGTH] {
        let mut frame = [0u8; COMMAND_LENGTH];
        frame[0] = HEAD;
        frame[1] = SEND_MARKER;
        frame[2] = self.command.code();
        if self.command != Command::Request {
            frame[3] = self.mode.code();
            frame[4] = self.value;
        }
        // frame[5..15] stays zero padding
        frame[3 + COMMAND_PAYLOAD_LENGTH] = COMMAND_TERMINATOR;
        frame[4 + COMMAND_PAYLOAD_LENGTH] = COMMAND_TERMINATOR;
        frame[COMMAND_LENGTH - 2] = frame[CHECKSUM_START..COMMAND_LENGTH - 2]
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_add(b));
        frame[COMMAND_LENGTH - 1] = TAIL;
        frame
    }

    /// Parse a wire frame produced by [`CommandFrame::encode`]
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() != COMMAND_LENGTH {
            return Err(Sds011Error::Format(format!(
                "command frame has to be {} bytes, got {}",
                COMMAND_LENGTH,
                frame.len()
            )));
        }
        if frame[1] != SEND_MARKER || frame[COMMAND_LENGTH - 1] != TAIL {
            return Err(Sds011Error::Format(format!(
                "not a command frame: {:02X?}",
                frame
            )));
        }

        let computed = checksum(&frame[..COMMAND_LENGTH - 2])?;
        let received = frame[COMMAND_LENGTH - 2];
        if computed != received {
            return Err(Sds011Error::Checksum { computed, received });
        }

        let command = Command::from_code(frame[2])
            .ok_or_else(|| Sds011Error::Format(format!("unknown command {:#04x}", frame[2])))?;
        let mode = CommandMode::from_code(frame[3])
            .ok_or_else(|| Sds011Error::Format(format!("unknown sub-mode {:#04x}", frame[3])))?;

        Ok(CommandFrame {
            command,
            mode,
            value: frame[4],
        })
    }
}

/// A validated response frame received from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    frame: [u8; RESPONSE_LENGTH],
}

impl Response {
    /// Validate length, markers and checksum of a received frame
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() != RESPONSE_LENGTH {
            return Err(Sds011Error::Format(format!(
                "response frame has to be {} bytes, got {}",
                RESPONSE_LENGTH,
                frame.len()
            )));
        }
        if frame[1] != REPLY_MARKER && frame[1] != REPORT_MARKER {
            return Err(Sds011Error::Format(format!(
                "unknown type marker {:#04x}",
                frame[1]
            )));
        }
        if frame[RESPONSE_LENGTH - 1] != TAIL {
            return Err(Sds011Error::Format(format!(
                "frame ends with {:#04x} instead of {:#04x}",
                frame[RESPONSE_LENGTH - 1],
                TAIL
            )));
        }

        let computed = checksum(&frame[..RESPONSE_LENGTH - 2])?;
        let received = frame[RESPONSE_LENGTH - 2];
        if computed != received {
            return Err(Sds011Error::Checksum { computed, received });
        }

        let mut bytes = [0u8; RESPONSE_LENGTH];
        bytes.copy_from_slice(frame);
        Ok(Response { frame: bytes })
    }

    pub fn marker(&self) -> u8 {
        self.frame[1]
    }

    /// Whether this is a data report rather than a command echo
    pub fn is_report(&self) -> bool {
        self.frame[1] == REPORT_MARKER
    }

    /// Command code echoed by a reply
    pub fn echoed_code(&self) -> u8 {
        self.frame[2]
    }

    pub fn device_id(&self) -> DeviceId {
        DeviceId::new(
            self.frame[DEVICE_ID_OFFSET],
            self.frame[DEVICE_ID_OFFSET + 1],
        )
    }

    /// Bytes between the marker/echo region and the checksum
    pub fn payload(&self) -> &[u8] {
        let start = if self.is_report() { 2 } else { 3 };
        &self.frame[start..RESPONSE_LENGTH - 2]
    }

    /// Sub-mode echoed by a report mode, work state or duty cycle reply
    pub fn sub_mode(&self) -> Option<CommandMode> {
        CommandMode::from_code(self.frame[3])
    }

    /// Setting value carried by a report mode, work state or duty cycle reply
    pub fn value(&self) -> u8 {
        self.frame[4]
    }

    /// Firmware version carried by a firmware reply
    pub fn firmware(&self) -> Firmware {
        Firmware {
            year: self.frame[3],
            month: self.frame[4],
            day: self.frame[5],
        }
    }

    /// PM2.5 low/high and PM10 low/high bytes of a data report
    pub fn pm_bytes(&self) -> [u8; 4] {
        [self.frame[2], self.frame[3], self.frame[4], self.frame[5]]
    }
}
