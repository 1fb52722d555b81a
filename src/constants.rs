//! Protocol constants for SDS011 serial communication.
//!
//! This module defines the frame markers, frame lengths, serial port
//! configuration and timing parameters of the SDS011 UART protocol.

/// Marks the beginning of every frame
pub const HEAD: u8 = 0xAA;

/// Marks the end of every frame
pub const TAIL: u8 = 0xAB;

/// Type marker of a command frame sent to the sensor
pub const SEND_MARKER: u8 = 0xB4;

/// Type marker of a reply echoing a command
pub const REPLY_MARKER: u8 = 0xC5;

/// Type marker of a data report (unsolicited or answering a request)
pub const REPORT_MARKER: u8 = 0xC0;

/// Filler written in the two bytes preceding the command checksum
pub const COMMAND_TERMINATOR: u8 = 0xFF;

/// Total length of a command frame
pub const COMMAND_LENGTH: usize = 19;

/// Total length of a response frame
pub const RESPONSE_LENGTH: usize = 10;

/// Size of the payload region of a command frame (sub-mode, value, padding)
pub const COMMAND_PAYLOAD_LENGTH: usize = 12;

/// First byte included in a checksum
pub const CHECKSUM_START: usize = 2;

/// Offset of the device identifier inside a response frame
pub const DEVICE_ID_OFFSET: usize = 6;

/// Largest accepted duty cycle in minutes
pub const MAX_DUTY_CYCLE: u8 = 30;

/// Safety margin added to a duty cycle period, in percent
pub const DUTY_CYCLE_DRIFT_PERCENT: f64 = 2.0;

/// Bytes dropped while looking for a frame start before giving up
pub const MAX_SYNC_BYTES: usize = 512;

/// Baud rate (9600 bps, 8N1)
pub const BAUD_RATE: u32 = 9600;

/// Default transport read timeout in milliseconds
pub const TIMEOUT_MS: u64 = 2000;
