//! # SDS011 Protocol Library
//!
//! A Rust library for reading Nova SDS011 particulate matter sensors over a
//! serial link. It implements the binary command/response protocol of the
//! sensor and keeps an in-memory mirror of the sensor configuration.
//!
//! ## Features
//!
//! - Encode command frames and validate response frames (markers, checksum)
//! - Correlate replies with commands and guard against frames from another device
//! - Drive work state (sleeping/measuring), report mode (initiative/passive) and duty cycle
//! - Wait for reports across duty cycle pauses without treating expected silence as an error
//! - Report PM2.5 / PM10 in µg/m³ or as particle counts per 0.01 cubic foot
//!
//! ## Example
//!
//! ```no_run
//! use sds011_protocol::{Sds011, UnitOfMeasure};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut sensor = Sds011::open(
//!         "/dev/ttyUSB0",
//!         Duration::from_secs(2),
//!         UnitOfMeasure::MassConcentration,
//!     )?;
//!     sensor.reset()?;
//!     let measurement = sensor.read_measurement()?;
//!     println!("PM2.5: {} µg/m³, PM10: {} µg/m³", measurement.pm25, measurement.pm10);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod measurement;
pub mod protocol;
pub mod scheduler;
pub mod state;
pub mod types;

pub use codec::{CommandFrame, Response};
pub use config::SessionConfig;
pub use error::{Result, Sds011Error};
pub use measurement::mass_to_particles;
pub use protocol::Sds011;
pub use scheduler::{duty_cycle_timeout, Clock, DutyCycleScheduler, DutyCycleWindow};
pub use state::ConfigurationState;
pub use types::*;
