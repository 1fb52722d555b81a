//! Connection settings for a serial-attached sensor.

use crate::constants::{BAUD_RATE, TIMEOUT_MS};
use crate::error::{Result, Sds011Error};
use crate::types::UnitOfMeasure;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings used by [`crate::Sds011::open_with`].
///
/// Every field but `port` has a default, so a deserialized config only needs
/// to name the device path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Transport read timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub unit_of_measure: UnitOfMeasure,
}

fn default_baud_rate() -> u32 {
    BAUD_RATE
}

fn default_timeout_ms() -> u64 {
    TIMEOUT_MS
}

impl SessionConfig {
    pub fn new(port: impl Into<String>) -> Self {
        SessionConfig {
            port: port.into(),
            baud_rate: BAUD_RATE,
            timeout_ms: TIMEOUT_MS,
            unit_of_measure: UnitOfMeasure::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn unit_of_measure(mut self, unit: UnitOfMeasure) -> Self {
        self.unit_of_measure = unit;
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(Sds011Error::Configuration("port must not be empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(Sds011Error::Configuration("baud rate must be positive".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(Sds011Error::Configuration(
                "read timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sensor_link() {
        let config = SessionConfig::new("/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
        assert_eq!(config.unit_of_measure, UnitOfMeasure::MassConcentration);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::new("COM3")
            .timeout(Duration::from_millis(500))
            .unit_of_measure(UnitOfMeasure::ParticleConcentration)
            .baud_rate(19200);
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.unit_of_measure, UnitOfMeasure::ParticleConcentration);
    }

    #[test]
    fn rejects_unusable_settings() {
        assert!(matches!(
            SessionConfig::new(" ").validate(),
            Err(Sds011Error::Configuration(_))
        ));
        assert!(matches!(
            SessionConfig::new("/dev/ttyAMA0")
                .timeout(Duration::ZERO)
                .validate(),
            Err(Sds011Error::Configuration(_))
        ));
        assert!(matches!(
            SessionConfig::new("/dev/ttyAMA0").baud_rate(0).validate(),
            Err(Sds011Error::Configuration(_))
        ));
    }
}
