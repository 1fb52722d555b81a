//! In-memory mirror of the sensor configuration.

use crate::error::{Result, Sds011Error};
use crate::types::{DeviceId, DutyCycle, Firmware, ReportMode, UnitOfMeasure, WorkState};
use serde::{Deserialize, Serialize};

/// Last known configuration of the sensor.
///
/// The firmware persists these settings itself; this struct only tracks what
/// the session last read or successfully wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationState {
    pub work_state: WorkState,
    pub report_mode: ReportMode,
    pub duty_cycle: DutyCycle,
    pub firmware: Option<Firmware>,
    pub device_id: Option<DeviceId>,
    pub unit_of_measure: UnitOfMeasure,
}

impl ConfigurationState {
    /// State before anything was read from the sensor
    pub fn new(unit_of_measure: UnitOfMeasure) -> Self {
        ConfigurationState {
            work_state: WorkState::Measuring,
            report_mode: ReportMode::Initiative,
            duty_cycle: DutyCycle::CONTINUOUS,
            firmware: None,
            device_id: None,
            unit_of_measure,
        }
    }

    /// Bind the identifier on first sight, reject any other one afterwards
    pub fn check_device_id(&mut self, received: DeviceId) -> Result<()> {
        match self.device_id {
            None => {
                log::debug!("Bound to device {}", received);
                self.device_id = Some(received);
                Ok(())
            }
            Some(bound) if bound == received => Ok(()),
            Some(bound) => Err(Sds011Error::IdentityMismatch { bound, received }),
        }
    }

    /// Whether unsolicited reports can be expected
    pub fn ensure_reporting(&self) -> Result<()> {
        self.ensure_awake()?;
        if self.report_mode == ReportMode::Passive {
            return Err(Sds011Error::State("passive mode requires explicit request"));
        }
        Ok(())
    }

    pub fn ensure_awake(&self) -> Result<()> {
        if self.work_state == WorkState::Sleeping {
            return Err(Sds011Error::State("sensor sleeping"));
        }
        Ok(())
    }
}
