use crate::constants::MAX_DUTY_CYCLE;
use crate::error::Sds011Error;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commands understood by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ReportMode,
    Request,
    DeviceId,
    WorkState,
    Firmware,
    DutyCycle,
}

impl Command {
    /// Wire code of the command
    pub fn code(self) -> u8 {
        match self {
            Command::ReportMode => 0x02,
            Command::Request => 0x04,
            Command::DeviceId => 0x05,
            Command::WorkState => 0x06,
            Command::Firmware => 0x07,
            Command::DutyCycle => 0x08,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x02 => Some(Command::ReportMode),
            0x04 => Some(Command::Request),
            0x05 => Some(Command::DeviceId),
            0x06 => Some(Command::WorkState),
            0x07 => Some(Command::Firmware),
            0x08 => Some(Command::DutyCycle),
            _ => None,
        }
    }
}

/// Whether a command reads or writes a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    Getting,
    Setting,
}

impl CommandMode {
    pub fn code(self) -> u8 {
        match self {
            CommandMode::Getting => 0x00,
            CommandMode::Setting => 0x01,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(CommandMode::Getting),
            0x01 => Some(CommandMode::Setting),
            _ => None,
        }
    }
}

/// Device power state. A sleeping sensor has its fan off and stays silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkState {
    Sleeping,
    Measuring,
}

impl WorkState {
    pub fn code(self) -> u8 {
        match self {
            WorkState::Sleeping => 0x00,
            WorkState::Measuring => 0x01,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, Sds011Error> {
        match code {
            0x00 => Ok(WorkState::Sleeping),
            0x01 => Ok(WorkState::Measuring),
            other => Err(Sds011Error::Format(format!(
                "unknown work state value {:#04x}",
                other
            ))),
        }
    }
}

/// Report mode of the sensor.
///
/// In `Initiative` mode the sensor pushes reports on its own, in `Passive`
/// mode it only answers explicit requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportMode {
    Initiative,
    Passive,
}

impl ReportMode {
    pub fn code(self) -> u8 {
        match self {
            ReportMode::Initiative => 0x00,
            ReportMode::Passive => 0x01,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, Sds011Error> {
        match code {
            0x00 => Ok(ReportMode::Initiative),
            0x01 => Ok(ReportMode::Passive),
            other => Err(Sds011Error::Format(format!(
                "unknown report mode value {:#04x}",
                other
            ))),
        }
    }
}

/// Unit of the values returned by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
    /// µg/m³, as reported by the firmware
    #[default]
    MassConcentration,
    /// particles per 0.01 cubic foot
    ParticleConcentration,
}

/// Particle size class reported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pollutant {
    Pm25,
    Pm10,
}

impl FromStr for Pollutant {
    type Err = Sds011Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pm2.5" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            _ => Err(Sds011Error::Configuration(format!(
                "unknown pollutant \"{}\", expected \"pm2.5\" or \"pm10\"",
                s
            ))),
        }
    }
}

/// Two-byte identifier unique to a physical sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub [u8; 2]);

impl DeviceId {
    pub fn new(high: u8, low: u8) -> Self {
        DeviceId([high, low])
    }

    pub fn bytes(&self) -> [u8; 2] {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.0[0], self.0[1])
    }
}

/// Firmware version, encoded by the manufacturer as a YY-MM-DD date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

impl Firmware {
    /// Release date of the firmware, `None` when the bytes are not a valid date
    pub fn release_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// Minutes between two measurement bursts; 0 means continuous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u8")]
pub struct DutyCycle(u8);

impl DutyCycle {
    pub const CONTINUOUS: DutyCycle = DutyCycle(0);

    pub fn minutes(self) -> u8 {
        self.0
    }

    pub fn is_continuous(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i32> for DutyCycle {
    type Error = Sds011Error;

    fn try_from(minutes: i32) -> Result<Self, Self::Error> {
        if (0..=i32::from(MAX_DUTY_CYCLE)).contains(&minutes) {
            Ok(DutyCycle(minutes as u8))
        } else {
            Err(Sds011Error::Configuration(format!(
                "duty cycle has to be between 0 and {} inclusive, got {}",
                MAX_DUTY_CYCLE, minutes
            )))
        }
    }
}

impl TryFrom<u8> for DutyCycle {
    type Error = Sds011Error;

    fn try_from(minutes: u8) -> Result<Self, Self::Error> {
        DutyCycle::try_from(i32::from(minutes))
    }
}

impl From<DutyCycle> for u8 {
    fn from(duty_cycle: DutyCycle) -> u8 {
        duty_cycle.0
    }
}

impl fmt::Display for DutyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

/// One PM2.5 / PM10 reading, in the session's unit of measure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub pm25: f64,
    pub pm10: f64,
}
