//! Passive Polling Example
//!
//! Keeps the sensor asleep between polls to spare the laser and fan:
//! wake up, let the airflow settle, request a measurement, sleep again.
//! Readings are printed as JSON lines, in particle counts if asked to.
//!
//! Usage:
//!   cargo run --example passive_polling -- /dev/ttyUSB0
//!   cargo run --example passive_polling -- /dev/ttyUSB0 particles

use log::{error, info};
use sds011_protocol::{ReportMode, Result, Sds011, SessionConfig, UnitOfMeasure, WorkState};
use std::thread;
use std::time::Duration;

const WARM_UP: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(300);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let port_name = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let unit = match args.next().as_deref() {
        Some("particles") => UnitOfMeasure::ParticleConcentration,
        _ => UnitOfMeasure::MassConcentration,
    };

    let config = SessionConfig::new(port_name).unit_of_measure(unit);
    let mut sensor = Sds011::open_with(&config)?;
    sensor.set_report_mode(ReportMode::Passive)?;

    loop {
        sensor.set_work_state(WorkState::Measuring)?;
        info!("Warming up for {:?}", WARM_UP);
        thread::sleep(WARM_UP);

        match sensor.request_measurement() {
            Ok(measurement) => match serde_json::to_string(&measurement) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Could not serialize measurement: {}", e),
            },
            Err(e) => error!("Request failed: {}", e),
        }

        sensor.set_work_state(WorkState::Sleeping)?;
        thread::sleep(POLL_INTERVAL);
    }
}
