//! Read a few PM2.5 / PM10 values from an SDS011 on a USB serial adapter.
//!
//! The session reads the sensor configuration on start-up, the sensor is then
//! reset to continuous reporting, five reports are printed and the sensor is
//! sent to sleep.
//!
//!   cargo run --example basic_usage                  # pick a USB adapter
//!   cargo run --example basic_usage -- /dev/ttyUSB0
//!   RUST_LOG=trace cargo run --example basic_usage   # raw frames

use inquire::Select;
use log::{error, info};
use sds011_protocol::{Result, Sds011, UnitOfMeasure, WorkState};
use serialport::SerialPortType;
use std::time::Duration;

/// USB vendor id of the CH340 bridge shipped with most SDS011 boards
const CH340_VENDOR_ID: u16 = 0x1a86;

/// Offer the USB serial adapters found on this machine
fn select_port() -> Result<String> {
    let mut adapters: Vec<(String, String)> = Sds011::list_ports()?
        .into_iter()
        .filter_map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) => {
                let hint = if usb.vid == CH340_VENDOR_ID {
                    " (CH340, likely the sensor)"
                } else {
                    ""
                };
                let label = format!(
                    "{}  {:04x}:{:04x} {}{}",
                    port.port_name,
                    usb.vid,
                    usb.pid,
                    usb.product.unwrap_or_default(),
                    hint
                );
                Some((label, port.port_name))
            }
            _ => None,
        })
        .collect();

    if adapters.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no USB serial adapter found, pass the port name as argument",
        )
        .into());
    }
    // CH340 adapters first
    adapters.sort_by_key(|(label, _)| !label.contains("CH340"));

    let labels: Vec<String> = adapters.iter().map(|(label, _)| label.clone()).collect();
    let choice = Select::new("SDS011 adapter:", labels)
        .raw_prompt()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;
    Ok(adapters.swap_remove(choice.index).1)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port_name = std::env::args()
        .nth(1)
        .map(Ok)
        .unwrap_or_else(select_port)?;

    info!("Connecting to SDS011 on {}...", port_name);
    let mut sensor = Sds011::open(
        &port_name,
        Duration::from_secs(2),
        UnitOfMeasure::MassConcentration,
    )?;

    info!("=== Sensor Configuration ===");
    info!("Device id: {}", sensor.device_id().map(|id| id.to_string()).unwrap_or_default());
    if let Some(firmware) = sensor.firmware() {
        info!("Firmware: {} ({:?})", firmware, firmware.release_date());
    }
    info!("Report mode: {:?}", sensor.report_mode());
    info!("Duty cycle: {}", sensor.duty_cycle());

    info!("=== Continuous Readings ===");
    sensor.reset()?;
    for _ in 0..5 {
        match sensor.read_measurement() {
            Ok(m) => info!("PM2.5: {:5.1} µg/m³  PM10: {:5.1} µg/m³", m.pm25, m.pm10),
            Err(e) => error!("Reading failed: {}", e),
        }
    }

    info!("Putting sensor to sleep");
    sensor.set_work_state(WorkState::Sleeping)?;
    sensor.close()?;

    Ok(())
}
