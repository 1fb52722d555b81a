use crate::codec::{CommandFrame, Response};
use crate::config::SessionConfig;
use crate::constants::*;
use crate::error::{Result, Sds011Error};
use crate::measurement;
use crate::scheduler::{Clock, DutyCycleScheduler, DutyCycleWindow};
use crate::state::ConfigurationState;
use crate::types::*;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Protocol session with one SDS011 sensor.
///
/// The session owns the transport for its whole lifetime. Every exchange
/// takes `&mut self`, so exchanges can never overlap; share a session between
/// threads behind a mutex. Dropping the session, or calling
/// [`Sds011::close`], releases the transport.
pub struct Sds011<T> {
    port: T,
    timeout: Duration,
    state: ConfigurationState,
    scheduler: DutyCycleScheduler,
}

impl Sds011<Box<dyn SerialPort>> {
    /// Open the serial port at `port_name` and start a session
    pub fn open(port_name: &str, timeout: Duration, unit: UnitOfMeasure) -> Result<Self> {
        let config = SessionConfig::new(port_name)
            .timeout(timeout)
            .unit_of_measure(unit);
        Self::open_with(&config)
    }

    pub fn open_with(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        log::info!("Opening SDS011 on {}", config.port);

        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.read_timeout())
            .open()?;

        Self::with_timeout(port, config.read_timeout(), config.unit_of_measure)
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl<T> Sds011<T>
where
    T: Read + Write,
{
    /// Start a session over an already opened transport.
    ///
    /// The transport is expected to time out its reads after
    /// [`TIMEOUT_MS`] milliseconds, either with `Ok(0)` or with a
    /// `TimedOut` / `WouldBlock` error.
    pub fn new(port: T, unit: UnitOfMeasure) -> Result<Self> {
        Self::with_timeout(port, Duration::from_millis(TIMEOUT_MS), unit)
    }

    /// Start a session over a transport whose read timeout is `timeout`.
    ///
    /// Listens for an unsolicited report first. A silent sensor is woken up
    /// and switched to continuous operation, then the duty cycle, report mode
    /// and firmware are queried.
    pub fn with_timeout(port: T, timeout: Duration, unit: UnitOfMeasure) -> Result<Self> {
        let mut sensor = Sds011 {
            port,
            timeout,
            state: ConfigurationState::new(unit),
            scheduler: DutyCycleScheduler::new(DutyCycle::CONTINUOUS),
        };

        if sensor.receive(None)?.is_none() {
            log::warn!(
                "Sensor is not responding. Maybe sleeping, in passive mode or in a duty cycle? \
                 Waking it up."
            );
            sensor.exchange(CommandFrame::set(
                Command::WorkState,
                WorkState::Measuring.code(),
            ))?;
            sensor.exchange(CommandFrame::set(
                Command::DutyCycle,
                DutyCycle::CONTINUOUS.minutes(),
            ))?;
        }
        sensor.state.work_state = WorkState::Measuring;
        sensor.load_configuration()?;

        log::info!(
            "SDS011 firmware: {}",
            sensor.state.firmware.map(|f| f.to_string()).unwrap_or_default()
        );
        log::info!("SDS011 report mode: {:?}", sensor.state.report_mode);
        log::info!("SDS011 work state: {:?}", sensor.state.work_state);
        log::info!("SDS011 duty cycle: {}", sensor.state.duty_cycle);
        if let Some(id) = sensor.state.device_id {
            log::info!("SDS011 device id: {}", id);
        }
        Ok(sensor)
    }

    fn load_configuration(&mut self) -> Result<()> {
        let reply = self.exchange(CommandFrame::get(Command::DutyCycle))?;
        let duty_cycle = DutyCycle::try_from(reply.value()).map_err(|_| {
            Sds011Error::Format(format!("sensor reports duty cycle {}", reply.value()))
        })?;
        self.state.duty_cycle = duty_cycle;
        self.scheduler.set_duty_cycle(duty_cycle);

        let reply = self.exchange(CommandFrame::get(Command::ReportMode))?;
        self.state.report_mode = ReportMode::from_code(reply.value())?;

        let reply = self.exchange(CommandFrame::get(Command::Firmware))?;
        self.state.firmware = Some(reply.firmware());
        Ok(())
    }

    /// Wait for the next unsolicited report.
    ///
    /// Requires a measuring sensor in initiative mode. Silence is tolerated
    /// until the duty cycle window elapses; in continuous mode the sensor
    /// reports every second, so one silent transport timeout is enough to
    /// give up.
    pub fn read_measurement(&mut self) -> Result<Measurement> {
        self.state.ensure_reporting()?;

        self.scheduler.restart();
        loop {
            if let Some(response) = self.receive(None)? {
                let measurement = measurement::extract(&response, self.state.unit_of_measure)?;
                self.scheduler.restart();
                return Ok(measurement);
            }

            if self.scheduler.is_continuous() {
                log::error!(
                    "No report within {:?}. If the sensor is sleeping, wake it up first.",
                    self.timeout
                );
                return Err(Sds011Error::Timeout {
                    waited: self.timeout,
                });
            }
            if !self.scheduler.is_open() {
                return Err(Sds011Error::Timeout {
                    waited: self.scheduler.window().timeout,
                });
            }
            log::info!("No response. Expected while in duty cycle.");
        }
    }

    /// Ask the sensor for a measurement, as needed in passive mode
    pub fn request_measurement(&mut self) -> Result<Measurement> {
        self.state.ensure_awake()?;
        let response = self.exchange(CommandFrame::request())?;
        measurement::extract(&response, self.state.unit_of_measure)
    }

    /// Measuring, initiative mode, continuous operation
    pub fn reset(&mut self) -> Result<()> {
        self.set_work_state(WorkState::Measuring)?;
        self.set_report_mode(ReportMode::Initiative)?;
        self.set_duty_cycle(0)?;
        log::info!("Sensor reset");
        Ok(())
    }

    pub fn set_report_mode(&mut self, mode: ReportMode) -> Result<()> {
        self.exchange(CommandFrame::set(Command::ReportMode, mode.code()))?;
        self.state.report_mode = mode;
        log::info!("Report mode set to {:?}", mode);
        Ok(())
    }

    pub fn set_work_state(&mut self, state: WorkState) -> Result<()> {
        self.exchange(CommandFrame::set(Command::WorkState, state.code()))?;
        self.state.work_state = state;
        log::info!("Work state set to {:?}", state);
        Ok(())
    }

    /// Set the duty cycle in minutes, 0 to 30 inclusive
    pub fn set_duty_cycle(&mut self, minutes: i32) -> Result<()> {
        let duty_cycle = DutyCycle::try_from(minutes)?;
        self.exchange(CommandFrame::set(Command::DutyCycle, duty_cycle.minutes()))?;
        self.state.duty_cycle = duty_cycle;
        self.scheduler.set_duty_cycle(duty_cycle);
        log::info!("Duty cycle set to {}", duty_cycle);
        Ok(())
    }

    pub fn report_mode(&self) -> ReportMode {
        self.state.report_mode
    }

    pub fn work_state(&self) -> WorkState {
        self.state.work_state
    }

    pub fn duty_cycle(&self) -> DutyCycle {
        self.state.duty_cycle
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        self.state.device_id
    }

    pub fn firmware(&self) -> Option<Firmware> {
        self.state.firmware
    }

    pub fn unit_of_measure(&self) -> UnitOfMeasure {
        self.state.unit_of_measure
    }

    /// Read timeout of the transport
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> &ConfigurationState {
        &self.state
    }

    /// Window within which the next report is expected
    pub fn read_window(&self) -> DutyCycleWindow {
        self.scheduler.window()
    }

    /// Take the time for read windows from `clock` instead of the system
    /// clock. The current window restarts.
    pub fn set_clock(&mut self, clock: Clock) {
        self.scheduler.set_clock(clock);
    }

    /// End the session and hand the transport back
    pub fn close(self) -> Result<T> {
        let Sds011 { mut port, .. } = self;
        port.flush()?;
        Ok(port)
    }

    /// Send a command and wait for the frame answering it
    fn exchange(&mut self, frame: CommandFrame) -> Result<Response> {
        log::debug!(
            "Exchange {:?} {:?} value {}",
            frame.command,
            frame.mode,
            frame.value
        );
        self.send(&frame)?;
        self.receive(Some(frame.command))?.ok_or_else(|| {
            Sds011Error::Transport(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("sensor is not responding to {:?}", frame.command),
            ))
        })
    }

    fn send(&mut self, frame: &CommandFrame) -> Result<()> {
        let bytes = frame.encode();
        log::trace!("Sending:  {:02X?}", bytes);

        let written = self.port.write(&bytes)?;
        if written != bytes.len() {
            return Err(Sds011Error::Transport(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {} of {} bytes", written, bytes.len()),
            )));
        }
        self.port.flush()?;
        Ok(())
    }

    /// Receive and validate the next frame for `command`, `None` meaning an
    /// unsolicited report. Returns `Ok(None)` if the line stays silent.
    fn receive(&mut self, command: Option<Command>) -> Result<Option<Response>> {
        let expected = match command {
            None | Some(Command::Request) => REPORT_MARKER,
            Some(_) => REPLY_MARKER,
        };

        let frame = match self.read_frame(expected)? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        log::trace!("Received: {:02X?}", frame);

        if frame.len() != RESPONSE_LENGTH {
            return Err(Sds011Error::Format(format!(
                "partial frame of {} bytes: {:02X?}",
                frame.len(),
                frame
            )));
        }
        if frame[1] != expected {
            return Err(Sds011Error::Format(format!(
                "expected marker {:#04x}, got {:#04x}",
                expected, frame[1]
            )));
        }
        if let Some(command) = command.filter(|c| *c != Command::Request) {
            if frame[2] != command.code() {
                return Err(Sds011Error::EchoMismatch {
                    sent: command.code(),
                    echoed: frame[2],
                });
            }
        }

        let response = Response::decode(&frame)?;
        self.state.check_device_id(response.device_id())?;
        Ok(Some(response))
    }

    /// Drop bytes until a head marker followed by `marker`, then read the
    /// rest of the frame. The frame comes back short if the line goes silent
    /// in the middle of it. A line that keeps talking without ever starting
    /// the expected frame counts as silent after [`MAX_SYNC_BYTES`].
    fn read_frame(&mut self, marker: u8) -> Result<Option<Vec<u8>>> {
        let mut previous = None;
        let mut dropped = 0usize;
        loop {
            let byte = match self.read_byte()? {
                Some(byte) => byte,
                None => return Ok(None),
            };
            if previous == Some(HEAD) && byte == marker {
                break;
            }
            if previous.is_some() {
                dropped += 1;
                if dropped >= MAX_SYNC_BYTES {
                    log::warn!(
                        "No frame start {:#04x} {:#04x} within {} bytes",
                        HEAD,
                        marker,
                        dropped
                    );
                    return Ok(None);
                }
            }
            previous = Some(byte);
        }
        if dropped > 0 {
            log::debug!("Dropped {} bytes before frame start", dropped);
        }

        let mut frame = Vec::with_capacity(RESPONSE_LENGTH);
        frame.push(HEAD);
        frame.push(marker);
        while frame.len() < RESPONSE_LENGTH {
            match self.read_byte()? {
                Some(byte) => frame.push(byte),
                None => break,
            }
        }
        Ok(Some(frame))
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::checksum;
    use std::collections::VecDeque;

    /// Replays canned bytes; an empty chunk is one transport timeout
    struct Script {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Script {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Script {
                chunks: chunks.into(),
                written: Vec::new(),
            }
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let chunk = match self.chunks.front_mut() {
                Some(chunk) => chunk,
                None => return Err(io::ErrorKind::TimedOut.into()),
            };
            if chunk.is_empty() {
                self.chunks.pop_front();
                return Err(io::ErrorKind::TimedOut.into());
            }
            buf[0] = chunk.remove(0);
            if chunk.is_empty() {
                self.chunks.pop_front();
            }
            Ok(1)
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn frame(marker: u8, data: [u8; 4]) -> Vec<u8> {
        let mut frame = vec![HEAD, marker, data[0], data[1], data[2], data[3], 0xCC, 0x0B, 0, TAIL];
        frame[8] = checksum(&frame[..8]).unwrap();
        frame
    }

    fn startup() -> Vec<Vec<u8>> {
        vec![
            frame(REPORT_MARKER, [0x64, 0x00, 0xC8, 0x00]),
            frame(REPLY_MARKER, [0x08, 0x00, 0x00, 0x00]),
            frame(REPLY_MARKER, [0x02, 0x00, 0x00, 0x00]),
            frame(REPLY_MARKER, [0x07, 0x12, 0x0B, 0x10]),
        ]
    }

    #[test]
    fn drops_noise_before_frame() {
        let mut chunks = vec![vec![0x00, 0xAA, 0x13, 0xAB, 0xAA]];
        chunks.extend(startup());
        let sensor = Sds011::new(Script::new(chunks), UnitOfMeasure::MassConcentration).unwrap();
        assert_eq!(sensor.device_id(), Some(DeviceId::new(0xCC, 0x0B)));
        assert_eq!(sensor.firmware().unwrap().to_string(), "181116");
    }

    #[test]
    fn partial_frame_is_format_error() {
        let mut report = frame(REPORT_MARKER, [0x64, 0x00, 0xC8, 0x00]);
        report.truncate(6);
        let result = Sds011::new(
            Script::new(vec![report, vec![]]),
            UnitOfMeasure::MassConcentration,
        );
        assert!(matches!(result, Err(Sds011Error::Format(_))));
    }

    #[test]
    fn close_returns_transport() {
        let sensor = Sds011::new(Script::new(startup()), UnitOfMeasure::MassConcentration).unwrap();
        let port = sensor.close().unwrap();
        assert_eq!(port.written.len(), 3 * COMMAND_LENGTH);
    }
}
