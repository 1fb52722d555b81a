//! Scripted serial line shared by the integration tests.

#![allow(dead_code)]

use sds011_protocol::constants::{HEAD, REPLY_MARKER, REPORT_MARKER, TAIL};
use sds011_protocol::{codec, CommandFrame, DeviceId, UnitOfMeasure};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const ID: DeviceId = DeviceId([0xCC, 0x0B]);

thread_local! {
    static EPOCH: Instant = Instant::now();
    static ELAPSED: Cell<Duration> = const { Cell::new(Duration::ZERO) };
}

/// Test clock, advanced only by [`Event::Elapse`] on this thread's lines
pub fn fake_now() -> Instant {
    EPOCH.with(|epoch| *epoch) + ELAPSED.with(Cell::get)
}

/// One scripted event on the receive side of the line
pub enum Event {
    Bytes(Vec<u8>),
    Silence,
    /// Silence lasting long enough to move [`fake_now`] forward
    Elapse(Duration),
    Fail(io::ErrorKind),
}

#[derive(Default)]
struct Line {
    events: VecDeque<Event>,
    written: Vec<u8>,
    reads: usize,
    writes: usize,
    short_write: bool,
}

/// In-memory transport; clones share the same line so tests can inspect it
/// while a session owns the transport.
#[derive(Clone, Default)]
pub struct MockSerial {
    line: Rc<RefCell<Line>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, bytes: Vec<u8>) -> &Self {
        self.line.borrow_mut().events.push_back(Event::Bytes(bytes));
        self
    }

    pub fn silence(&self) -> &Self {
        self.line.borrow_mut().events.push_back(Event::Silence);
        self
    }

    pub fn elapse(&self, duration: Duration) -> &Self {
        self.line.borrow_mut().events.push_back(Event::Elapse(duration));
        self
    }

    pub fn fail(&self, kind: io::ErrorKind) -> &Self {
        self.line.borrow_mut().events.push_back(Event::Fail(kind));
        self
    }

    pub fn short_writes(&self) {
        self.line.borrow_mut().short_write = true;
    }

    /// Command frames written so far, decoded
    pub fn commands(&self) -> Vec<CommandFrame> {
        self.line
            .borrow()
            .written
            .chunks(19)
            .map(|chunk| CommandFrame::decode(chunk).expect("valid command frame"))
            .collect()
    }

    pub fn clear_history(&self) {
        let mut line = self.line.borrow_mut();
        line.written.clear();
        line.reads = 0;
        line.writes = 0;
    }

    pub fn io_count(&self) -> (usize, usize) {
        let line = self.line.borrow();
        (line.reads, line.writes)
    }

    pub fn pending(&self) -> usize {
        self.line.borrow().events.len()
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut line = self.line.borrow_mut();
        line.reads += 1;
        match line.events.pop_front() {
            None | Some(Event::Silence) => Err(io::ErrorKind::TimedOut.into()),
            Some(Event::Elapse(duration)) => {
                ELAPSED.with(|elapsed| elapsed.set(elapsed.get() + duration));
                Err(io::ErrorKind::TimedOut.into())
            }
            Some(Event::Fail(kind)) => Err(io::Error::new(kind, "line failure")),
            Some(Event::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    bytes.drain(..n);
                    line.events.push_front(Event::Bytes(bytes));
                }
                Ok(n)
            }
        }
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut line = self.line.borrow_mut();
        line.writes += 1;
        let n = if line.short_write { buf.len() / 2 } else { buf.len() };
        line.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn response(marker: u8, data: [u8; 4], id: DeviceId) -> Vec<u8> {
    let [id1, id2] = id.bytes();
    let mut frame = vec![HEAD, marker, data[0], data[1], data[2], data[3], id1, id2, 0, TAIL];
    frame[8] = codec::checksum(&frame[..8]).unwrap();
    frame
}

/// Reply echoing `command` with three data bytes
pub fn reply(command: u8, data: [u8; 3]) -> Vec<u8> {
    reply_from(ID, command, data)
}

pub fn reply_from(id: DeviceId, command: u8, data: [u8; 3]) -> Vec<u8> {
    response(REPLY_MARKER, [command, data[0], data[1], data[2]], id)
}

/// Data report with raw tenths of µg/m³
pub fn report(pm25: u16, pm10: u16) -> Vec<u8> {
    let [a, b] = pm25.to_le_bytes();
    let [c, d] = pm10.to_le_bytes();
    response(REPORT_MARKER, [a, b, c, d], ID)
}

/// Replies to the three start-up queries
pub fn configuration(line: &MockSerial, duty_cycle: u8, report_mode: u8) {
    line.push(reply(0x08, [0x00, duty_cycle, 0x00]))
        .push(reply(0x02, [0x00, report_mode, 0x00]))
        .push(reply(0x07, [0x12, 0x0B, 0x10]));
}

/// A sensor found streaming reports in continuous initiative mode
pub fn streaming_sensor(line: &MockSerial) {
    line.push(report(100, 200));
    configuration(line, 0, 0);
}

pub fn open(line: &MockSerial) -> sds011_protocol::Sds011<MockSerial> {
    sds011_protocol::Sds011::new(line.clone(), UnitOfMeasure::MassConcentration)
        .expect("session starts")
}
