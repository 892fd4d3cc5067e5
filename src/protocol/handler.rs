//! Receive-side buffering.
//!
//! Bytes are fed in as they arrive from the serial port. Realtime bytes are
//! split off immediately into their own queue; everything else accumulates
//! into lines. Complete lines are upper-cased and queued for the control loop.

use heapless::{Deque, String};

use crate::error::ProtocolError;

use super::command::{parse_line, Command};
use super::realtime::Realtime;

/// Longest accepted line, terminator excluded.
pub const LINE_CAPACITY: usize = 80;
/// Complete lines buffered ahead of the control loop.
pub const LINE_QUEUE_DEPTH: usize = 4;
/// Realtime commands buffered ahead of the control loop.
pub const REALTIME_QUEUE_DEPTH: usize = 16;

/// One received line.
pub type Line = String<LINE_CAPACITY>;

/// Non-blocking source of host bytes, such as a UART receive FIFO.
///
/// `read_byte` returns `None` once nothing more is waiting.
pub trait ByteSource {
    /// Next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;
}

impl<F> ByteSource for F
where
    F: FnMut() -> Option<u8>,
{
    fn read_byte(&mut self) -> Option<u8> {
        self()
    }
}

/// Splits the incoming byte stream into realtime commands and lines.
#[derive(Debug, Default)]
pub struct ProtocolHandler {
    realtime: Deque<Realtime, REALTIME_QUEUE_DEPTH>,
    lines: Deque<Line, LINE_QUEUE_DEPTH>,
    partial: Line,
    overflowed: bool,
    dropped: u32,
}

impl ProtocolHandler {
    /// Empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes.
    pub fn receive(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.receive_byte(byte);
        }
    }

    /// Drain everything `source` has waiting.
    pub fn pump<S: ByteSource + ?Sized>(&mut self, source: &mut S) {
        while let Some(byte) = source.read_byte() {
            self.receive_byte(byte);
        }
    }

    fn receive_byte(&mut self, byte: u8) {
        if let Some(command) = Realtime::from_byte(byte) {
            if self.realtime.push_back(command).is_err() {
                warn!("realtime queue full, dropping {}", command);
                self.dropped += 1;
            }
            return;
        }

        match byte {
            b'\r' => {}
            b'\n' => self.finish_line(),
            _ => {
                let c = char::from(byte).to_ascii_uppercase();
                if self.overflowed || self.partial.push(c).is_err() {
                    self.overflowed = true;
                }
            }
        }
    }

    fn finish_line(&mut self) {
        let line = core::mem::take(&mut self.partial);
        if core::mem::take(&mut self.overflowed) {
            warn!("{}", ProtocolError::LineTooLong);
            self.dropped += 1;
            return;
        }
        if line.trim().is_empty() {
            return;
        }
        if self.lines.push_back(line).is_err() {
            warn!("line queue full, dropping line");
            self.dropped += 1;
        }
    }

    /// Next pending realtime command.
    pub fn poll_realtime(&mut self) -> Option<Realtime> {
        self.realtime.pop_front()
    }

    /// Next complete line.
    pub fn next_line(&mut self) -> Option<Line> {
        self.lines.pop_front()
    }

    /// Next complete line, parsed.
    ///
    /// Lines that fail to parse are logged and skipped, so `None` means no
    /// valid command is waiting.
    pub fn next_command(&mut self) -> Option<Command> {
        while let Some(line) = self.next_line() {
            match parse_line(&line) {
                Ok(command) => return Some(command),
                Err(e) => {
                    warn!("ignoring line: {}", e);
                    self.dropped += 1;
                }
            }
        }
        None
    }

    /// Drop all buffered input. Realtime commands already queued survive.
    pub fn clear_lines(&mut self) {
        self.lines.clear();
        self.partial.clear();
        self.overflowed = false;
    }

    /// Lines and realtime bytes discarded so far.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
