//! Reply formatting.
//!
//! Every reply is written to a [`core::fmt::Write`] sink so the same code
//! drives a UART on target and a `String` in tests.

use core::fmt::{self, Write};

use crate::config::Degrees;
use crate::motion::EngineStatus;

/// Startup and reset banner.
pub const BANNER: &str = "Grbl 1.1h ['$' for help]";

/// Alarm codes reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    /// Limit sensor tripped during a normal move.
    HardLimit = 1,
    /// Homing search ended without finding the sensor.
    HomingFailed = 9,
}

/// `<State|MPos:az,alt,0|>` followed by a blank line.
pub fn write_status<W: Write>(
    out: &mut W,
    status: EngineStatus,
    azimuth: Degrees,
    altitude: Degrees,
) -> fmt::Result {
    write!(
        out,
        "<{}|MPos:{:.3},{:.3},0|>\r\n\r\n",
        status.as_str(),
        azimuth.0,
        altitude.0
    )
}

/// Acknowledgement for jogs and realtime holds.
pub fn write_ok<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("ok\r\n")
}

/// Acknowledgement for the legacy `ALT:` command.
pub fn write_legacy_ok<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("OK\r\n")
}

/// Banner line sent after `RST`.
pub fn write_banner<W: Write>(out: &mut W) -> fmt::Result {
    write!(out, "{}\r\n", BANNER)
}

/// `ALARM:<code>` line.
pub fn write_alarm<W: Write>(out: &mut W, alarm: Alarm) -> fmt::Result {
    write!(out, "ALARM:{}\r\n", alarm as u8)
}

/// `[MSG:...]` feedback line.
pub fn write_message<W: Write>(out: &mut W, message: &str) -> fmt::Result {
    write!(out, "[MSG:{}]\r\n", message)
}
