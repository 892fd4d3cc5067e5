//! Single-byte realtime commands.
//!
//! These bytes are never part of a line command, so they are pulled out of
//! the input stream as soon as they arrive and handled ahead of any
//! buffered line.

/// Status report request.
pub const STATUS_QUERY: u8 = b'?';
/// Suspend pulse generation.
pub const FEED_HOLD: u8 = b'!';
/// Resume after a feed hold.
pub const CYCLE_START: u8 = b'~';
/// Ctrl-X: drop all motion and soft reset.
pub const ABORT: u8 = 0x18;

/// A decoded realtime command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Realtime {
    /// `?`
    StatusQuery,
    /// `!`
    FeedHold,
    /// `~`
    CycleStart,
    /// `0x18`
    Abort,
}

impl Realtime {
    /// Decode a byte, returning `None` for ordinary line data.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            STATUS_QUERY => Some(Realtime::StatusQuery),
            FEED_HOLD => Some(Realtime::FeedHold),
            CYCLE_START => Some(Realtime::CycleStart),
            ABORT => Some(Realtime::Abort),
            _ => None,
        }
    }
}
