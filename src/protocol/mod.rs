//! Host protocol: a GRBL-flavoured subset.
//!
//! Realtime bytes (`?`, `!`, `~`, Ctrl-X) act immediately. Lines carry
//! `$J=` jogs, the legacy `ALT:` command, `HOME` and `RST`.

mod command;
mod handler;
pub mod realtime;
pub mod reply;

pub use command::{parse_line, Command, JogRequest, PositionMode, MAX_AXIS_DEGREES};
pub use handler::{ByteSource, Line, ProtocolHandler, LINE_CAPACITY, LINE_QUEUE_DEPTH, REALTIME_QUEUE_DEPTH};
pub use realtime::Realtime;
pub use reply::Alarm;
