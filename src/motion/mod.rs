//! Motion module for polar-motion.
//!
//! Axis state, the job queue and the tick-driven engine that drains it.

mod axis;
mod engine;
mod flags;
mod job;

pub use axis::{Axis, AxisState, UnitConverter};
pub use engine::{ActiveMove, MotionEngine, TickEvent};
pub use flags::{ControlFlags, EngineStatus};
pub use job::{JobQueue, MotionJob, QUEUE_CAPACITY};
