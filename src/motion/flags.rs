//! Realtime control flags and the derived machine state.

/// Flags set by realtime commands and read on every engine tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlags {
    /// Pulse generation suspended; jobs kept.
    pub feed_hold: bool,
    /// Drop all motion at the next safe boundary.
    pub abort_requested: bool,
}

impl ControlFlags {
    /// Clear both flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Machine state reported in status frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineStatus {
    /// Nothing to do.
    Idle,
    /// Stepping or about to step.
    Run,
    /// Feed hold active.
    Hold,
}

impl EngineStatus {
    /// Derive the state; hold takes precedence over motion.
    pub fn derive(flags: &ControlFlags, is_moving: bool) -> Self {
        if flags.feed_hold {
            EngineStatus::Hold
        } else if is_moving {
            EngineStatus::Run
        } else {
            EngineStatus::Idle
        }
    }

    /// Name as it appears in a status frame.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineStatus::Idle => "Idle",
            EngineStatus::Run => "Run",
            EngineStatus::Hold => "Hold",
        }
    }
}
