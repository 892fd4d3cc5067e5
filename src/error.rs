//! Error types for polar-motion.
//!
//! Provides unified error handling across configuration, motor outputs and
//! homing. Line parse failures have their own [`ProtocolError`]; the
//! protocol handler logs and drops those lines, so they never surface here.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all polar-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motor output error
    Motor(MotorError),
    /// Homing did not complete
    Homing(HomingError),
    /// Reply sink rejected a write
    Output,
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep value (must be power of 2: 1, 2, 4, 8, 16, 32, 64, 128, 256)
    InvalidMicrosteps(u16),
    /// Invalid gear ratio (must be > 0)
    InvalidGearRatio(f32),
    /// Screw pitch and lever radius must both be > 0
    InvalidScrewGeometry {
        /// Configured screw pitch
        pitch_mm: f32,
        /// Configured lever radius
        lever_radius_mm: f32,
    },
    /// Step interval must be non-zero and longer than the pulse width
    InvalidStepInterval(u32),
    /// Homing travel must be > 0
    InvalidHomingTravel(f32),
    /// Pull-off step bound must be > 0
    InvalidPullOff,
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motor output errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// Sensor or button read failed
    InputError,
}

/// Line command parse errors. These are logged and the line is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Line is not a known command
    UnknownCommand,
    /// A numeric field did not parse
    InvalidNumber,
    /// Axis value beyond the accepted travel
    OutOfRange,
    /// Jog word letter not understood
    UnexpectedWord(char),
    /// Same axis given twice in one jog
    RepeatedAxis,
    /// Jog carries no axis word
    NoAxis,
    /// Line exceeded the receive buffer
    LineTooLong,
}

/// Homing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingError {
    /// Sensor never triggered within the travel bound
    SensorNotFound,
    /// Sensor stayed triggered through a whole pull-off
    SensorStuck,
    /// Abort requested while homing
    Aborted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Homing(e) => write!(f, "Homing error: {}", e),
            Error::Output => write!(f, "Reply sink write failed"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microsteps: {}. Valid values: 1, 2, 4, 8, 16, 32, 64, 128, 256", v)
            }
            ConfigError::InvalidGearRatio(v) => write!(f, "Invalid gear ratio: {}. Must be > 0", v),
            ConfigError::InvalidScrewGeometry { pitch_mm, lever_radius_mm } => write!(
                f,
                "Invalid screw geometry: pitch {} mm, lever radius {} mm. Both must be > 0",
                pitch_mm, lever_radius_mm
            ),
            ConfigError::InvalidStepInterval(v) => {
                write!(f, "Invalid step interval: {} us. Must exceed the pulse width", v)
            }
            ConfigError::InvalidHomingTravel(v) => {
                write!(f, "Invalid homing travel: {}. Must be > 0", v)
            }
            ConfigError::InvalidPullOff => write!(f, "Pull-off step bound must be > 0"),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::InputError => write!(f, "GPIO input read failed"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownCommand => write!(f, "Unknown command"),
            ProtocolError::InvalidNumber => write!(f, "Invalid number"),
            ProtocolError::OutOfRange => write!(f, "Axis value out of range"),
            ProtocolError::UnexpectedWord(c) => write!(f, "Unexpected word '{}'", c),
            ProtocolError::RepeatedAxis => write!(f, "Axis given twice"),
            ProtocolError::NoAxis => write!(f, "Jog without axis words"),
            ProtocolError::LineTooLong => write!(f, "Line exceeds receive buffer"),
        }
    }
}

impl fmt::Display for HomingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomingError::SensorNotFound => write!(f, "Limit sensor not found within travel bound"),
            HomingError::SensorStuck => write!(f, "Limit sensor did not release on pull-off"),
            HomingError::Aborted => write!(f, "Homing aborted"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<HomingError> for Error {
    fn from(e: HomingError) -> Self {
        Error::Homing(e)
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Output
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for HomingError {}
