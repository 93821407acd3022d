//! Unified error types for the fansense firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level error handling uniform.  All variants are `Copy` so they can be
//! returned from setter loops and logged without allocation.

use core::fmt;

use crate::app::ports::LineId;
use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// A GPIO capability call failed.
    Gpio(GpioError),
    /// A commanded state could not be reached.
    Actuation(ActuationError),
    /// Configuration is invalid or the engine is in the wrong lifecycle state.
    Config(ConfigError),
    /// A monitor task could not be spawned.
    Spawn(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Actuation(e) => write!(f, "actuation: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Spawn(task) => write!(f, "spawn: task '{task}' could not be created"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The line number does not exist on this chip.
    InvalidLine(LineId),
    /// Direction / pull configuration was rejected (driver return code).
    ConfigFailed { line: LineId, code: i32 },
    /// Level write was rejected.
    WriteFailed { line: LineId, code: i32 },
    /// The GPIO ISR service could not be installed or the handler attached.
    IsrInstallFailed { line: LineId, code: i32 },
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLine(line) => write!(f, "invalid line {line}"),
            Self::ConfigFailed { line, code } => {
                write!(f, "config of line {line} failed (rc={code})")
            }
            Self::WriteFailed { line, code } => write!(f, "write to line {line} failed (rc={code})"),
            Self::IsrInstallFailed { line, code } => {
                write!(f, "ISR install on line {line} failed (rc={code})")
            }
        }
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Actuation errors
// ---------------------------------------------------------------------------

/// Which front-panel button a convergence loop was pressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Power,
    Speed,
    Oscillate,
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power => write!(f, "power"),
            Self::Speed => write!(f, "speed"),
            Self::Oscillate => write!(f, "oscillate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuationError {
    /// The sensed state never matched the target within the press budget.
    NotConverged { button: Button, attempts: u32 },
    /// Requested duty was not a number.
    InvalidDuty(f32),
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConverged { button, attempts } => {
                write!(f, "{button} button pressed {attempts} times without effect")
            }
            Self::InvalidDuty(duty) => write!(f, "invalid speed duty {duty}"),
        }
    }
}

impl From<ActuationError> for Error {
    fn from(e: ActuationError) -> Self {
        Self::Actuation(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
