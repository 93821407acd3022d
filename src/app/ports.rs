//! Port traits: the hexagonal boundary between the sensing engine and the
//! outside world.
//!
//! ```text
//!   GpioPort ─┐                      ┌─▶ EventSink
//!   Clock ────┼──▶ FanService ───────┤
//!             │    (sensing tasks)   └─▶ FanController ─▶ GpioPort
//! ```
//!
//! Driven adapters (ESP-IDF GPIO, the system timer, the serial log) implement
//! these traits.  The engine consumes them via generics, so the decoding and
//! actuation logic never touches hardware directly and runs unchanged against
//! the mocks in `tests/integration/mock_hw.rs`.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GpioError;

use super::events::FanEvent;

// ───────────────────────────────────────────────────────────────
// Line identity
// ───────────────────────────────────────────────────────────────

/// A GPIO line number on the host MCU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u8);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// High impedance; the fan's own pull-ups define the level.
    Input,
    /// Push-pull output.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Falling,
    Rising,
    Any,
}

/// Interrupt handler registered on a line.  Invoked in interrupt context
/// with the line that fired, so it must not block or allocate.
pub type EdgeHandler = Box<dyn Fn(LineId) + Send + Sync + 'static>;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// The GPIO capability the engine is built on.
///
/// Methods take `&self`: the same port is shared between the startup path,
/// the button actuator, and (through the registered handlers) interrupt
/// context.
pub trait GpioPort: Send + Sync {
    /// Switch `line` between input and output.
    fn enable(&self, line: LineId, mode: PinMode) -> Result<(), GpioError>;

    /// Drive an output line.
    fn write(&self, line: LineId, level: Level) -> Result<(), GpioError>;

    /// Sample a line.
    fn read(&self, line: LineId) -> Result<Level, GpioError>;

    /// Attach `handler` to `edge` transitions on `line`.  The handler lives
    /// for the rest of the process.
    fn set_edge_interrupt(&self, line: LineId, edge: Edge, handler: EdgeHandler)
    -> Result<(), GpioError>;
}

impl<T: GpioPort + ?Sized> GpioPort for std::sync::Arc<T> {
    fn enable(&self, line: LineId, mode: PinMode) -> Result<(), GpioError> {
        (**self).enable(line, mode)
    }

    fn write(&self, line: LineId, level: Level) -> Result<(), GpioError> {
        (**self).write(line, level)
    }

    fn read(&self, line: LineId) -> Result<Level, GpioError> {
        (**self).read(line)
    }

    fn set_edge_interrupt(&self, line: LineId, edge: Edge, handler: EdgeHandler)
    -> Result<(), GpioError> {
        (**self).set_edge_interrupt(line, edge, handler)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond counter.  Wraps at `u32::MAX` (~71.6 minutes);
/// every consumer compares timestamps with `wrapping_sub`.
///
/// Must be callable from interrupt context.
pub trait Clock: Send + Sync {
    fn now_us(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → accessory / logging)
// ───────────────────────────────────────────────────────────────

/// The engine emits [`FanEvent`]s through this port whenever an inferred
/// state changes.  Adapters decide where they go (serial log, accessory
/// characteristic notifications, an outbound channel…).
///
/// Called from the monitor tasks, possibly concurrently.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &FanEvent);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: &FanEvent) {
        (**self).emit(event);
    }
}
