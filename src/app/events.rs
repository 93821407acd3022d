//! Outbound state-change events.
//!
//! The sensing tasks emit these through the
//! [`EventSink`](super::ports::EventSink) port, exactly once per inferred
//! transition.  Adapters on the other side decide what to do with them:
//! log to serial, notify an accessory characteristic, etc.

use crate::speed::{self, SpeedLevel};

/// Structured events emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FanEvent {
    /// A new speed was decoded from the motor lines.  `duty` is the
    /// outward-facing value (`level * 12.5`).
    SpeedChanged { level: SpeedLevel, duty: f32 },

    /// Motor activity started or stopped.
    PowerChanged(bool),

    /// Oscillation stepper started or stopped.
    OscillationChanged(bool),

    /// The engine has started (carries the initial, not-yet-learned state).
    Started(FanSnapshot),
}

impl FanEvent {
    pub fn speed_changed(level: SpeedLevel) -> Self {
        Self::SpeedChanged {
            level,
            duty: level.duty(),
        }
    }
}

/// A point-in-time view of the inferred fan state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanSnapshot {
    pub powered: bool,
    /// Raw sensed level, 0 until the first train has been decoded.
    pub speed_level: u8,
    pub speed_duty: f32,
    pub oscillating: bool,
}

impl FanSnapshot {
    pub fn new(powered: bool, speed_level: u8, oscillating: bool) -> Self {
        Self {
            powered,
            speed_level,
            speed_duty: speed::duty_of_raw(speed_level),
            oscillating,
        }
    }
}
