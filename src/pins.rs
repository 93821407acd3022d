//! GPIO assignments for the fan retrofit board.
//!
//! Single source of truth: [`FanConfig::default`](crate::config::FanConfig)
//! reads these rather than hard-coding pin numbers.  Change a pin here and
//! it propagates everywhere.
//!
//! Labels in brackets are the silkscreen names on the HYF290B control PCB.

use crate::app::ports::LineId;

// ---------------------------------------------------------------------------
// Motor drive lines (sensed, falling edge)
// ---------------------------------------------------------------------------

/// Base of the "H" motor BJT, carries pulse trains for speeds 5–8.
pub const MOTOR_HIGH_GPIO: LineId = LineId(13);
/// Base of the "M" motor BJT, carries pulse trains for speeds 1–4.
pub const MOTOR_MEDIUM_GPIO: LineId = LineId(2);

// ---------------------------------------------------------------------------
// Oscillation stepper (sensed, falling edge)
// ---------------------------------------------------------------------------

/// Stepper driver input; toggles as a square wave while oscillating.
pub const OSCILLATION_GPIO: LineId = LineId(12);

// ---------------------------------------------------------------------------
// Front-panel buttons (emulated, active low for at least 10 ms)
// ---------------------------------------------------------------------------

/// [POWER]
pub const POWER_BUTTON_GPIO: LineId = LineId(5);
/// [SPEED]
pub const SPEED_BUTTON_GPIO: LineId = LineId(14);
/// [OSC]
pub const OSCILLATE_BUTTON_GPIO: LineId = LineId(4);
