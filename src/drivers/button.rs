//! Button-press emulation on the fan's control board.
//!
//! ## Hardware
//!
//! The fan's buttons are active-low momentary switches pulled up on the
//! fan's own board.  The MCU is wired in parallel.  A line is left as a
//! high-impedance input when idle (so the physical button still works) and
//! a press is emulated by briefly driving it low:
//!
//! ```text
//!   idle (input) ──▶ output, drive LOW ──▶ hold press_ms ──▶ input again
//! ```
//!
//! Releasing to input rather than driving high avoids fighting the fan's
//! pull-up or a human pressing the real button at the same time.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::{GpioPort, Level, LineId, PinMode};
use crate::error::GpioError;

/// Default hold time of one emulated press.
pub const BUTTON_PRESS_MS: u32 = 20;

/// Pushes fan buttons through a [`GpioPort`].
pub struct ButtonActuator<G, D> {
    gpio: G,
    delay: D,
    press_ms: u32,
}

impl<G: GpioPort, D: DelayNs> ButtonActuator<G, D> {
    pub fn new(gpio: G, delay: D, press_ms: u32) -> Self {
        Self {
            gpio,
            delay,
            press_ms,
        }
    }

    /// Put `line` in its idle high-impedance state.
    pub fn release(&self, line: LineId) -> Result<(), GpioError> {
        self.gpio.enable(line, PinMode::Input)
    }

    /// One press-and-release on `line`.  Blocks for `press_ms`.
    ///
    /// If driving the line fails after it was switched to output, the line
    /// is still released before the error is returned.
    pub fn push(&mut self, line: LineId) -> Result<(), GpioError> {
        debug!("button: push {}", line);
        self.gpio.enable(line, PinMode::Output)?;
        if let Err(e) = self.gpio.write(line, Level::Low) {
            self.release(line)?;
            return Err(e);
        }
        self.delay.delay_ms(self.press_ms);
        self.release(line)
    }

    /// Block the caller, used between presses while waiting for the
    /// sensed state to catch up.
    pub fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
