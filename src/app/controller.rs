//! Commanded-state setters.
//!
//! The fan offers no way to set a state directly, only to press buttons
//! that cycle it.  Each setter therefore runs a convergence loop: while the
//! *sensed* state differs from the target, press the matching button and
//! wait for the monitors to observe the effect.
//!
//! ```text
//!   target ──▶ sensed == target? ──yes──▶ done
//!                    │ no
//!                    ▼
//!              push(button) ─▶ wait retry_ms ─▶ (loop, up to the press budget)
//! ```

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::FanConfig;
use crate::drivers::button::ButtonActuator;
use crate::error::{ActuationError, Button, Result};
use crate::sensors::SensedState;
use crate::speed::{self, SpeedLevel};

use super::commands::FanCommand;
use super::events::FanSnapshot;
use super::ports::{GpioPort, LineId};

/// Drives the fan's buttons until the sensed state matches a request.
pub struct FanController<G, D> {
    buttons: ButtonActuator<G, D>,
    state: Arc<SensedState>,
    power_button: LineId,
    speed_button: LineId,
    oscillate_button: LineId,
    power_retry_ms: u32,
    oscillation_retry_ms: u32,
    speed_retry_ms: u32,
    press_budget: Option<u32>,
}

impl<G: GpioPort, D: DelayNs> FanController<G, D> {
    pub fn new(config: &FanConfig, gpio: G, delay: D, state: Arc<SensedState>) -> Self {
        Self {
            buttons: ButtonActuator::new(gpio, delay, config.button_press_ms),
            state,
            power_button: config.power_button_line,
            speed_button: config.speed_button_line,
            oscillate_button: config.oscillate_button_line,
            power_retry_ms: config.power_retry_ms,
            oscillation_retry_ms: config.oscillation_retry_ms,
            speed_retry_ms: config.speed_retry_ms,
            press_budget: config.press_budget(),
        }
    }

    // ── Getters ───────────────────────────────────────────────

    pub fn get_power(&self) -> bool {
        self.state.is_powered()
    }

    /// Sensed speed as a duty percentage; 0.0 until a train is decoded.
    pub fn get_speed(&self) -> f32 {
        speed::duty_of_raw(self.state.speed_level())
    }

    pub fn get_oscillation(&self) -> bool {
        self.state.is_oscillating()
    }

    pub fn snapshot(&self) -> FanSnapshot {
        self.state.snapshot()
    }

    // ── Setters ───────────────────────────────────────────────

    pub fn set_power(&mut self, on: bool) -> Result<()> {
        info!("control: power -> {}", if on { "ON" } else { "OFF" });
        let line = self.power_button;
        let retry = self.power_retry_ms;
        self.converge(Button::Power, line, retry, |s| s.is_powered() == on)
    }

    pub fn set_oscillation(&mut self, on: bool) -> Result<()> {
        info!("control: oscillation -> {}", if on { "ON" } else { "OFF" });
        let line = self.oscillate_button;
        let retry = self.oscillation_retry_ms;
        self.converge(Button::Oscillate, line, retry, |s| {
            s.is_oscillating() == on
        })
    }

    /// Set rotation speed from a duty percentage.  A duty in the off band
    /// turns the fan off; otherwise the fan is powered on first if needed
    /// and the speed button is cycled until the target level is sensed.
    pub fn set_speed(&mut self, duty: f32) -> Result<()> {
        let target = SpeedLevel::from_duty(duty).map_err(ActuationError::InvalidDuty)?;
        let Some(target) = target else {
            info!("control: speed {:.1}% is off", duty);
            return self.set_power(false);
        };
        info!("control: speed {:.1}% -> {}", duty, target);

        let want = target.get();
        if self.state.speed_level() == want {
            return Ok(());
        }
        if !self.state.is_powered() {
            self.set_power(true)?;
        }
        let line = self.speed_button;
        let retry = self.speed_retry_ms;
        self.converge(Button::Speed, line, retry, |s| s.speed_level() == want)
    }

    /// Dispatch one queued command to its setter.
    pub fn handle_command(&mut self, cmd: FanCommand) -> Result<()> {
        match cmd {
            FanCommand::SetPower(on) => self.set_power(on),
            FanCommand::SetSpeed(duty) => self.set_speed(duty),
            FanCommand::SetOscillation(on) => self.set_oscillation(on),
        }
    }

    fn converge(
        &mut self,
        button: Button,
        line: LineId,
        retry_ms: u32,
        reached: impl Fn(&SensedState) -> bool,
    ) -> Result<()> {
        let mut attempts = 0u32;
        while !reached(&self.state) {
            if self.press_budget.is_some_and(|max| attempts >= max) {
                warn!(
                    "control: {} button pressed {} times, state unchanged",
                    button, attempts
                );
                return Err(ActuationError::NotConverged { button, attempts }.into());
            }
            self.buttons.push(line)?;
            attempts = attempts.saturating_add(1);
            self.buttons.wait_ms(retry_ms);
        }
        if attempts > 0 {
            info!("control: {} reached after {} press(es)", button, attempts);
        }
        Ok(())
    }
}
