//! System configuration parameters
//!
//! Board wiring, sensing thresholds and actuation timing for the fan
//! retrofit.  Defaults match the HYF290B control board; a JSON document can
//! override any subset of fields at boot.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::LineId;
use crate::drivers::button::BUTTON_PRESS_MS;
use crate::pins;
use crate::sensors::{motor, power};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    // --- Sensed lines ---
    /// "H" motor drive line (speeds 5–8)
    pub motor_high_line: LineId,
    /// "M" motor drive line (speeds 1–4)
    pub motor_medium_line: LineId,
    /// Oscillation stepper drive line
    pub oscillation_line: LineId,

    // --- Emulated buttons ---
    pub power_button_line: LineId,
    pub speed_button_line: LineId,
    pub oscillate_button_line: LineId,

    // --- Motor decoding ---
    /// Inter-pulse gap (µs) that marks the end of a pulse train
    pub pulse_length_us: u32,

    // --- Power / oscillation inference ---
    /// Motor silence (µs) after which the fan is considered off
    pub power_timeout_us: u32,
    /// Power monitor poll period (ms)
    pub power_poll_ms: u32,
    /// Oscillation monitor poll period (ms)
    pub oscillation_poll_ms: u32,

    // --- Actuation ---
    /// How long a button line is held low per press (ms)
    pub button_press_ms: u32,
    /// Wait between power-button presses (ms)
    pub power_retry_ms: u32,
    /// Wait between oscillate-button presses (ms)
    pub oscillation_retry_ms: u32,
    /// Wait between speed-button presses (ms)
    pub speed_retry_ms: u32,
    /// Presses per setter call before giving up; 0 = keep pressing forever
    pub max_press_attempts: u32,

    // --- Identity ---
    pub device: DeviceInfo,
}

/// Accessory identity reported to the controller side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            name: "Fart-Wafter 9000".into(),
            manufacturer: "Honeywell".into(),
            model: "HYF290B".into(),
            serial_number: "0012345".into(),
            firmware_revision: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            // Sensed lines
            motor_high_line: pins::MOTOR_HIGH_GPIO,
            motor_medium_line: pins::MOTOR_MEDIUM_GPIO,
            oscillation_line: pins::OSCILLATION_GPIO,

            // Buttons
            power_button_line: pins::POWER_BUTTON_GPIO,
            speed_button_line: pins::SPEED_BUTTON_GPIO,
            oscillate_button_line: pins::OSCILLATE_BUTTON_GPIO,

            // Motor decoding
            pulse_length_us: motor::PULSE_LENGTH_US,

            // Inference
            power_timeout_us: power::ON_OFF_CHECK_INTERVAL_US,
            power_poll_ms: 25,
            oscillation_poll_ms: 25,

            // Actuation
            button_press_ms: BUTTON_PRESS_MS,
            power_retry_ms: 100,
            oscillation_retry_ms: 100,
            speed_retry_ms: 25,
            max_press_attempts: 40,

            device: DeviceInfo::default(),
        }
    }
}

impl FanConfig {
    /// Parse a JSON override document.  Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject wiring and timing values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lines = self.lines();
        for (i, a) in lines.iter().enumerate() {
            if lines[i + 1..].contains(a) {
                return Err(ConfigError::DuplicateLine(*a));
            }
        }

        let intervals = [
            (self.pulse_length_us, "pulse_length_us"),
            (self.power_timeout_us, "power_timeout_us"),
            (self.power_poll_ms, "power_poll_ms"),
            (self.oscillation_poll_ms, "oscillation_poll_ms"),
            (self.button_press_ms, "button_press_ms"),
        ];
        if let Some((_, name)) = intervals.iter().find(|(v, _)| *v == 0) {
            return Err(ConfigError::ZeroInterval(*name));
        }

        Ok(())
    }

    /// Every line the engine touches, sensed lines first.
    pub fn lines(&self) -> [LineId; 6] {
        [
            self.motor_high_line,
            self.motor_medium_line,
            self.oscillation_line,
            self.power_button_line,
            self.speed_button_line,
            self.oscillate_button_line,
        ]
    }

    /// Button press budget as an `Option` (`None` = unbounded).
    pub fn press_budget(&self) -> Option<u32> {
        (self.max_press_attempts > 0).then_some(self.max_press_attempts)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document is not valid JSON for [`FanConfig`].
    Malformed,
    /// Two roles were assigned the same GPIO line.
    DuplicateLine(LineId),
    /// A timing field that must be positive was zero.
    ZeroInterval(&'static str),
    /// `start()` was called on an engine that is already running.
    AlreadyStarted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed config document"),
            Self::DuplicateLine(line) => write!(f, "line {line} assigned twice"),
            Self::ZeroInterval(field) => write!(f, "{field} must be non-zero"),
            Self::AlreadyStarted => write!(f, "engine already started"),
        }
    }
}
