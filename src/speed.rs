//! Discrete fan speed levels and their mapping to a continuous duty value.
//!
//! The fan has eight speeds.  Outward (towards the accessory layer) a speed
//! is a duty percentage: level `n` reports as `n * 12.5`.  Inward, a
//! requested duty is bucketed into a level through [`DUTY_BANDS`].

use core::fmt;

/// Number of discrete speeds on the fan.
pub const NUM_SPEEDS: u8 = 8;

/// Duty at or below this value means "off".
pub const OFF_DUTY_MAX: f32 = 4.0;

/// Upper (inclusive) duty bound of levels 1–7; anything above the last bound
/// is level 8.  Bands are searched in ascending order, first match wins.
pub const DUTY_BANDS: [f32; 7] = [22.2, 33.3, 44.4, 55.5, 66.6, 77.7, 88.8];

/// A running speed, 1 (slowest) to 8 (fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(NUM_SPEEDS);

    /// `None` for 0 ("no speed sensed yet") or anything above 8.
    pub const fn new(level: u8) -> Option<Self> {
        if level >= 1 && level <= NUM_SPEEDS {
            Some(Self(level))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Duty reported for this level (12.5 … 100.0).
    pub fn duty(self) -> f32 {
        f32::from(self.0) * (100.0 / f32::from(NUM_SPEEDS))
    }

    /// Bucket a requested duty.  `Ok(None)` means the request is "off".
    ///
    /// Negative requests clamp to off and anything above the top band is
    /// level 8.  NaN is rejected since it cannot be ordered into a band.
    pub fn from_duty(duty: f32) -> Result<Option<Self>, f32> {
        if duty.is_nan() {
            return Err(duty);
        }
        if duty <= OFF_DUTY_MAX {
            return Ok(None);
        }
        let level = DUTY_BANDS
            .iter()
            .position(|&upper| duty <= upper)
            .map_or(NUM_SPEEDS, |i| i as u8 + 1);
        Ok(Some(Self(level)))
    }
}

impl fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Duty for a raw sensed level where 0 means "nothing decoded yet".
pub fn duty_of_raw(level: u8) -> f32 {
    SpeedLevel::new(level).map_or(0.0, SpeedLevel::duty)
}
