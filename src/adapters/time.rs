//! Time adapters.
//!
//! - **`espidf`**: wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic, ISR-safe).
//! - **host**: uses `std::time::Instant` for tests and simulation.
//!
//! Both truncate to `u32`, so readings wrap roughly every 71.6 minutes.

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Microsecond clock for edge timestamps and the power monitor.
pub struct SystemClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[cfg(feature = "espidf")]
    fn now_us(&self) -> u32 {
        // SAFETY: no preconditions; callable from ISR context.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u32
    }

    #[cfg(not(feature = "espidf"))]
    fn now_us(&self) -> u32 {
        self.start.elapsed().as_micros() as u32
    }
}

/// Thread-sleeping delay for the button actuator.  On ESP-IDF a
/// `std::thread::sleep` yields to the FreeRTOS scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
