//! Power activity monitor.
//!
//! The fan has no "power" line to watch: it is considered on while the
//! motor lines keep producing edges and off once they have been silent for
//! longer than the activity timeout.

use std::time::Duration;

use log::info;

use crate::app::events::FanEvent;
use crate::app::ports::{Clock, EventSink};

use super::SensedState;

/// Default silence (µs) after which the fan is considered off.
pub const ON_OFF_CHECK_INTERVAL_US: u32 = 400_000;

/// Edge-triggered on/off inference from motor activity recency.
#[derive(Debug)]
pub struct PowerMonitor {
    timeout_us: u32,
    is_powered: bool,
}

impl PowerMonitor {
    pub fn new(timeout_us: u32) -> Self {
        Self {
            timeout_us,
            is_powered: false,
        }
    }

    /// Re-evaluate.  Returns the new state only on a transition.  No
    /// activity ever seen reads as off.
    pub fn evaluate(&mut self, now_us: u32, last_activity_us: Option<u32>) -> Option<bool> {
        let powered = last_activity_us
            .is_some_and(|last| now_us.wrapping_sub(last) <= self.timeout_us);
        if powered == self.is_powered {
            return None;
        }
        self.is_powered = powered;
        Some(powered)
    }

    pub fn is_powered(&self) -> bool {
        self.is_powered
    }
}

/// One poll: sample the clock and the decoder's activity stamp, publish and
/// notify on a transition.
pub fn tick(
    monitor: &mut PowerMonitor,
    clock: &impl Clock,
    state: &SensedState,
    sink: &impl EventSink,
) {
    let now = clock.now_us();
    if let Some(on) = monitor.evaluate(now, state.last_activity_us()) {
        state.publish_powered(on);
        info!("power: {}", if on { "ON" } else { "OFF" });
        sink.emit(&FanEvent::PowerChanged(on));
    }
}

/// Power monitor task body.  Never returns.
pub fn run(
    mut monitor: PowerMonitor,
    poll: Duration,
    clock: &impl Clock,
    state: &SensedState,
    sink: &impl EventSink,
) -> ! {
    loop {
        std::thread::sleep(poll);
        tick(&mut monitor, clock, state, sink);
    }
}
