//! Oscillation monitor.
//!
//! The oscillation stepper's drive line toggles continuously while the fan
//! sweeps.  Any edge seen during one poll interval means the fan is
//! oscillating; a quiet interval means it has stopped.  The queue is tiny
//! on purpose, only presence matters.

use std::time::Duration;

use log::info;

use crate::app::events::FanEvent;
use crate::app::ports::EventSink;
use crate::events::EdgeQueue;

use super::SensedState;

/// Edge-triggered on/off inference from per-interval edge presence.
#[derive(Debug, Default)]
pub struct OscillationMonitor {
    is_oscillating: bool,
}

impl OscillationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close one poll interval in which `edges_seen` edges arrived.
    /// Returns the new state only on a transition.
    pub fn evaluate(&mut self, edges_seen: usize) -> Option<bool> {
        let oscillating = edges_seen > 0;
        if oscillating == self.is_oscillating {
            return None;
        }
        self.is_oscillating = oscillating;
        Some(oscillating)
    }

    pub fn is_oscillating(&self) -> bool {
        self.is_oscillating
    }
}

/// Close one interval: count what the ISR queued since the last call.
pub fn tick<const N: usize>(
    monitor: &mut OscillationMonitor,
    queue: &EdgeQueue<N>,
    state: &SensedState,
    sink: &impl EventSink,
) {
    let edges = queue.drain();
    if let Some(on) = monitor.evaluate(edges) {
        state.publish_oscillating(on);
        info!("oscillation: {}", if on { "ON" } else { "OFF" });
        sink.emit(&FanEvent::OscillationChanged(on));
    }
}

/// Oscillation monitor task body.  Never returns.
pub fn run<const N: usize>(
    queue: &EdgeQueue<N>,
    mut monitor: OscillationMonitor,
    poll: Duration,
    state: &SensedState,
    sink: &impl EventSink,
) -> ! {
    loop {
        std::thread::sleep(poll);
        tick(&mut monitor, queue, state, sink);
    }
}
