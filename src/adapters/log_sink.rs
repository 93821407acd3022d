//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`FanEvent`] to the `log`
//! facade (the ESP-IDF logger on the device, UART / USB-CDC).  An
//! accessory bridge would implement the same trait and push the values to
//! its characteristics instead.

use log::info;

use crate::app::events::FanEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`FanEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// One-line rendering used by [`LogEventSink`].
pub fn format_event(event: &FanEvent) -> String {
    match event {
        FanEvent::SpeedChanged { level, duty } => {
            format!("SPEED | level={} duty={:.1}%", level.get(), duty)
        }
        FanEvent::PowerChanged(on) => format!("POWER | state={}", on_off(*on)),
        FanEvent::OscillationChanged(on) => format!("OSC | state={}", on_off(*on)),
        FanEvent::Started(snap) => format!(
            "START | power={} level={} duty={:.1}% osc={}",
            on_off(snap.powered),
            snap.speed_level,
            snap.speed_duty,
            on_off(snap.oscillating),
        ),
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &FanEvent) {
        info!("{}", format_event(event));
    }
}
