//! Motor speed decoder.
//!
//! The fan's controller drives its motor through two BJTs labelled "M"
//! (speeds 1–4) and "H" (speeds 5–8).  For each speed it emits a continuous
//! stream of pulses on the active line and skips one pulse every `n`
//! pulses, where `n` identifies the speed.  The skipped pulse shows up as
//! an inter-edge gap longer than [`PULSE_LENGTH_US`]; counting the edges
//! between two such gaps recovers `n`.
//!
//! ```text
//!   M line, speed 1 (skip after 6):
//!   ▁▔▁▔▁▔▁▔▁▔▁▔▁▁▁▔▁▔▁▔▁▔▁▔▁▔▁▁▁▔▁ …
//!   └── 6 edges ──┘ gap └── 6 edges ──┘ gap
//! ```
//!
//! The top speed of each line has no skip at all; it is recognised by the
//! count reaching [`SPD_MAX_PULSES`] with no gap.
//!
//! A count of 5 appears on both lines (speed 1 on M after a discarded
//! repeat, noise on H); the line the edge arrived on breaks the tie.

use log::{debug, info, warn};

use crate::app::events::FanEvent;
use crate::app::ports::{EventSink, LineId};
use crate::events::{DropWatch, EdgeQueue, PulseEvent};
use crate::speed::SpeedLevel;

use super::SensedState;

/// Default gap (µs) that ends a pulse train.
pub const PULSE_LENGTH_US: u32 = 15_000;

/// Edge count at which a train is treated as complete without a gap.
pub const SPD_MAX_PULSES: u8 = 14;

// ---------------------------------------------------------------------------
// Decode tables
// ---------------------------------------------------------------------------

/// Pulse-count → speed mapping for one motor line.
#[derive(Debug)]
pub struct SpeedTable {
    /// `(pulse_count, level)`; first match wins.
    pub entries: &'static [(u8, u8)],
    /// Level reported when the ceiling is reached.
    pub ceiling_level: u8,
}

impl SpeedTable {
    pub fn decode(&self, pulse_count: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|&&(count, _)| count == pulse_count)
            .map(|&(_, level)| level)
    }
}

/// "M" line: speeds 1–4.
pub const MEDIUM_TABLE: SpeedTable = SpeedTable {
    entries: &[(5, 1), (6, 1), (9, 2), (13, 3)],
    ceiling_level: 4,
};

/// "H" line: speeds 5–8.  A count of 5 is deliberately absent.
pub const HIGH_TABLE: SpeedTable = SpeedTable {
    entries: &[(4, 5), (6, 6), (9, 7)],
    ceiling_level: 8,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorLine {
    Medium,
    High,
}

impl MotorLine {
    pub fn table(self) -> &'static SpeedTable {
        match self {
            Self::Medium => &MEDIUM_TABLE,
            Self::High => &HIGH_TABLE,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder state machine
// ---------------------------------------------------------------------------

/// Pulse-counting state machine.  Owned by the motor task; pure, so it can
/// be driven directly from tests with synthetic timestamps.
#[derive(Debug)]
pub struct MotorDecoder {
    medium_line: LineId,
    high_line: LineId,
    pulse_length_us: u32,

    pulse_count: u8,
    last_committed_pulse_count: u8,
    last_event_timestamp: u32,
    current_speed_level: u8,
    last_activity_timestamp: u32,
}

impl MotorDecoder {
    pub fn new(medium_line: LineId, high_line: LineId, pulse_length_us: u32) -> Self {
        Self {
            medium_line,
            high_line,
            pulse_length_us,
            pulse_count: 0,
            last_committed_pulse_count: 0,
            last_event_timestamp: 0,
            current_speed_level: 0,
            last_activity_timestamp: 0,
        }
    }

    fn line_of(&self, source: LineId) -> Option<MotorLine> {
        if source == self.medium_line {
            Some(MotorLine::Medium)
        } else if source == self.high_line {
            Some(MotorLine::High)
        } else {
            None
        }
    }

    /// Feed one edge.  Returns the new speed when this edge commits a
    /// change; `None` for intra-train edges, repeats, and counts that are
    /// not in the line's table.
    pub fn on_event(&mut self, event: PulseEvent) -> Option<SpeedLevel> {
        self.last_activity_timestamp = event.timestamp_us;
        self.pulse_count = self.pulse_count.saturating_add(1);

        let line = self.line_of(event.source);
        let gap = event.timestamp_us.wrapping_sub(self.last_event_timestamp);

        let decoded = if gap > self.pulse_length_us {
            if self.pulse_count == self.last_committed_pulse_count {
                // Same train as last time.  Keep counting from here and leave
                // the last-edge timestamp alone so the next edge is judged
                // against the previous train.
                debug!(
                    "motor: repeat train of {} on {}, skipped",
                    self.pulse_count, event.source
                );
                return None;
            }
            let count = self.pulse_count;
            self.last_committed_pulse_count = count;
            self.pulse_count = 0;
            let level = line.and_then(|l| l.table().decode(count));
            if level.is_none() {
                debug!("motor: no speed for {} pulses on {}", count, event.source);
            }
            level
        } else if self.pulse_count >= SPD_MAX_PULSES {
            self.pulse_count = 0;
            line.map(|l| l.table().ceiling_level)
        } else {
            None
        };

        self.last_event_timestamp = event.timestamp_us;

        let level = decoded.and_then(SpeedLevel::new)?;
        if level.get() == self.current_speed_level {
            return None;
        }
        self.current_speed_level = level.get();
        Some(level)
    }

    /// Edges counted since the last reset.
    pub fn pulse_count(&self) -> u8 {
        self.pulse_count
    }

    /// Last committed level, 0 before the first decode.
    pub fn current_speed_level(&self) -> u8 {
        self.current_speed_level
    }

    pub fn last_activity_timestamp(&self) -> u32 {
        self.last_activity_timestamp
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Apply one edge: decode, publish, notify on change.
pub fn process(
    decoder: &mut MotorDecoder,
    event: PulseEvent,
    state: &SensedState,
    sink: &impl EventSink,
) {
    let committed = decoder.on_event(event);
    if let Some(level) = committed {
        state.publish_speed_level(level.get());
        info!("motor: speed {} ({:.1}%)", level, level.duty());
        sink.emit(&FanEvent::speed_changed(level));
    }
    state.publish_activity(decoder.last_activity_timestamp());
}

/// Report edges lost to queue overflow since the previous call.  The
/// current train's count is off until the next boundary.
pub fn report_drops<const N: usize>(queue: &EdgeQueue<N>, drops: &mut DropWatch) -> Option<u32> {
    let lost = drops.poll(queue.dropped())?;
    warn!("motor: queue overflow, {} edge(s) lost", lost);
    Some(lost)
}

/// Motor monitor task body.  Purely event-driven: blocks on the queue with
/// no timeout and never returns.
pub fn run<const N: usize>(
    queue: &EdgeQueue<N>,
    mut decoder: MotorDecoder,
    state: &SensedState,
    sink: &impl EventSink,
) -> ! {
    let mut drops = DropWatch::default();
    loop {
        let event = queue.receive_blocking();
        report_drops(queue, &mut drops);
        process(&mut decoder, event, state, sink);
    }
}
