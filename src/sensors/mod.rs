//! Sensing subsystem: the three monitor tasks and the state they publish.
//!
//! Each monitor owns its private state record and is the single writer of
//! one or two fields of [`SensedState`].  Everything else (setters, getters,
//! the power monitor reading motor activity) only loads those fields.
//!
//! | Field              | Writer              | Readers                 |
//! |--------------------|---------------------|-------------------------|
//! | `speed_level`      | motor decoder task  | controller, snapshots   |
//! | `last_activity_us` | motor decoder task  | power monitor task      |
//! | `activity_seen`    | motor decoder task  | power monitor task      |
//! | `powered`          | power monitor task  | controller, snapshots   |
//! | `oscillating`      | oscillation task    | controller, snapshots   |

pub mod motor;
pub mod oscillation;
pub mod power;

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::app::events::FanSnapshot;

/// Inferred fan state shared across tasks.  Word-sized atomics only; no
/// lock is ever taken.
#[derive(Debug, Default)]
pub struct SensedState {
    speed_level: AtomicU8,
    powered: AtomicBool,
    oscillating: AtomicBool,
    last_activity_us: AtomicU32,
    activity_seen: AtomicBool,
}

impl SensedState {
    pub const fn new() -> Self {
        Self {
            speed_level: AtomicU8::new(0),
            powered: AtomicBool::new(false),
            oscillating: AtomicBool::new(false),
            last_activity_us: AtomicU32::new(0),
            activity_seen: AtomicBool::new(false),
        }
    }

    // ── Readers ───────────────────────────────────────────────

    /// Last committed speed level, 0 before the first decode.
    pub fn speed_level(&self) -> u8 {
        self.speed_level.load(Ordering::Acquire)
    }

    pub fn is_powered(&self) -> bool {
        self.powered.load(Ordering::Acquire)
    }

    pub fn is_oscillating(&self) -> bool {
        self.oscillating.load(Ordering::Acquire)
    }

    /// Timestamp of the most recent motor edge, `None` until the first one.
    pub fn last_activity_us(&self) -> Option<u32> {
        if self.activity_seen.load(Ordering::Acquire) {
            Some(self.last_activity_us.load(Ordering::Acquire))
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> FanSnapshot {
        FanSnapshot::new(self.is_powered(), self.speed_level(), self.is_oscillating())
    }

    // ── Writers (one owning task each) ────────────────────────

    pub(crate) fn publish_speed_level(&self, level: u8) {
        self.speed_level.store(level, Ordering::Release);
    }

    pub(crate) fn publish_activity(&self, timestamp_us: u32) {
        self.last_activity_us.store(timestamp_us, Ordering::Release);
        self.activity_seen.store(true, Ordering::Release);
    }

    pub(crate) fn publish_powered(&self, on: bool) {
        self.powered.store(on, Ordering::Release);
    }

    pub(crate) fn publish_oscillating(&self, on: bool) {
        self.oscillating.store(on, Ordering::Release);
    }
}
