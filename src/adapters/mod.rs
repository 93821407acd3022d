//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                 |
//! |-------------|-----------------|-----------------------------|
//! | `log_sink`  | EventSink       | Serial log output           |
//! | `time`      | Clock, DelayNs  | ESP32 system timer / sleep  |
//!
//! The GPIO adapter lives in [`crate::drivers::gpio`] next to the raw
//! driver calls.

pub mod log_sink;
pub mod time;
