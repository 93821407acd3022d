//! Inbound commands to the fan controller.
//!
//! These are the accessory-facing setters (power, rotation speed, swing)
//! requested by whatever front end is attached.  They are queued on a
//! static `embassy-sync` channel and executed one at a time by the
//! control loop, since each setter blocks while it presses buttons.
//!
//! ```text
//! ┌──────────────┐  FanCommand  ┌──────────────────┐
//! │  front end   │────────────▶│  control loop    │──▶ FanController
//! │  (submit)    │              │  (next_command)  │
//! └──────────────┘              └──────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Commands that external adapters can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FanCommand {
    /// Turn the fan on or off.
    SetPower(bool),
    /// Requested rotation speed as a duty percentage (0–100).
    SetSpeed(f32),
    /// Start or stop oscillation.
    SetOscillation(bool),
}

/// Channel depth for queued commands.
pub const COMMAND_DEPTH: usize = 4;

/// Inbound command channel: front end → control loop.
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, FanCommand, COMMAND_DEPTH> =
    Channel::new();

/// Queue a command without blocking.  Returns `false` if the queue is full.
pub fn submit(cmd: FanCommand) -> bool {
    COMMAND_CHANNEL.try_send(cmd).is_ok()
}

/// Block until the next command is available.
pub fn next_command() -> FanCommand {
    futures_lite::future::block_on(COMMAND_CHANNEL.receive())
}
