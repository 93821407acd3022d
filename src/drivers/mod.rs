//! Actuator drivers, the ESP-IDF GPIO backend, and task spawning.

pub mod button;
#[cfg(feature = "espidf")]
pub mod gpio;
pub mod init_once;
pub mod task_pin;
