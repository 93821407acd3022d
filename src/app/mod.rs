//! Application core: the sensing service and the commanded-state
//! controller.
//!
//! All interaction with hardware happens through the **port traits** in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
pub mod service;
