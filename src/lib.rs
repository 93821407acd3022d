//! FanSense firmware library.
//!
//! Exposes the sensing engine and the controller for integration testing.
//! All ESP-IDF-specific code is guarded by the `espidf` feature within each
//! module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod pins;
pub mod sensors;
pub mod speed;
