//! FanSense firmware: main entry point.
//!
//! Passive state sensing and button emulation for a tower fan.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspGpio (GpioPort)   SystemClock (Clock)   LogEventSink       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  FanService: motor · power · oscillation monitors      │    │
//! │  │  FanController: button convergence loops               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use fansense::adapters::log_sink::LogEventSink;
use fansense::adapters::time::SystemClock;
use fansense::app::commands;
use fansense::app::service::FanService;
use fansense::config::FanConfig;
use fansense::drivers::gpio::EspGpio;

/// Optional JSON override baked in at build time.
const CONFIG_OVERRIDE: Option<&str> = option_env!("FANSENSE_CONFIG_JSON");

fn load_config() -> FanConfig {
    let Some(json) = CONFIG_OVERRIDE else {
        return FanConfig::default();
    };
    match FanConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config override applied");
            cfg
        }
        Err(e) => {
            warn!("Config override rejected ({}), using defaults", e);
            FanConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let config = load_config();
    info!("╔══════════════════════════════════════╗");
    info!("║  FanSense v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!(
        "{} / {} {} (s/n {})",
        config.device.name, config.device.manufacturer, config.device.model,
        config.device.serial_number
    );

    // ── 2. Sensing engine ─────────────────────────────────────
    let service = FanService::new(
        config,
        Arc::new(EspGpio::new()),
        Arc::new(SystemClock::new()),
        Arc::new(LogEventSink::new()),
    )?;
    service.start()?;

    // ── 3. Command loop ───────────────────────────────────────
    let mut controller = service.controller(esp_idf_hal::delay::FreeRtos);
    info!("Ready, waiting for commands");
    loop {
        let cmd = commands::next_command();
        info!("Command: {:?}", cmd);
        if let Err(e) = controller.handle_command(cmd) {
            warn!("Command {:?} failed: {}", cmd, e);
        }
        info!("State: {:?}", controller.snapshot());
    }
}
