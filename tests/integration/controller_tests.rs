//! Commanded setters closing the loop through a simulated fan: presses go
//! out through the mock GPIO, the simulated motor answers with pulse
//! trains, and the real monitor threads decode them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fansense::adapters::time::StdDelay;
use fansense::app::commands::FanCommand;
use fansense::app::service::FanService;
use fansense::config::FanConfig;
use fansense::error::{ActuationError, Button, Error};
use fansense::pins;

use crate::mock_hw::{FanSim, MockClock, MockGpio, NoopDelay, RecordingSink};

/// Generous retry delays: the monitors run on real threads.
fn sim_config() -> FanConfig {
    FanConfig {
        power_retry_ms: 300,
        oscillation_retry_ms: 300,
        speed_retry_ms: 150,
        button_press_ms: 1,
        ..FanConfig::default()
    }
}

struct Rig {
    gpio: Arc<MockGpio>,
    service: FanService<MockGpio, MockClock, RecordingSink>,
    sim: FanSim,
}

fn rig(config: FanConfig, level: u8) -> Rig {
    let gpio = Arc::new(MockGpio::new());
    let clock = Arc::new(MockClock::new());
    let sink = Arc::new(RecordingSink::new());
    let service = FanService::new(config, gpio.clone(), clock.clone(), sink).unwrap();
    service.start().unwrap();
    let sim = FanSim::spawn(gpio.clone(), clock, service.queues().clone(), level);
    Rig { gpio, service, sim }
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn set_speed_half_from_lowest_cycles_to_level_four() {
    let rig = rig(sim_config(), 1);
    rig.sim.turn_on();
    let state = rig.service.state().clone();
    assert!(wait_until(|| state.is_powered() && state.speed_level() == 1));

    let mut ctl = rig.service.controller(StdDelay);
    ctl.set_speed(50.0).unwrap();

    assert_eq!(rig.sim.level(), 4);
    assert_eq!(state.speed_level(), 4);
    assert_eq!(rig.gpio.presses_of(pins::SPEED_BUTTON_GPIO), 3);
    assert!((ctl.get_speed() - 50.0).abs() < f32::EPSILON);
}

#[test]
fn power_cycle_through_commands() {
    let rig = rig(sim_config(), 2);
    let mut ctl = rig.service.controller(StdDelay);

    ctl.handle_command(FanCommand::SetPower(true)).unwrap();
    assert!(rig.sim.is_on());
    assert!(ctl.get_power());

    ctl.handle_command(FanCommand::SetPower(false)).unwrap();
    assert!(!rig.sim.is_on());
    assert!(!ctl.get_power());
    assert_eq!(rig.gpio.presses_of(pins::POWER_BUTTON_GPIO), 2);
}

#[test]
fn speed_request_while_off_powers_on_first() {
    let rig = rig(sim_config(), 2);
    let mut ctl = rig.service.controller(StdDelay);

    ctl.set_speed(40.0).unwrap();

    assert!(rig.sim.is_on());
    assert_eq!(rig.sim.level(), 3);
    assert_eq!(rig.gpio.presses.lock().unwrap()[0], pins::POWER_BUTTON_GPIO);
}

#[test]
fn oscillation_converges() {
    let rig = rig(sim_config(), 1);
    let mut ctl = rig.service.controller(StdDelay);
    ctl.set_power(true).unwrap();

    ctl.set_oscillation(true).unwrap();

    assert!(rig.sim.is_oscillating());
    assert!(ctl.get_oscillation());
}

#[test]
fn unresponsive_fan_gives_up_after_budget() {
    // No simulation thread: nothing ever answers the presses.
    let gpio = Arc::new(MockGpio::new());
    let config = FanConfig {
        max_press_attempts: 3,
        ..FanConfig::default()
    };
    let service = FanService::new(
        config,
        gpio.clone(),
        Arc::new(MockClock::new()),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();
    service.start().unwrap();

    let mut ctl = service.controller(NoopDelay);
    assert_eq!(
        ctl.set_oscillation(true),
        Err(Error::Actuation(ActuationError::NotConverged {
            button: Button::Oscillate,
            attempts: 3
        }))
    );
    assert_eq!(gpio.presses_of(pins::OSCILLATE_BUTTON_GPIO), 3);
}
