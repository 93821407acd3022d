//! Full sensing engine against mock hardware: real monitor threads, edges
//! injected by hand through the registered interrupt handlers.

use std::sync::Arc;
use std::time::Duration;

use fansense::app::events::{FanEvent, FanSnapshot};
use fansense::app::ports::{LineId, PinMode};
use fansense::app::service::FanService;
use fansense::config::FanConfig;
use fansense::pins;
use fansense::speed::SpeedLevel;

use crate::mock_hw::{CLOCK_START_US, MockClock, MockGpio, RecordingSink};

const WAIT: Duration = Duration::from_secs(2);

struct Rig {
    gpio: Arc<MockGpio>,
    clock: Arc<MockClock>,
    sink: Arc<RecordingSink>,
    service: FanService<MockGpio, MockClock, RecordingSink>,
}

fn started_rig() -> Rig {
    let gpio = Arc::new(MockGpio::new());
    let clock = Arc::new(MockClock::new());
    let sink = Arc::new(RecordingSink::new());
    let service = FanService::new(
        FanConfig::default(),
        gpio.clone(),
        clock.clone(),
        sink.clone(),
    )
    .unwrap();
    service.start().unwrap();
    Rig {
        gpio,
        clock,
        sink,
        service,
    }
}

impl Rig {
    /// Fire one motor edge at `ts`, pacing so the queue never overflows.
    fn edge_at(&self, line: LineId, ts: u32) {
        let queue = &self.service.queues().motor;
        while queue.len() >= queue.capacity() {
            std::thread::sleep(Duration::from_micros(200));
        }
        self.clock.set(ts);
        self.gpio.fire(line);
    }

    /// `trains` trains of `n` edges, each opened by a 16 ms gap, plus a
    /// final closing edge.  Returns the closing timestamp.
    fn stream(&self, line: LineId, start: u32, trains: u32, n: u32) -> u32 {
        let mut ts = start;
        for _ in 0..trains {
            ts += 16_000;
            self.edge_at(line, ts);
            for _ in 1..n {
                ts += 1_000;
                self.edge_at(line, ts);
            }
        }
        ts += 16_000;
        self.edge_at(line, ts);
        ts
    }

    /// `n` edges 1 ms apart from `start`, then one closing edge after a
    /// 16 ms gap.  Returns the closing timestamp.
    fn train(&self, line: LineId, start: u32, n: u32) -> u32 {
        let mut ts = start;
        for _ in 0..n {
            self.edge_at(line, ts);
            ts += 1_000;
        }
        let close = ts - 1_000 + 16_000;
        self.edge_at(line, close);
        close
    }

    fn speed_event(level: u8) -> FanEvent {
        FanEvent::speed_changed(SpeedLevel::new(level).unwrap())
    }
}

#[test]
fn start_releases_buttons_and_reports_initial_state() {
    let rig = started_rig();
    for line in [
        pins::POWER_BUTTON_GPIO,
        pins::SPEED_BUTTON_GPIO,
        pins::OSCILLATE_BUTTON_GPIO,
        pins::MOTOR_HIGH_GPIO,
        pins::MOTOR_MEDIUM_GPIO,
        pins::OSCILLATION_GPIO,
    ] {
        assert_eq!(rig.gpio.last_mode(line), Some(PinMode::Input));
    }
    assert!(rig.gpio.has_handler(pins::MOTOR_HIGH_GPIO));
    assert!(rig.gpio.has_handler(pins::MOTOR_MEDIUM_GPIO));
    assert!(rig.gpio.has_handler(pins::OSCILLATION_GPIO));
    assert!(!rig.gpio.has_handler(pins::SPEED_BUTTON_GPIO));
    assert_eq!(
        rig.sink.all().first(),
        Some(&FanEvent::Started(FanSnapshot::new(false, 0, false)))
    );
}

#[test]
fn medium_train_of_six_reports_lowest_speed() {
    let rig = started_rig();
    rig.train(pins::MOTOR_MEDIUM_GPIO, CLOCK_START_US, 6);

    let expected = Rig::speed_event(1);
    assert!(rig.sink.wait_for(&expected, WAIT));
    assert_eq!(
        expected,
        FanEvent::SpeedChanged {
            level: SpeedLevel::new(1).unwrap(),
            duty: 12.5
        }
    );
    assert_eq!(rig.service.snapshot().speed_level, 1);
}

#[test]
fn high_train_of_nine_reports_speed_seven() {
    let rig = started_rig();
    rig.train(pins::MOTOR_HIGH_GPIO, CLOCK_START_US, 9);

    let expected = Rig::speed_event(7);
    assert!(rig.sink.wait_for(&expected, WAIT));
    assert!((rig.service.snapshot().speed_duty - 87.5).abs() < f32::EPSILON);
}

#[test]
fn repeated_trains_notify_once() {
    let rig = started_rig();
    rig.stream(pins::MOTOR_HIGH_GPIO, CLOCK_START_US, 8, 6);
    let expected = Rig::speed_event(6);
    assert!(rig.sink.wait_for(&expected, WAIT));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(rig.sink.count(&expected), 1);
}

#[test]
fn silence_after_activity_turns_power_off() {
    let rig = started_rig();
    let last = rig.train(pins::MOTOR_MEDIUM_GPIO, CLOCK_START_US, 6);
    assert!(rig.sink.wait_for(&FanEvent::PowerChanged(true), WAIT));

    rig.clock.set(last + 410_000);
    assert!(rig.sink.wait_for(&FanEvent::PowerChanged(false), WAIT));
    assert!(!rig.service.snapshot().powered);
    assert_eq!(rig.sink.count(&FanEvent::PowerChanged(true)), 1);
}

#[test]
fn oscillation_follows_edge_presence() {
    let rig = started_rig();
    rig.gpio.fire(pins::OSCILLATION_GPIO);
    assert!(rig.sink.wait_for(&FanEvent::OscillationChanged(true), WAIT));
    assert!(rig.service.snapshot().oscillating);

    // No more edges: the next quiet interval reports it stopped.
    assert!(rig.sink.wait_for(&FanEvent::OscillationChanged(false), WAIT));
    assert_eq!(rig.sink.count(&FanEvent::OscillationChanged(true)), 1);
}
