//! Mock hardware adapters for integration tests.
//!
//! `MockGpio` records every pin call and keeps the registered edge handlers
//! so tests can fire interrupts by hand.  `FanSim` goes one step further
//! and plays the fan itself: it streams motor pulse trains for its current
//! speed and reacts to emulated button presses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use fansense::app::events::FanEvent;
use fansense::app::ports::{Clock, Edge, EdgeHandler, EventSink, GpioPort, Level, LineId, PinMode};
use fansense::error::GpioError;
use fansense::events::EdgeQueues;
use fansense::pins;

/// Boot offset for the mock clock, well past any activity timeout.
pub const CLOCK_START_US: u32 = 10_000_000;

// ── MockClock ─────────────────────────────────────────────────

pub struct MockClock {
    now: AtomicU32,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            now: AtomicU32::new(CLOCK_START_US),
        }
    }

    pub fn set(&self, us: u32) {
        self.now.store(us, Ordering::SeqCst);
    }

    /// Move time forward, returning the new reading.
    pub fn advance(&self, us: u32) -> u32 {
        self.now.fetch_add(us, Ordering::SeqCst).wrapping_add(us)
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

// ── MockGpio ──────────────────────────────────────────────────

pub type PressHook = Box<dyn Fn(LineId) + Send + Sync>;

#[derive(Default)]
pub struct MockGpio {
    pub modes: Mutex<Vec<(LineId, PinMode)>>,
    pub presses: Mutex<Vec<LineId>>,
    handlers: Mutex<HashMap<LineId, EdgeHandler>>,
    on_press: Mutex<Option<PressHook>>,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the handler registered on `line`, as the ISR would.
    pub fn fire(&self, line: LineId) {
        let handlers = self.handlers.lock().unwrap();
        let handler = handlers
            .get(&line)
            .unwrap_or_else(|| panic!("no handler on {line}"));
        handler(line);
    }

    pub fn has_handler(&self, line: LineId) -> bool {
        self.handlers.lock().unwrap().contains_key(&line)
    }

    /// Called with the line every time a button is driven low.
    pub fn set_press_hook(&self, hook: PressHook) {
        *self.on_press.lock().unwrap() = Some(hook);
    }

    pub fn presses_of(&self, line: LineId) -> usize {
        self.presses.lock().unwrap().iter().filter(|&&l| l == line).count()
    }

    pub fn last_mode(&self, line: LineId) -> Option<PinMode> {
        self.modes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(l, _)| *l == line)
            .map(|&(_, m)| m)
    }
}

impl GpioPort for MockGpio {
    fn enable(&self, line: LineId, mode: PinMode) -> Result<(), GpioError> {
        self.modes.lock().unwrap().push((line, mode));
        Ok(())
    }

    fn write(&self, line: LineId, level: Level) -> Result<(), GpioError> {
        if level == Level::Low {
            self.presses.lock().unwrap().push(line);
            if let Some(hook) = self.on_press.lock().unwrap().as_ref() {
                hook(line);
            }
        }
        Ok(())
    }

    fn read(&self, _line: LineId) -> Result<Level, GpioError> {
        Ok(Level::High)
    }

    fn set_edge_interrupt(
        &self,
        line: LineId,
        _edge: Edge,
        handler: EdgeHandler,
    ) -> Result<(), GpioError> {
        self.handlers.lock().unwrap().insert(line, handler);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<FanEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<FanEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Poll until an event equal to `expected` has been recorded.
    pub fn wait_for(&self, expected: &FanEvent, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.events.lock().unwrap().contains(expected) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    pub fn count(&self, expected: &FanEvent) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == expected).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &FanEvent) {
        self.events.lock().unwrap().push(*event);
    }
}

// ── NoopDelay ─────────────────────────────────────────────────

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── FanSim ────────────────────────────────────────────────────

/// Edge spacing inside a train.
const EDGE_SPACING_US: u32 = 1_000;
/// Skipped-pulse gap between trains.
const TRAIN_GAP_US: u32 = 16_000;

/// Edges per train for each speed, `None` for the gapless top speed.
fn train_for(level: u8) -> (LineId, Option<u32>) {
    match level {
        1 => (pins::MOTOR_MEDIUM_GPIO, Some(6)),
        2 => (pins::MOTOR_MEDIUM_GPIO, Some(9)),
        3 => (pins::MOTOR_MEDIUM_GPIO, Some(13)),
        4 => (pins::MOTOR_MEDIUM_GPIO, None),
        5 => (pins::MOTOR_HIGH_GPIO, Some(4)),
        6 => (pins::MOTOR_HIGH_GPIO, Some(6)),
        7 => (pins::MOTOR_HIGH_GPIO, Some(9)),
        _ => (pins::MOTOR_HIGH_GPIO, None),
    }
}

struct FanModel {
    powered: AtomicBool,
    level: AtomicU8,
    oscillating: AtomicBool,
    stop: AtomicBool,
}

/// A simulated fan wired to the mock GPIO on the default pins.
pub struct FanSim {
    model: Arc<FanModel>,
    worker: Option<JoinHandle<()>>,
}

#[allow(dead_code)]
impl FanSim {
    pub fn spawn(
        gpio: Arc<MockGpio>,
        clock: Arc<MockClock>,
        queues: Arc<EdgeQueues>,
        level: u8,
    ) -> Self {
        let model = Arc::new(FanModel {
            powered: AtomicBool::new(false),
            level: AtomicU8::new(level),
            oscillating: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        });

        let m = Arc::clone(&model);
        gpio.set_press_hook(Box::new(move |line| {
            if line == pins::POWER_BUTTON_GPIO {
                m.powered.fetch_xor(true, Ordering::SeqCst);
            } else if !m.powered.load(Ordering::SeqCst) {
                // Panel is dead while the fan is off.
            } else if line == pins::SPEED_BUTTON_GPIO {
                let next = m.level.load(Ordering::SeqCst) % 8 + 1;
                m.level.store(next, Ordering::SeqCst);
            } else if line == pins::OSCILLATE_BUTTON_GPIO {
                m.oscillating.fetch_xor(true, Ordering::SeqCst);
            }
        }));

        let m = Arc::clone(&model);
        let worker = std::thread::spawn(move || {
            while !m.stop.load(Ordering::SeqCst) {
                if m.powered.load(Ordering::SeqCst) {
                    let (line, edges) = train_for(m.level.load(Ordering::SeqCst));
                    for _ in 0..edges.unwrap_or(14) {
                        // Never overflow the motor queue.
                        while queues.motor.len() >= queues.motor.capacity() {
                            std::thread::sleep(Duration::from_micros(100));
                        }
                        clock.advance(EDGE_SPACING_US);
                        gpio.fire(line);
                    }
                    if edges.is_some() {
                        clock.advance(TRAIN_GAP_US);
                    }
                    if m.oscillating.load(Ordering::SeqCst) {
                        gpio.fire(pins::OSCILLATION_GPIO);
                    }
                } else {
                    clock.advance(25_000);
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        });

        Self {
            model,
            worker: Some(worker),
        }
    }

    pub fn turn_on(&self) {
        self.model.powered.store(true, Ordering::SeqCst);
    }

    pub fn level(&self) -> u8 {
        self.model.level.load(Ordering::SeqCst)
    }

    pub fn is_on(&self) -> bool {
        self.model.powered.load(Ordering::SeqCst)
    }

    pub fn is_oscillating(&self) -> bool {
        self.model.oscillating.load(Ordering::SeqCst)
    }
}

impl Drop for FanSim {
    fn drop(&mut self) {
        self.model.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
