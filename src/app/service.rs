//! Fan service: the hexagonal core.
//!
//! [`FanService`] owns the configuration, the edge queues and the sensed
//! state, and wires them to the injected ports.  Starting it attaches the
//! interrupt handlers and spawns the three monitor tasks; from then on the
//! sensed state updates itself and every transition is reported through
//! the [`EventSink`].
//!
//! ```text
//!   GpioPort (ISR) ──▶ EdgeQueues ──▶ motor / oscillation tasks ──┐
//!   Clock ───────────▶ power task ───────────────────────────────┼──▶ SensedState
//!                                                                  └──▶ EventSink
//!   FanController ──▶ GpioPort (button presses), reads SensedState
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::{ConfigError, FanConfig};
use crate::drivers::task_pin::{self, Core, TaskSpec};
use crate::error::{Error, Result};
use crate::events::{EdgeQueues, PulseEvent};
use crate::sensors::SensedState;
use crate::sensors::motor::{self, MotorDecoder};
use crate::sensors::oscillation::{self, OscillationMonitor};
use crate::sensors::power::{self, PowerMonitor};

use super::controller::FanController;
use super::events::{FanEvent, FanSnapshot};
use super::ports::{Clock, Edge, EventSink, GpioPort, LineId, PinMode};

/// Motor decoding is the only latency-sensitive consumer.
pub const MOTOR_TASK: TaskSpec = TaskSpec {
    name: "fan-motor\0",
    core: Core::App,
    priority: 3,
    stack_kb: 8,
};

pub const POWER_TASK: TaskSpec = TaskSpec {
    name: "fan-power\0",
    core: Core::App,
    priority: 2,
    stack_kb: 8,
};

pub const OSCILLATION_TASK: TaskSpec = TaskSpec {
    name: "fan-osc\0",
    core: Core::App,
    priority: 2,
    stack_kb: 8,
};

/// The sensing engine and its wiring.
pub struct FanService<G, C, S> {
    config: FanConfig,
    gpio: Arc<G>,
    clock: Arc<C>,
    sink: Arc<S>,
    state: Arc<SensedState>,
    queues: Arc<EdgeQueues>,
    started: AtomicBool,
}

impl<G, C, S> FanService<G, C, S>
where
    G: GpioPort + 'static,
    C: Clock + 'static,
    S: EventSink + 'static,
{
    /// Validate `config` and build an idle service.  Nothing touches the
    /// hardware until [`start`](Self::start).
    pub fn new(config: FanConfig, gpio: Arc<G>, clock: Arc<C>, sink: Arc<S>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            gpio,
            clock,
            sink,
            state: Arc::new(SensedState::new()),
            queues: Arc::new(EdgeQueues::new()),
            started: AtomicBool::new(false),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Release the buttons, attach the edge handlers and spawn the monitor
    /// tasks.  May only succeed once; a failed start is not retried.
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ConfigError::AlreadyStarted.into());
        }
        let cfg = &self.config;

        for line in [
            cfg.power_button_line,
            cfg.speed_button_line,
            cfg.oscillate_button_line,
        ] {
            self.gpio.enable(line, PinMode::Input)?;
        }

        for line in [cfg.motor_high_line, cfg.motor_medium_line] {
            self.attach(line, |q, e| q.motor.push_from_isr(e))?;
        }
        self.attach(cfg.oscillation_line, |q, e| q.oscillation.push_from_isr(e))?;

        self.spawn_monitors()?;

        let snapshot = self.state.snapshot();
        self.sink.emit(&FanEvent::Started(snapshot));
        info!(
            "fan service started (motor H={} M={}, osc={})",
            cfg.motor_high_line, cfg.motor_medium_line, cfg.oscillation_line
        );
        Ok(())
    }

    /// Configure `line` as an input and timestamp its falling edges into
    /// the queue chosen by `push`.
    fn attach(&self, line: LineId, push: fn(&EdgeQueues, PulseEvent) -> bool) -> Result<()> {
        self.gpio.enable(line, PinMode::Input)?;
        let clock = Arc::clone(&self.clock);
        let queues = Arc::clone(&self.queues);
        self.gpio.set_edge_interrupt(
            line,
            Edge::Falling,
            Box::new(move |source| {
                let event = PulseEvent {
                    timestamp_us: clock.now_us(),
                    source,
                };
                push(&queues, event);
            }),
        )?;
        Ok(())
    }

    fn spawn_monitors(&self) -> Result<()> {
        let cfg = &self.config;

        let decoder = MotorDecoder::new(
            cfg.motor_medium_line,
            cfg.motor_high_line,
            cfg.pulse_length_us,
        );
        let (queues, state, sink) = self.task_handles();
        spawn(MOTOR_TASK, move || {
            motor::run(&queues.motor, decoder, &state, &sink)
        })?;

        let monitor = PowerMonitor::new(cfg.power_timeout_us);
        let poll = Duration::from_millis(u64::from(cfg.power_poll_ms));
        let clock = Arc::clone(&self.clock);
        let (_, state, sink) = self.task_handles();
        spawn(POWER_TASK, move || {
            power::run(monitor, poll, &clock, &state, &sink)
        })?;

        let poll = Duration::from_millis(u64::from(cfg.oscillation_poll_ms));
        let (queues, state, sink) = self.task_handles();
        spawn(OSCILLATION_TASK, move || {
            oscillation::run(&queues.oscillation, OscillationMonitor::new(), poll, &state, &sink)
        })?;

        Ok(())
    }

    fn task_handles(&self) -> (Arc<EdgeQueues>, Arc<SensedState>, Arc<S>) {
        (
            Arc::clone(&self.queues),
            Arc::clone(&self.state),
            Arc::clone(&self.sink),
        )
    }

    // ── Accessors ─────────────────────────────────────────────

    /// A controller sharing this service's GPIO and sensed state.
    pub fn controller<D: DelayNs>(&self, delay: D) -> FanController<Arc<G>, D> {
        FanController::new(
            &self.config,
            Arc::clone(&self.gpio),
            delay,
            Arc::clone(&self.state),
        )
    }

    pub fn state(&self) -> &Arc<SensedState> {
        &self.state
    }

    pub fn queues(&self) -> &Arc<EdgeQueues> {
        &self.queues
    }

    pub fn config(&self) -> &FanConfig {
        &self.config
    }

    pub fn snapshot(&self) -> FanSnapshot {
        self.state.snapshot()
    }
}

fn spawn(spec: TaskSpec, f: impl FnOnce() + Send + 'static) -> Result<()> {
    task_pin::spawn_on_core(spec, f).map_err(|e| {
        warn!("spawn of '{}' failed: {}", spec.display_name(), e);
        Error::Spawn(spec.display_name())
    })?;
    Ok(())
}
