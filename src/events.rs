//! Interrupt-to-task edge queues.
//!
//! Edge events are produced by GPIO ISRs and consumed by the sensing tasks:
//!
//! ```text
//! ┌─────────────┐   PulseEvent   ┌──────────────┐     ┌────────────────────┐
//! │ Motor H ISR │──────────────▶│              │     │                    │
//! │ Motor M ISR │──────────────▶│  motor queue │────▶│ motor decoder task │
//! └─────────────┘                └──────────────┘     └────────────────────┘
//! ┌─────────────┐   PulseEvent   ┌──────────────┐     ┌────────────────────┐
//! │ Osc ISR     │──────────────▶│  osc queue   │────▶│ oscillation task   │
//! └─────────────┘                └──────────────┘     └────────────────────┘
//! ```
//!
//! The producer side never blocks or allocates: the ring is a fixed
//! `heapless` deque guarded by a critical section, a full queue drops the
//! event and bumps a counter, and the consumer is woken through an
//! ISR-safe doorbell (a FreeRTOS task notification on the target).  No
//! consumer code ever runs in interrupt context.  Order is FIFO within one
//! queue; there is no ordering between the two queues.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Deque;

use crate::app::ports::LineId;

use self::doorbell::Doorbell;

/// Depth of the shared motor-line queue.  A pulse train is at most
/// 14 edges, and the decoder task runs at the highest monitor priority.
pub const MOTOR_QUEUE_DEPTH: usize = 10;

/// Depth of the oscillation queue.  Only the presence of an edge per poll
/// interval matters, so overflow here loses no information.
pub const OSCILLATION_QUEUE_DEPTH: usize = 2;

/// A timestamped falling edge on a sensed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    /// Clock reading at interrupt time (µs, wraps).
    pub timestamp_us: u32,
    /// Line that produced the edge.
    pub source: LineId,
}

/// Bounded hand-off from interrupt context to one consuming task.
pub struct EdgeQueue<const N: usize> {
    ring: Mutex<CriticalSectionRawMutex, RefCell<Deque<PulseEvent, N>>>,
    doorbell: Doorbell,
    dropped: AtomicU32,
}

impl<const N: usize> Default for EdgeQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EdgeQueue<N> {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Deque::new())),
            doorbell: Doorbell::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue an edge.  Safe to call from ISR context: never blocks,
    /// never allocates, never runs consumer code.  Returns `false` if the
    /// queue was full and the event was dropped.
    pub fn push_from_isr(&self, event: PulseEvent) -> bool {
        let stored = self
            .ring
            .lock(|ring| ring.borrow_mut().push_back(event).is_ok());
        if stored {
            self.doorbell.ring();
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        stored
    }

    /// Block the calling task until an edge is available.  Single consumer.
    pub fn receive_blocking(&self) -> PulseEvent {
        loop {
            if let Some(event) = self.try_receive() {
                return event;
            }
            self.doorbell.arm();
            // An edge pushed before arming rang nobody.
            if let Some(event) = self.try_receive() {
                return event;
            }
            self.doorbell.wait();
        }
    }

    /// Take the oldest edge, if any.
    pub fn try_receive(&self) -> Option<PulseEvent> {
        self.ring.lock(|ring| ring.borrow_mut().pop_front())
    }

    /// Empty the queue, returning how many edges were discarded.
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while self.try_receive().is_some() {
            n += 1;
        }
        n
    }

    /// Edges currently waiting.
    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events dropped on overflow since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(feature = "espidf")]
mod doorbell {
    use core::ffi::c_void;
    use core::num::NonZeroU32;
    use core::ptr;
    use core::sync::atomic::{AtomicPtr, Ordering};

    use esp_idf_hal::delay::BLOCK;
    use esp_idf_hal::task;

    /// Wakes the consuming FreeRTOS task through its notification slot.
    pub(super) struct Doorbell {
        waiter: AtomicPtr<c_void>,
    }

    impl Doorbell {
        pub(super) const fn new() -> Self {
            Self {
                waiter: AtomicPtr::new(ptr::null_mut()),
            }
        }

        pub(super) fn ring(&self) {
            let handle = self.waiter.load(Ordering::Acquire);
            if handle.is_null() {
                return;
            }
            // SAFETY: `handle` came from `task::current()` on the consumer
            // thread, which never exits.  Notifying from an ISR goes through
            // `xTaskGenericNotifyFromISR`.
            let _ = unsafe { task::notify_and_yield(handle.cast(), NonZeroU32::MIN) };
        }

        pub(super) fn arm(&self) {
            if let Some(handle) = task::current() {
                self.waiter.store(handle.cast(), Ordering::Release);
            }
        }

        /// Notifications latch, so a ring between `arm` and here is kept.
        pub(super) fn wait(&self) {
            let _ = task::wait_notification(BLOCK);
        }
    }
}

#[cfg(not(feature = "espidf"))]
mod doorbell {
    use std::sync::Mutex;
    use std::thread::{self, Thread};
    use std::time::Duration;

    /// Upper bound on one park; a missed unpark costs at most this.
    const PARK_LIMIT: Duration = Duration::from_millis(5);

    /// Host stand-in: unparks the consuming thread.
    pub(super) struct Doorbell {
        pub(super) waiter: Mutex<Option<Thread>>,
    }

    impl Doorbell {
        pub(super) const fn new() -> Self {
            Self {
                waiter: Mutex::new(None),
            }
        }

        /// Never waits: if the consumer holds the slot it is arming, and
        /// re-checks the ring right after.
        pub(super) fn ring(&self) {
            if let Some(waiter) = self.waiter.try_lock().ok().and_then(|w| w.clone()) {
                waiter.unpark();
            }
        }

        pub(super) fn arm(&self) {
            if let Ok(mut waiter) = self.waiter.lock() {
                *waiter = Some(thread::current());
            }
        }

        pub(super) fn wait(&self) {
            thread::park_timeout(PARK_LIMIT);
        }
    }
}

/// The two queues of one engine instance.
#[derive(Default)]
pub struct EdgeQueues {
    pub motor: EdgeQueue<MOTOR_QUEUE_DEPTH>,
    pub oscillation: EdgeQueue<OSCILLATION_QUEUE_DEPTH>,
}

impl EdgeQueues {
    pub const fn new() -> Self {
        Self {
            motor: EdgeQueue::new(),
            oscillation: EdgeQueue::new(),
        }
    }
}

/// Tracks an [`EdgeQueue::dropped`] counter and reports growth once.
#[derive(Debug, Default)]
pub struct DropWatch {
    seen: u32,
}

impl DropWatch {
    /// Newly dropped events since the last call, if any.
    pub fn poll(&mut self, dropped_total: u32) -> Option<u32> {
        let fresh = dropped_total.wrapping_sub(self.seen);
        self.seen = dropped_total;
        (fresh > 0).then_some(fresh)
    }
}
