//! One-shot driver initialisation that remembers its return code.

use std::sync::Once;
use std::sync::atomic::{AtomicI32, Ordering};

/// Runs an `esp_err_t`-returning init exactly once.  Every caller, not just
/// the first, sees the code that run produced.
pub struct InitOnce {
    once: Once,
    rc: AtomicI32,
}

impl InitOnce {
    pub const fn new() -> Self {
        Self {
            once: Once::new(),
            rc: AtomicI32::new(0),
        }
    }

    pub fn call(&self, init: impl FnOnce() -> i32) -> i32 {
        self.once.call_once(|| self.rc.store(init(), Ordering::Release));
        self.rc.load(Ordering::Acquire)
    }
}

impl Default for InitOnce {
    fn default() -> Self {
        Self::new()
    }
}
