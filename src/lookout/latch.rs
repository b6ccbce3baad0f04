//! Rain-event latch, set from the rain sensor's interrupt line.
//!
//! Set-and-consume: any number of edges before the next lookout cycle
//! collapse into one event, and the cycle that takes it clears it.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct RainEventLatch {
    pending: AtomicBool,
}

impl Default for RainEventLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl RainEventLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Record a rain edge.  Lock-free, callable from ISR context.
    pub fn signal(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending event, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
