// Single-flight gate: at most one strike evaluation in flight per worker.
// Acquisition never waits; a busy gate means the event is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct StrikeGate {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one strike; releases the gate on drop
#[derive(Debug)]
pub struct GatePermit {
    busy: Arc<AtomicBool>,
}

impl StrikeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
