use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use mintgate_core::error::EngineError;

/// Single-entry latch over every mutating mint path. Held across the value
/// transfers that hand control to external code; a re-entering call observes
/// the latch and fails instead of recursing into half-applied state.
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self {
            entered: AtomicBool::new(false),
        }
    }

    /// Acquire the latch. The returned entry releases it on drop, error paths
    /// included.
    pub fn enter(&self) -> Result<GuardEntry<'_>, EngineError> {
        if self.entered.swap(true, Ordering::SeqCst) {
            warn!("reentrant call rejected");
            return Err(EngineError::Reentrancy);
        }
        Ok(GuardEntry(&self.entered))
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GuardEntry<'a>(&'a AtomicBool);

impl Drop for GuardEntry<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
