//! Seam for outbound native-value transfers (refunds, withdrawal).
//!
//! A transfer hands control to code outside the engine; a hostile recipient
//! may call back in and is stopped by the reentrancy latch. An outlet error
//! aborts the surrounding mint or withdrawal.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use mintgate_core::error::EngineError;
use mintgate_core::types::{Address, Value};

pub trait ValueOutlet: Send + Sync {
    /// Deliver `amount` of native value to `to`.
    fn pay(&self, to: &Address, amount: Value) -> Result<(), EngineError>;
}

/// Credit-log outlet for tests and single-process hosts: accumulates payouts
/// per address.
pub struct InMemoryOutlet {
    credits: Mutex<HashMap<Address, Value>>,
}

impl InMemoryOutlet {
    pub fn new() -> Self {
        Self {
            credits: Mutex::new(HashMap::new()),
        }
    }

    /// Total value paid out to `addr` so far.
    pub fn credited(&self, addr: &Address) -> Value {
        self.credits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(addr)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for InMemoryOutlet {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueOutlet for InMemoryOutlet {
    fn pay(&self, to: &Address, amount: Value) -> Result<(), EngineError> {
        let mut credits = self.credits.lock().unwrap_or_else(|e| e.into_inner());
        *credits.entry(*to).or_insert(0) += amount;
        debug!(to = %to, amount, "value transfer");
        Ok(())
    }
}
