//! Seam to the underlying non-fungible token ledger.
//!
//! The ledger owns token ownership, balances and id sequencing; the engine
//! only authorizes and accounts for mints. Three operations cross the seam.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use tracing::debug;

use mintgate_core::error::EngineError;
use mintgate_core::types::{Address, TokenId};

/// The ledger operations the engine consumes.
///
/// `mint_to` must be atomic: on error no token may have been created, so an
/// aborted engine transaction leaves the ledger exactly as it found it.
pub trait TokenLedger: Send + Sync {
    /// Allocate a contiguous block of `quantity` fresh token ids to
    /// `recipient`, returning the first id of the block.
    fn mint_to(&self, recipient: &Address, quantity: u32) -> Result<TokenId, EngineError>;

    fn balance_of(&self, owner: &Address) -> u32;

    fn exists(&self, token_id: TokenId) -> bool;
}

// ── InMemoryLedger ───────────────────────────────────────────────────────────

/// Reference ledger for tests and single-process hosts. Token ids are
/// sequential starting at 1.
pub struct InMemoryLedger {
    inner: Mutex<LedgerInner>,
}

struct LedgerInner {
    owners: BTreeMap<TokenId, Address>,
    balances: HashMap<Address, u32>,
    next_id: TokenId,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                owners: BTreeMap::new(),
                balances: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn owner_of(&self, token_id: TokenId) -> Option<Address> {
        self.lock().owners.get(&token_id).copied()
    }

    pub fn total_supply(&self) -> u32 {
        self.lock().owners.len() as u32
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenLedger for InMemoryLedger {
    fn mint_to(&self, recipient: &Address, quantity: u32) -> Result<TokenId, EngineError> {
        let mut inner = self.lock();
        let first = inner.next_id;
        for offset in 0..quantity as TokenId {
            let id = first + offset;
            inner.owners.insert(id, *recipient);
            debug!(token_id = id, to = %recipient, "transfer");
        }
        inner.next_id += quantity as TokenId;
        *inner.balances.entry(*recipient).or_insert(0) += quantity;
        Ok(first)
    }

    fn balance_of(&self, owner: &Address) -> u32 {
        self.lock().balances.get(owner).copied().unwrap_or(0)
    }

    fn exists(&self, token_id: TokenId) -> bool {
        self.lock().owners.contains_key(&token_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_contiguous_blocks() {
        let ledger = InMemoryLedger::new();
        let a = Address::from_bytes([1u8; 20]);
        let b = Address::from_bytes([2u8; 20]);

        assert_eq!(ledger.mint_to(&a, 3).unwrap(), 1);
        assert_eq!(ledger.mint_to(&b, 2).unwrap(), 4);
        assert_eq!(ledger.balance_of(&a), 3);
        assert_eq!(ledger.balance_of(&b), 2);
        assert_eq!(ledger.total_supply(), 5);
        assert_eq!(ledger.owner_of(4), Some(b));
        assert!(ledger.exists(5));
        assert!(!ledger.exists(6));
    }

    #[test]
    fn zero_quantity_mints_nothing() {
        let ledger = InMemoryLedger::new();
        let a = Address::from_bytes([1u8; 20]);
        assert_eq!(ledger.mint_to(&a, 0).unwrap(), 1);
        assert_eq!(ledger.balance_of(&a), 0);
        assert!(!ledger.exists(1));
    }
}
