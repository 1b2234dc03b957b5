use crate::error::LedgerError;
use crate::id::CardId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Hands out exclusive per-card guards.
///
/// Every mutating engine operation on a card holds its guard for the whole
/// operation, so a re-entrant call against the same card fails fast instead
/// of observing intermediate state. Cross-card operations are independent.
#[derive(Debug, Default)]
pub struct CardLockManager {
    held: Mutex<HashSet<CardId>>,
}

impl CardLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive guard for `card_id`.
    ///
    /// Fails with `CardBusy` when another operation already holds the card.
    pub fn lock(self: &Arc<Self>, card_id: CardId) -> Result<CardLockGuard, LedgerError> {
        let mut held = self
            .held
            .lock()
            .map_err(|e| LedgerError::Store(crate::error::StoreError::Poisoned(e.to_string())))?;

        if !held.insert(card_id) {
            return Err(LedgerError::CardBusy(card_id));
        }

        Ok(CardLockGuard {
            card_id,
            manager: Arc::clone(self),
        })
    }
}

/// Guard that holds the per-card lock until it is dropped.
#[derive(Debug)]
pub struct CardLockGuard {
    card_id: CardId,

    manager: Arc<CardLockManager>,
}

impl Drop for CardLockGuard {
    fn drop(&mut self) {
        if let Ok(mut held) = self.manager.held.lock() {
            held.remove(&self.card_id);
        }
    }
}
