use crate::store_traits::LedgerStore;
use cardpool_core::auction::Auction;
use cardpool_core::cards::Card;
use cardpool_core::error::StoreError;
use cardpool_core::events::Event;
use cardpool_core::fractions::FractionPool;
use cardpool_core::id::{AccountId, CardId};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// The full ledger state held by [`MemoryStore`].
///
/// Everything is serializable so the store can snapshot itself for rollback
/// and persist to a file between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    cards: BTreeMap<CardId, Card>,
    next_card_id: CardId,
    pools: BTreeMap<CardId, FractionPool>,
    auctions: BTreeMap<CardId, Auction>,
    cash: BTreeMap<AccountId, u128>,
    approvals: BTreeMap<(AccountId, AccountId), bool>,
    events: Vec<Event>,
}

/// In-memory ledger store with snapshot-based rollback and optional file
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, LedgerState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    /// Persist the current state to `path`.
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = self.snapshot()?;
        fs::write(path, bytes)?;
        log::debug!("ledger state saved to {}", path.display());
        Ok(())
    }

    /// Load a store from a file written by [`save_to_file`](Self::save_to_file).
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path)?;
        let state: LedgerState = bincode::deserialize(&bytes)?;
        Ok(Self {
            state: Mutex::new(state),
        })
    }
}

impl LedgerStore for MemoryStore {
    fn get_card(&self, id: CardId) -> Result<Option<Card>, StoreError> {
        Ok(self.state()?.cards.get(&id).cloned())
    }

    fn put_card(&self, card: Card) -> Result<(), StoreError> {
        self.state()?.cards.insert(card.id, card);
        Ok(())
    }

    fn find_card_by_identity(
        &self,
        name: &str,
        serial: u64,
    ) -> Result<Option<CardId>, StoreError> {
        let state = self.state()?;
        Ok(state
            .cards
            .values()
            .find(|card| card.name == name && card.serial == serial)
            .map(|card| card.id))
    }

    fn allocate_card_id(&self) -> Result<CardId, StoreError> {
        let mut state = self.state()?;
        let id = state.next_card_id;
        state.next_card_id += 1;
        Ok(id)
    }

    fn card_count(&self) -> Result<u64, StoreError> {
        Ok(self.state()?.next_card_id)
    }

    fn get_pool(&self, card_id: CardId) -> Result<Option<FractionPool>, StoreError> {
        Ok(self.state()?.pools.get(&card_id).cloned())
    }

    fn put_pool(&self, pool: FractionPool) -> Result<(), StoreError> {
        self.state()?.pools.insert(pool.card_id, pool);
        Ok(())
    }

    fn get_auction(&self, card_id: CardId) -> Result<Option<Auction>, StoreError> {
        Ok(self.state()?.auctions.get(&card_id).cloned())
    }

    fn put_auction(&self, auction: Auction) -> Result<(), StoreError> {
        self.state()?.auctions.insert(auction.card_id, auction);
        Ok(())
    }

    fn remove_auction(&self, card_id: CardId) -> Result<bool, StoreError> {
        Ok(self.state()?.auctions.remove(&card_id).is_some())
    }

    fn cash_balance(&self, account: &AccountId) -> Result<u128, StoreError> {
        Ok(self.state()?.cash.get(account).copied().unwrap_or(0))
    }

    fn set_cash_balance(&self, account: &AccountId, amount: u128) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if amount == 0 {
            state.cash.remove(account);
        } else {
            state.cash.insert(*account, amount);
        }
        Ok(())
    }

    fn is_approved(&self, holder: &AccountId, operator: &AccountId) -> Result<bool, StoreError> {
        Ok(self
            .state()?
            .approvals
            .get(&(*holder, *operator))
            .copied()
            .unwrap_or(false))
    }

    fn set_approval(
        &self,
        holder: &AccountId,
        operator: &AccountId,
        approved: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if approved {
            state.approvals.insert((*holder, *operator), true);
        } else {
            state.approvals.remove(&(*holder, *operator));
        }
        Ok(())
    }

    fn append_event(&self, event: Event) -> Result<(), StoreError> {
        self.state()?.events.push(event);
        Ok(())
    }

    fn events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.state()?.events.clone())
    }

    fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let state = self.state()?;
        Ok(bincode::serialize(&*state)?)
    }

    fn restore(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let restored: LedgerState = bincode::deserialize(bytes)?;
        *self.state()? = restored;
        Ok(())
    }
}
