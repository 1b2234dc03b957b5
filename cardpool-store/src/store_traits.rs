use cardpool_core::auction::Auction;
use cardpool_core::cards::Card;
use cardpool_core::error::StoreError;
use cardpool_core::events::Event;
use cardpool_core::fractions::FractionPool;
use cardpool_core::id::{AccountId, CardId};

use std::fmt::Debug;

/// Repository interface for all ledger state.
///
/// Implementations must make each individual method atomic; whole-operation
/// atomicity is layered on top through [`snapshot`](LedgerStore::snapshot) /
/// [`restore`](LedgerStore::restore), which the engine uses to roll every
/// mutation of a failed operation back.
pub trait LedgerStore: Send + Sync + Debug {
    // ---- Cards ----

    /// Fetch a card by id.
    fn get_card(&self, id: CardId) -> Result<Option<Card>, StoreError>;

    /// Insert or replace a card record.
    fn put_card(&self, card: Card) -> Result<(), StoreError>;

    /// Look up a card by its `(name, serial)` uniqueness key.
    fn find_card_by_identity(&self, name: &str, serial: u64)
        -> Result<Option<CardId>, StoreError>;

    /// Allocate the next sequential card id.
    fn allocate_card_id(&self) -> Result<CardId, StoreError>;

    /// Number of cards ever minted.
    fn card_count(&self) -> Result<u64, StoreError>;

    // ---- Fraction pools ----

    fn get_pool(&self, card_id: CardId) -> Result<Option<FractionPool>, StoreError>;

    fn put_pool(&self, pool: FractionPool) -> Result<(), StoreError>;

    // ---- Auctions ----

    fn get_auction(&self, card_id: CardId) -> Result<Option<Auction>, StoreError>;

    fn put_auction(&self, auction: Auction) -> Result<(), StoreError>;

    /// Remove a resolved auction instance. Returns whether one existed.
    fn remove_auction(&self, card_id: CardId) -> Result<bool, StoreError>;

    // ---- Cash ledger ----

    /// Escrowed wei balance of an account.
    fn cash_balance(&self, account: &AccountId) -> Result<u128, StoreError>;

    fn set_cash_balance(&self, account: &AccountId, amount: u128) -> Result<(), StoreError>;

    // ---- Transfer-proxy approvals ----

    /// Whether `holder` has approved `operator` to move its fractions.
    fn is_approved(&self, holder: &AccountId, operator: &AccountId) -> Result<bool, StoreError>;

    fn set_approval(
        &self,
        holder: &AccountId,
        operator: &AccountId,
        approved: bool,
    ) -> Result<(), StoreError>;

    // ---- Event log ----

    /// Append an event to the ordered log.
    fn append_event(&self, event: Event) -> Result<(), StoreError>;

    /// The full event log, oldest first.
    fn events(&self) -> Result<Vec<Event>, StoreError>;

    // ---- Whole-state atomicity ----

    /// Serialize the entire ledger state.
    fn snapshot(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the entire ledger state with a previously taken snapshot.
    fn restore(&self, bytes: &[u8]) -> Result<(), StoreError>;
}
