use cardpool_core::cards::Card;
use cardpool_core::clock::Clock;
use cardpool_core::config::ServiceConfig;
use cardpool_core::error::{LedgerError, StoreError};
use cardpool_core::events::Event;
use cardpool_core::fractions::FractionPool;
use cardpool_core::id::{AccountId, CardId};
use cardpool_core::locks::CardLockManager;
use cardpool_store::{LedgerStore, MemoryStore};

use std::sync::{Arc, Mutex};

/// The cardpool service: card registry, fraction ledger, sale layer and
/// shotgun auctions over one shared store.
///
/// Every mutating operation is all-or-nothing: the engine snapshots the store
/// before touching it and restores the snapshot when the operation fails, and
/// it holds the per-card lock for the whole operation so nothing observes
/// intermediate state.
#[derive(Debug)]
pub struct Cardpool<S: LedgerStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    locks: Arc<CardLockManager>,
    config: Mutex<ServiceConfig>,

    /// Registry custody account; holds whole cards and acts as the sale
    /// counterparty
    custody: AccountId,
    /// Operator identity fraction holders approve for sales
    vault: AccountId,
    /// Account holding fractions and cash locked for shotgun auctions
    pot: AccountId,
}

impl Cardpool<MemoryStore> {
    /// Convenience constructor over a fresh in-memory store.
    pub fn in_memory(config: ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(MemoryStore::new(), clock, config)
    }
}

impl<S: LedgerStore> Cardpool<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        Self {
            store: Arc::new(store),
            clock,
            locks: Arc::new(CardLockManager::new()),
            config: Mutex::new(config),
            custody: AccountId::derive(&[b"cardpool", b"custody"]),
            vault: AccountId::derive(&[b"cardpool", b"sale-vault"]),
            pot: AccountId::derive(&[b"cardpool", b"shotgun-pot"]),
        }
    }

    // ---- Accessors ----

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn admin(&self) -> Result<AccountId, LedgerError> {
        Ok(self.config()?.admin)
    }

    /// Account holding whole cards on behalf of the registry.
    pub fn custody_account(&self) -> AccountId {
        self.custody
    }

    /// Operator identity a holder must approve before selling fractions.
    pub fn sale_vault(&self) -> AccountId {
        self.vault
    }

    /// Operator identity a holder must approve before locking fractions
    /// into a shotgun auction.
    pub fn auction_pot(&self) -> AccountId {
        self.pot
    }

    pub(crate) fn config(&self) -> Result<ServiceConfig, LedgerError> {
        Ok(self
            .config
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?
            .clone())
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now()
    }

    // ---- Admin gating ----

    pub(crate) fn require_admin(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if *caller != self.admin()? {
            log::warn!("rejected admin-gated call from {caller}");
            return Err(LedgerError::NotAdmin);
        }
        Ok(())
    }

    /// Hand the admin role to `new_admin`. Audited through `AdminChanged`.
    pub fn change_admin(
        &self,
        caller: &AccountId,
        new_admin: AccountId,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if new_admin.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }

        let previous = {
            let mut config = self
                .config
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            let previous = config.admin;
            config.admin = new_admin;
            previous
        };

        self.emit(Event::AdminChanged {
            previous,
            current: new_admin,
        })?;
        Ok(())
    }

    // ---- Atomicity helpers ----

    /// Run `f` with whole-operation rollback: on error the store is restored
    /// to the snapshot taken before `f` ran.
    pub(crate) fn atomically<T>(
        &self,
        f: impl FnOnce() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let snapshot = self.store.snapshot()?;
        match f() {
            Ok(value) => Ok(value),
            Err(err) => {
                self.store.restore(&snapshot)?;
                Err(err)
            }
        }
    }

    /// [`atomically`](Self::atomically) plus the exclusive per-card guard,
    /// held for the whole operation.
    pub(crate) fn with_card<T>(
        &self,
        card_id: CardId,
        f: impl FnOnce() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let _guard = self.locks.lock(card_id)?;
        self.atomically(f)
    }

    // ---- Shared lookups ----

    pub(crate) fn require_card(&self, card_id: CardId) -> Result<Card, LedgerError> {
        self.store
            .get_card(card_id)?
            .ok_or(LedgerError::UnknownCard(card_id))
    }

    pub(crate) fn require_pool(&self, card_id: CardId) -> Result<FractionPool, LedgerError> {
        self.store
            .get_pool(card_id)?
            .ok_or(LedgerError::NotFractionalized(card_id))
    }

    /// Like [`require_pool`](Self::require_pool), but rejects pools whose
    /// underlying card has already been withdrawn. A withdrawn pool persists
    /// for historical balance queries only; its shares no longer move.
    pub(crate) fn require_live_pool(&self, card_id: CardId) -> Result<FractionPool, LedgerError> {
        let pool = self.require_pool(card_id)?;
        if pool.withdrawn {
            return Err(LedgerError::NotFractionalized(card_id));
        }
        Ok(pool)
    }

    // ---- Cash ledger ----

    /// Credit external funds to an account, e.g. a buyer topping up before a
    /// purchase.
    pub fn deposit(&self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        if account.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.credit(account, amount)
    }

    pub fn cash_balance_of(&self, account: &AccountId) -> Result<u128, LedgerError> {
        Ok(self.store.cash_balance(account)?)
    }

    pub(crate) fn credit(&self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let balance = self.store.cash_balance(account)?;
        let updated = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.store.set_cash_balance(account, updated)?;
        Ok(())
    }

    pub(crate) fn debit(&self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let balance = self.store.cash_balance(account)?;
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                provided: balance,
            });
        }
        self.store.set_cash_balance(account, balance - amount)?;
        Ok(())
    }

    pub(crate) fn move_value(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    // ---- Transfer-proxy approvals ----

    /// Grant or revoke `operator`'s right to move `holder`'s fractions.
    pub fn set_approval_for_all(
        &self,
        holder: &AccountId,
        operator: &AccountId,
        approved: bool,
    ) -> Result<(), LedgerError> {
        if holder.is_zero() || operator.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        Ok(self.store.set_approval(holder, operator, approved)?)
    }

    pub fn is_approved_for_all(
        &self,
        holder: &AccountId,
        operator: &AccountId,
    ) -> Result<bool, LedgerError> {
        Ok(self.store.is_approved(holder, operator)?)
    }

    pub(crate) fn require_approval(
        &self,
        holder: &AccountId,
        operator: &AccountId,
    ) -> Result<(), LedgerError> {
        if !self.store.is_approved(holder, operator)? {
            return Err(LedgerError::NotApproved);
        }
        Ok(())
    }

    // ---- Event log ----

    pub(crate) fn emit(&self, event: Event) -> Result<(), LedgerError> {
        log::info!("event: {event:?}");
        Ok(self.store.append_event(event)?)
    }

    pub fn events(&self) -> Result<Vec<Event>, LedgerError> {
        Ok(self.store.events()?)
    }

    /// The event log as JSON lines, for off-ledger indexers.
    pub fn export_events_json(&self) -> Result<String, LedgerError> {
        let mut out = String::new();
        for event in self.events()? {
            out.push_str(&event.to_json()?);
            out.push('\n');
        }
        Ok(out)
    }
}
