use crate::service::Cardpool;
use cardpool_core::error::LedgerError;
use cardpool_core::events::Event;
use cardpool_core::fractions::FractionPool;
use cardpool_core::id::{AccountId, CardId};
use cardpool_core::FRACTION_SUPPLY;
use cardpool_store::LedgerStore;

/// Fraction ledger operations: splitting a custodied card into the fixed
/// supply of shares, moving shares between holders, and reassembling the
/// whole card.
impl<S: LedgerStore> Cardpool<S> {
    /// Split a custodied card into [`FRACTION_SUPPLY`] shares, all assigned
    /// to `owner`.
    ///
    /// The card must already sit in registry custody; fractionalizing a card
    /// its owner still holds would let shares and the whole card circulate
    /// at the same time.
    pub fn fractionalize(
        &self,
        caller: &AccountId,
        owner: AccountId,
        card_id: CardId,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if owner.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }

        self.with_card(card_id, || {
            let mut card = self.require_card(card_id)?;
            if card.fractionalized || self.store().get_pool(card_id)?.is_some() {
                return Err(LedgerError::AlreadyFractionalized(card_id));
            }
            if card.owner != self.custody_account() {
                return Err(LedgerError::NotLocked(card_id));
            }

            card.fractionalized = true;
            self.store().put_card(card)?;
            self.store().put_pool(FractionPool::new(card_id, owner))?;

            self.emit(Event::Fractionalized { to: owner, card_id })?;
            log::info!("card {card_id} fractionalized, full supply to {owner}");
            Ok(())
        })
    }

    /// Move `amount` shares of `card_id` from `from` to `to`.
    ///
    /// `from` must be the caller or must have approved the caller as an
    /// operator.
    pub fn transfer_fractions(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        card_id: CardId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if caller != from {
            self.require_approval(from, caller)?;
        }

        self.with_card(card_id, || {
            let mut pool = self.require_live_pool(card_id)?;
            pool.transfer(from, to, amount)?;
            self.store().put_pool(pool)?;

            self.emit(Event::FractionsTransferred {
                from: *from,
                to: *to,
                card_id,
                amount,
            })
        })
    }

    /// Record `caller` as entitled to withdraw the whole card after having
    /// reassembled the entire supply.
    pub fn defractionalize(&self, caller: &AccountId, card_id: CardId) -> Result<(), LedgerError> {
        self.with_card(card_id, || {
            let mut pool = self.require_live_pool(card_id)?;
            let held = pool.balance_of(caller);
            if held < FRACTION_SUPPLY {
                return Err(LedgerError::InsufficientBalance {
                    needed: FRACTION_SUPPLY,
                    available: held,
                });
            }

            pool.defractionalizer = Some(*caller);
            self.store().put_pool(pool)?;

            self.emit(Event::Defractionalized {
                by: *caller,
                card_id,
            })
        })
    }

    /// Hand the whole card back to the recorded defractionalizer.
    ///
    /// One-shot: the `withdrawn` flag makes a second call fail with
    /// `NotDefractionalizer` even from the same account.
    pub fn withdraw_defractionalized(
        &self,
        caller: &AccountId,
        card_id: CardId,
    ) -> Result<(), LedgerError> {
        self.with_card(card_id, || {
            let mut pool = self.require_pool(card_id)?;
            if pool.withdrawn || pool.defractionalizer != Some(*caller) {
                return Err(LedgerError::NotDefractionalizer(card_id));
            }

            pool.withdrawn = true;
            self.store().put_pool(pool)?;

            let mut card = self.require_card(card_id)?;
            card.owner = *caller;
            card.fractionalized = false;
            self.store().put_card(card)?;

            self.emit(Event::DefractionalizedCardWithdrawn {
                by: *caller,
                card_id,
            })?;
            log::info!("card {card_id} withdrawn by defractionalizer {caller}");
            Ok(())
        })
    }

    pub fn balance_of(&self, account: &AccountId, card_id: CardId) -> Result<u128, LedgerError> {
        Ok(self.require_pool(card_id)?.balance_of(account))
    }

    /// Fixed share supply of a fractionalized card.
    pub fn total_supply(&self, card_id: CardId) -> Result<u128, LedgerError> {
        Ok(self.require_pool(card_id)?.total())
    }
}
