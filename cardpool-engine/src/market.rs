use crate::registry::validate_card_metadata;
use crate::service::Cardpool;
use cardpool_core::error::LedgerError;
use cardpool_core::events::Event;
use cardpool_core::id::{AccountId, CardId};
use cardpool_store::LedgerStore;

/// Sale and purchase layer: fixed-price swaps of fractions and whole cards
/// against the custody counterparty, with change refunded on overpayment.
impl<S: LedgerStore> Cardpool<S> {
    /// Sell `amount` fractions back to the custody counterparty at the unit
    /// price implied by the card's reference price.
    ///
    /// The seller must have approved the sale vault beforehand. When custody
    /// cash cannot cover the payout the sale fails with
    /// `ChangeTransferFailed` and nothing moves.
    pub fn sell_fractions(
        &self,
        seller: &AccountId,
        card_id: CardId,
        amount: u128,
    ) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.require_approval(seller, &self.sale_vault())?;

        self.with_card(card_id, || {
            let card = self.require_card(card_id)?;
            let mut pool = self.require_live_pool(card_id)?;

            let held = pool.balance_of(seller);
            if held < amount {
                return Err(LedgerError::InsufficientBalance {
                    needed: amount,
                    available: held,
                });
            }

            let payout = amount
                .checked_mul(card.unit_price())
                .ok_or(LedgerError::Overflow)?;
            let custody = self.custody_account();
            if self.cash_balance_of(&custody)? < payout {
                return Err(LedgerError::ChangeTransferFailed(payout));
            }

            pool.transfer(seller, &custody, amount)?;
            self.store().put_pool(pool)?;
            self.move_value(&custody, seller, payout)?;

            self.emit(Event::FractionsSold {
                seller: *seller,
                card_id,
                amount,
            })?;
            Ok(payout)
        })
    }

    /// Buy `amount` fractions from the custody counterparty.
    ///
    /// `payment` is debited from the buyer's cash balance; anything above the
    /// price comes straight back as change. Returns the refunded change.
    pub fn purchase_fractions(
        &self,
        buyer: &AccountId,
        card_id: CardId,
        amount: u128,
        payment: u128,
    ) -> Result<u128, LedgerError> {
        if buyer.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        self.with_card(card_id, || {
            let card = self.require_card(card_id)?;
            let mut pool = self.require_live_pool(card_id)?;

            let price = amount
                .checked_mul(card.unit_price())
                .ok_or(LedgerError::Overflow)?;
            if payment < price {
                return Err(LedgerError::InsufficientFunds {
                    needed: price,
                    provided: payment,
                });
            }

            let custody = self.custody_account();
            let available = pool.balance_of(&custody);
            if available < amount {
                return Err(LedgerError::InsufficientBalance {
                    needed: amount,
                    available,
                });
            }

            self.debit(buyer, payment)?;
            self.credit(&custody, price)?;
            let change = payment - price;
            if change > 0 {
                self.credit(buyer, change)?;
            }

            pool.transfer(&custody, buyer, amount)?;
            self.store().put_pool(pool)?;

            self.emit(Event::FractionsPurchased {
                buyer: *buyer,
                card_id,
                amount,
                payment: price,
            })?;
            Ok(change)
        })
    }

    /// Buy a whole custodied card at its reference price. Returns the change
    /// refunded to the buyer.
    pub fn purchase_card(
        &self,
        buyer: &AccountId,
        card_id: CardId,
        payment: u128,
    ) -> Result<u128, LedgerError> {
        if buyer.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }

        self.with_card(card_id, || {
            let mut card = self.require_card(card_id)?;
            if card.fractionalized {
                return Err(LedgerError::AlreadyFractionalized(card_id));
            }
            if card.owner != self.custody_account() {
                return Err(LedgerError::NotLocked(card_id));
            }
            if payment < card.price {
                return Err(LedgerError::InsufficientFunds {
                    needed: card.price,
                    provided: payment,
                });
            }

            self.debit(buyer, payment)?;
            self.credit(&self.custody_account(), card.price)?;
            let change = payment - card.price;
            if change > 0 {
                self.credit(buyer, change)?;
            }

            card.owner = *buyer;
            self.store().put_card(card)?;

            self.emit(Event::CardPurchased {
                buyer: *buyer,
                card_id,
            })?;
            Ok(change)
        })
    }

    /// Owner-initiated return of a whole card to custody, refreshing its
    /// metadata and reference price on the way in.
    pub fn send_card_to_custody(
        &self,
        caller: &AccountId,
        card_id: CardId,
        name: &str,
        grade: &str,
        serial: u64,
        price: u128,
    ) -> Result<(), LedgerError> {
        validate_card_metadata(name, grade, serial, price)?;

        self.with_card(card_id, || {
            let mut card = self.require_card(card_id)?;
            if card.owner != *caller {
                return Err(LedgerError::NotOwner(card_id));
            }
            if card.fractionalized {
                return Err(LedgerError::AlreadyFractionalized(card_id));
            }
            if let Some(existing) = self.store().find_card_by_identity(name, serial)? {
                if existing != card_id {
                    return Err(LedgerError::CardExists);
                }
            }

            card.name = name.to_string();
            card.grade = grade.to_string();
            card.serial = serial;
            card.price = price;
            card.owner = self.custody_account();
            self.store().put_card(card)?;

            self.emit(Event::SentToCustody {
                name: name.to_string(),
                grade: grade.to_string(),
                serial,
                card_id,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardpool_core::clock::ManualClock;
    use cardpool_core::config::ServiceConfig;
    use cardpool_core::FRACTION_SUPPLY;
    use cardpool_store::MemoryStore;
    use std::sync::Arc;

    const PRICE: u128 = 60_000_000_000_000_000; // 0.06 ETH, unit price 6 wei
    const URI: &str = "https://cards.test/";

    fn service() -> (Cardpool<MemoryStore>, AccountId) {
        let admin = AccountId::derive(&[b"market-admin"]);
        let config = ServiceConfig::new(admin).unwrap();
        (
            Cardpool::in_memory(config, Arc::new(ManualClock::new(0))),
            admin,
        )
    }

    fn fractionalized_card(
        pool: &Cardpool<MemoryStore>,
        admin: &AccountId,
        owner: AccountId,
    ) -> CardId {
        let card_id = pool
            .mint(admin, owner, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap();
        pool.transfer_to_custody(&owner, card_id).unwrap();
        pool.fractionalize(admin, owner, card_id).unwrap();
        card_id
    }

    #[test]
    fn test_sell_pays_unit_price() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let card_id = fractionalized_card(&pool, &admin, alice);

        // Fund the custody counterparty and approve the vault
        pool.deposit(&pool.custody_account(), 1_000_000_000_000_000_000)
            .unwrap();
        pool.set_approval_for_all(&alice, &pool.sale_vault(), true)
            .unwrap();

        // 7 * 10^15 units at 6 wei each = 0.042 ETH
        let payout = pool
            .sell_fractions(&alice, card_id, 7_000_000_000_000_000)
            .unwrap();
        assert_eq!(payout, 42_000_000_000_000_000);
        assert_eq!(pool.cash_balance_of(&alice).unwrap(), payout);
        assert_eq!(
            pool.balance_of(&alice, card_id).unwrap(),
            3_000_000_000_000_000
        );
        assert_eq!(
            pool.balance_of(&pool.custody_account(), card_id).unwrap(),
            7_000_000_000_000_000
        );
    }

    #[test]
    fn test_sell_requires_approval_and_balance() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let card_id = fractionalized_card(&pool, &admin, alice);
        pool.deposit(&pool.custody_account(), 1_000_000_000_000_000_000)
            .unwrap();

        assert!(matches!(
            pool.sell_fractions(&alice, card_id, 1),
            Err(LedgerError::NotApproved)
        ));

        pool.set_approval_for_all(&alice, &pool.sale_vault(), true)
            .unwrap();
        assert!(matches!(
            pool.sell_fractions(&alice, card_id, FRACTION_SUPPLY + 1),
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_sell_fails_when_custody_cannot_pay() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let card_id = fractionalized_card(&pool, &admin, alice);
        pool.set_approval_for_all(&alice, &pool.sale_vault(), true)
            .unwrap();

        let err = pool
            .sell_fractions(&alice, card_id, 7_000_000_000_000_000)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ChangeTransferFailed(_)));
        // Rolled back: the seller still holds the full supply
        assert_eq!(pool.balance_of(&alice, card_id).unwrap(), FRACTION_SUPPLY);
    }

    #[test]
    fn test_purchase_refunds_change() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let bob = AccountId::random();
        let card_id = fractionalized_card(&pool, &admin, alice);

        // Stock the counterparty with fractions via a sale
        pool.deposit(&pool.custody_account(), 1_000_000_000_000_000_000)
            .unwrap();
        pool.set_approval_for_all(&alice, &pool.sale_vault(), true)
            .unwrap();
        pool.sell_fractions(&alice, card_id, 7_000_000_000_000_000)
            .unwrap();

        // Price for 10^15 units is 6 * 10^15 wei; pay 10^16 and expect change
        pool.deposit(&bob, 10_000_000_000_000_000).unwrap();
        let change = pool
            .purchase_fractions(&bob, card_id, 1_000_000_000_000_000, 10_000_000_000_000_000)
            .unwrap();
        assert_eq!(change, 4_000_000_000_000_000);
        assert_eq!(pool.cash_balance_of(&bob).unwrap(), change);
        assert_eq!(
            pool.balance_of(&bob, card_id).unwrap(),
            1_000_000_000_000_000
        );
    }

    #[test]
    fn test_purchase_underpayment_rejected() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let bob = AccountId::random();
        let card_id = fractionalized_card(&pool, &admin, alice);
        pool.deposit(&pool.custody_account(), 1_000_000_000_000_000_000)
            .unwrap();
        pool.set_approval_for_all(&alice, &pool.sale_vault(), true)
            .unwrap();
        pool.sell_fractions(&alice, card_id, 7_000_000_000_000_000)
            .unwrap();

        pool.deposit(&bob, 10_000_000_000_000_000).unwrap();
        let err = pool
            .purchase_fractions(&bob, card_id, 1_000_000_000_000_000, 1)
            .unwrap_err();
        match err {
            LedgerError::InsufficientFunds { needed, provided } => {
                assert_eq!(needed, 6_000_000_000_000_000);
                assert_eq!(provided, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing moved
        assert_eq!(pool.balance_of(&bob, card_id).unwrap(), 0);
        assert_eq!(pool.cash_balance_of(&bob).unwrap(), 10_000_000_000_000_000);

        // Exact payment succeeds with no change
        let change = pool
            .purchase_fractions(&bob, card_id, 1_000_000_000_000_000, 6_000_000_000_000_000)
            .unwrap();
        assert_eq!(change, 0);
        assert_eq!(
            pool.balance_of(&bob, card_id).unwrap(),
            1_000_000_000_000_000
        );
    }

    #[test]
    fn test_withdrawn_pool_shares_cannot_be_traded() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let card_id = fractionalized_card(&pool, &admin, alice);

        pool.deposit(&pool.custody_account(), 1_000_000_000_000_000_000)
            .unwrap();
        pool.set_approval_for_all(&alice, &pool.sale_vault(), true)
            .unwrap();

        pool.defractionalize(&alice, card_id).unwrap();
        pool.withdraw_defractionalized(&alice, card_id).unwrap();

        // Alice owns the whole card again; her stale shares are worthless
        assert!(matches!(
            pool.sell_fractions(&alice, card_id, FRACTION_SUPPLY),
            Err(LedgerError::NotFractionalized(_))
        ));
        assert_eq!(pool.cash_balance_of(&alice).unwrap(), 0);
        assert_eq!(pool.owner_of(card_id).unwrap(), alice);

        pool.deposit(&alice, 6).unwrap();
        assert!(matches!(
            pool.purchase_fractions(&alice, card_id, 1, 6),
            Err(LedgerError::NotFractionalized(_))
        ));
    }

    #[test]
    fn test_purchase_whole_card() {
        let (pool, admin) = service();
        let bob = AccountId::random();
        let card_id = pool
            .mint_to_custody(&admin, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap();

        pool.deposit(&bob, PRICE + 5).unwrap();
        assert!(matches!(
            pool.purchase_card(&bob, card_id, PRICE - 1),
            Err(LedgerError::InsufficientFunds { .. })
        ));

        let change = pool.purchase_card(&bob, card_id, PRICE + 5).unwrap();
        assert_eq!(change, 5);
        assert_eq!(pool.owner_of(card_id).unwrap(), bob);
        assert_eq!(pool.cash_balance_of(&bob).unwrap(), 5);
        assert_eq!(pool.cash_balance_of(&pool.custody_account()).unwrap(), PRICE);
    }

    #[test]
    fn test_send_card_to_custody_reregisters() {
        let (pool, admin) = service();
        let bob = AccountId::random();
        let card_id = pool
            .mint(&admin, bob, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap();

        assert!(matches!(
            pool.send_card_to_custody(&AccountId::random(), card_id, "n", "g", 1, 1),
            Err(LedgerError::NotOwner(_))
        ));

        pool.send_card_to_custody(&bob, card_id, "Messi shot SPA10", "SPA9", 123, PRICE * 2)
            .unwrap();

        let card = pool.get_card(card_id).unwrap();
        assert_eq!(card.owner, pool.custody_account());
        assert_eq!(card.grade, "SPA9");
        assert_eq!(card.price, PRICE * 2);
    }
}
