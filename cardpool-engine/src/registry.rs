use crate::service::Cardpool;
use cardpool_core::cards::Card;
use cardpool_core::error::LedgerError;
use cardpool_core::events::Event;
use cardpool_core::id::{AccountId, CardId};
use cardpool_store::LedgerStore;

/// Card registry operations: admin-gated minting, whole-card custody moves
/// and ownership queries.
impl<S: LedgerStore> Cardpool<S> {
    /// Mint a new card to `to`.
    ///
    /// The `(name, serial)` pair is the uniqueness key; minting it twice
    /// fails with `CardExists`.
    #[allow(clippy::too_many_arguments)]
    pub fn mint(
        &self,
        caller: &AccountId,
        to: AccountId,
        name: &str,
        grade: &str,
        serial: u64,
        price: u128,
        uri: &str,
    ) -> Result<CardId, LedgerError> {
        self.require_admin(caller)?;
        if to.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        validate_card_metadata(name, grade, serial, price)?;

        self.atomically(|| {
            if self.store().find_card_by_identity(name, serial)?.is_some() {
                return Err(LedgerError::CardExists);
            }

            let card_id = self.store().allocate_card_id()?;
            let card = Card::new(
                card_id,
                name.to_string(),
                grade.to_string(),
                serial,
                price,
                uri.to_string(),
                to,
            );
            self.store().put_card(card)?;

            self.emit(Event::Minted {
                to,
                name: name.to_string(),
                grade: grade.to_string(),
                serial,
                card_id,
            })?;
            log::info!("minted card {card_id} ({name}, serial {serial}) to {to}");
            Ok(card_id)
        })
    }

    /// Mint straight into registry custody, ready for fractionalization.
    pub fn mint_to_custody(
        &self,
        caller: &AccountId,
        name: &str,
        grade: &str,
        serial: u64,
        price: u128,
        uri: &str,
    ) -> Result<CardId, LedgerError> {
        self.mint(caller, self.custody_account(), name, grade, serial, price, uri)
    }

    /// Owner-initiated move of a whole card into registry custody, the
    /// precondition for fractionalizing it.
    pub fn transfer_to_custody(
        &self,
        caller: &AccountId,
        card_id: CardId,
    ) -> Result<(), LedgerError> {
        self.with_card(card_id, || {
            let mut card = self.require_card(card_id)?;
            if card.owner != *caller {
                return Err(LedgerError::NotOwner(card_id));
            }
            if card.fractionalized {
                return Err(LedgerError::AlreadyFractionalized(card_id));
            }

            card.owner = self.custody_account();
            self.store().put_card(card)?;

            self.emit(Event::TokenTransferred { card_id })
        })
    }

    pub fn owner_of(&self, card_id: CardId) -> Result<AccountId, LedgerError> {
        Ok(self.require_card(card_id)?.owner)
    }

    pub fn get_card(&self, card_id: CardId) -> Result<Card, LedgerError> {
        self.require_card(card_id)
    }

    pub fn card_count(&self) -> Result<u64, LedgerError> {
        Ok(self.store().card_count()?)
    }
}

pub(crate) fn validate_card_metadata(
    name: &str,
    grade: &str,
    serial: u64,
    price: u128,
) -> Result<(), LedgerError> {
    if name.is_empty() {
        return Err(LedgerError::InvalidName);
    }
    if grade.is_empty() {
        return Err(LedgerError::InvalidGrade);
    }
    if serial == 0 {
        return Err(LedgerError::InvalidSerial);
    }
    if price == 0 {
        return Err(LedgerError::InvalidPrice);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardpool_core::clock::ManualClock;
    use cardpool_core::config::ServiceConfig;
    use cardpool_core::error::ErrorKind;
    use cardpool_store::MemoryStore;
    use std::sync::Arc;

    const PRICE: u128 = 60_000_000_000_000_000; // 0.06 ETH
    const URI: &str = "https://cards.test/";

    fn service() -> (Cardpool<MemoryStore>, AccountId) {
        let admin = AccountId::derive(&[b"registry-admin"]);
        let config = ServiceConfig::new(admin).unwrap();
        (
            Cardpool::in_memory(config, Arc::new(ManualClock::new(0))),
            admin,
        )
    }

    #[test]
    fn test_only_admin_mints() {
        let (pool, _) = service();
        let alice = AccountId::random();

        let err = pool
            .mint(&alice, alice, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotAdmin));
    }

    #[test]
    fn test_mint_allocates_sequential_ids() {
        let (pool, admin) = service();
        let alice = AccountId::random();

        let first = pool
            .mint(&admin, alice, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap();
        let second = pool
            .mint(&admin, alice, "Messi shot SPA10", "SPA10", 124, PRICE, URI)
            .unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(pool.card_count().unwrap(), 2);
        assert_eq!(pool.owner_of(first).unwrap(), alice);
        assert_eq!(
            pool.events().unwrap()[0],
            Event::Minted {
                to: alice,
                name: "Messi shot SPA10".to_string(),
                grade: "SPA10".to_string(),
                serial: 123,
                card_id: 0,
            }
        );
    }

    #[test]
    fn test_mint_uniqueness_on_name_and_serial() {
        let (pool, admin) = service();
        let alice = AccountId::random();

        pool.mint(&admin, alice, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap();

        let err = pool
            .mint(&admin, alice, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap_err();
        assert!(matches!(err, LedgerError::CardExists));
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        // Same name with a fresh serial is fine
        pool.mint(&admin, alice, "Messi shot SPA10", "SPA10", 124, PRICE, URI)
            .unwrap();
    }

    #[test]
    fn test_mint_metadata_validation() {
        let (pool, admin) = service();
        let alice = AccountId::random();

        assert!(matches!(
            pool.mint(&admin, AccountId::zero(), "n", "g", 1, PRICE, URI),
            Err(LedgerError::InvalidAddress)
        ));
        assert!(matches!(
            pool.mint(&admin, alice, "", "SPA10", 126, PRICE, URI),
            Err(LedgerError::InvalidName)
        ));
        assert!(matches!(
            pool.mint(&admin, alice, "Messi shot SPA10", "", 126, PRICE, URI),
            Err(LedgerError::InvalidGrade)
        ));
        assert!(matches!(
            pool.mint(&admin, alice, "Messi shot SPA10", "SPA10", 0, PRICE, URI),
            Err(LedgerError::InvalidSerial)
        ));
        assert!(matches!(
            pool.mint(&admin, alice, "Messi shot SPA10", "SPA10", 126, 0, URI),
            Err(LedgerError::InvalidPrice)
        ));
    }

    #[test]
    fn test_transfer_to_custody_requires_owner() {
        let (pool, admin) = service();
        let alice = AccountId::random();
        let carl = AccountId::random();

        let card_id = pool
            .mint(&admin, alice, "Messi shot SPA10", "SPA10", 123, PRICE, URI)
            .unwrap();

        assert!(matches!(
            pool.transfer_to_custody(&carl, card_id),
            Err(LedgerError::NotOwner(_))
        ));

        pool.transfer_to_custody(&alice, card_id).unwrap();
        assert_eq!(pool.owner_of(card_id).unwrap(), pool.custody_account());

        // Alice no longer owns the card
        assert!(matches!(
            pool.transfer_to_custody(&alice, card_id),
            Err(LedgerError::NotOwner(_))
        ));
    }

    #[test]
    fn test_mint_to_custody() {
        let (pool, admin) = service();
        let card_id = pool
            .mint_to_custody(&admin, "Messi shot SPA10", "SPA10", 125, PRICE, URI)
            .unwrap();
        assert_eq!(pool.owner_of(card_id).unwrap(), pool.custody_account());
    }

    #[test]
    fn test_unknown_card_queries() {
        let (pool, _) = service();
        assert!(matches!(
            pool.owner_of(9),
            Err(LedgerError::UnknownCard(9))
        ));
    }
}
