use crate::error::LedgerError;
use crate::id::{AccountId, CardId};
use crate::FRACTION_SUPPLY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fungible ownership shares for one fractionalized card.
///
/// The balances always sum to [`FRACTION_SUPPLY`]; every transfer is a
/// checked move between two holders. The pool persists after the underlying
/// card has been withdrawn so historical balances stay queryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionPool {
    /// The card this pool fractionalizes
    pub card_id: CardId,

    /// Holder balances; entries are pruned when they reach zero
    balances: BTreeMap<AccountId, u128>,

    /// The account that reassembled 100% of the shares and may withdraw the
    /// underlying card
    pub defractionalizer: Option<AccountId>,

    /// Set once the underlying card has been withdrawn
    pub withdrawn: bool,
}

impl FractionPool {
    /// Create a pool with the full fixed supply assigned to `owner`.
    pub fn new(card_id: CardId, owner: AccountId) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(owner, FRACTION_SUPPLY);
        Self {
            card_id,
            balances,
            defractionalizer: None,
            withdrawn: false,
        }
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Sum of all holder balances. Always equals [`FRACTION_SUPPLY`].
    pub fn total(&self) -> u128 {
        self.balances.values().sum()
    }

    /// Holders with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, &u128)> {
        self.balances.iter()
    }

    /// Move `amount` units from `from` to `to`.
    ///
    /// Fails with `InsufficientBalance` when the sender cannot cover the
    /// amount; the pool is left untouched in that case.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(*to, credited);

        Ok(())
    }
}
