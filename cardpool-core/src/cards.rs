use crate::id::{AccountId, CardId};
use crate::FRACTION_SUPPLY;
use serde::{Deserialize, Serialize};

/// A unique collectible-card asset tracked by the registry.
///
/// A card has exactly one owner until it is fractionalized, at which point
/// whole-asset transfers are locked and ownership is represented by the
/// card's [`FractionPool`](crate::fractions::FractionPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Serial id allocated by the registry
    pub id: CardId,

    /// Display name; part of the uniqueness key
    pub name: String,

    /// Grade label (e.g. "SPA10")
    pub grade: String,

    /// External serial number; part of the uniqueness key
    pub serial: u64,

    /// Reference full-asset price in wei, set at mint time
    pub price: u128,

    /// Metadata URI
    pub uri: String,

    /// Current owner; the registry custody account while the card is held
    /// for fractionalization or sale
    pub owner: AccountId,

    /// Set exactly once, when the card is fractionalized
    pub fractionalized: bool,
}

impl Card {
    pub fn new(
        id: CardId,
        name: String,
        grade: String,
        serial: u64,
        price: u128,
        uri: String,
        owner: AccountId,
    ) -> Self {
        Self {
            id,
            name,
            grade,
            serial,
            price,
            uri,
            owner,
            fractionalized: false,
        }
    }

    /// Price of a single fraction unit, derived from the reference price.
    pub fn unit_price(&self) -> u128 {
        self.price / FRACTION_SUPPLY
    }
}
