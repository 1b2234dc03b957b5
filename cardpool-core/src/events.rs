use crate::error::StoreError;
use crate::id::{AccountId, CardId};
use serde::{Deserialize, Serialize};

/// Observable events emitted by the ledger, recorded in order in the store's
/// event log. Off-ledger indexers consume these through the JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // Registry
    Minted {
        to: AccountId,
        name: String,
        grade: String,
        serial: u64,
        card_id: CardId,
    },
    AdminChanged {
        previous: AccountId,
        current: AccountId,
    },
    /// A whole card moved into registry custody
    TokenTransferred {
        card_id: CardId,
    },
    SentToCustody {
        name: String,
        grade: String,
        serial: u64,
        card_id: CardId,
    },
    CardPurchased {
        buyer: AccountId,
        card_id: CardId,
    },

    // Fraction ledger
    Fractionalized {
        to: AccountId,
        card_id: CardId,
    },
    FractionsTransferred {
        from: AccountId,
        to: AccountId,
        card_id: CardId,
        amount: u128,
    },
    Defractionalized {
        by: AccountId,
        card_id: CardId,
    },
    DefractionalizedCardWithdrawn {
        by: AccountId,
        card_id: CardId,
    },

    // Sale layer
    FractionsSold {
        seller: AccountId,
        card_id: CardId,
        amount: u128,
    },
    FractionsPurchased {
        buyer: AccountId,
        card_id: CardId,
        amount: u128,
        payment: u128,
    },

    // Shotgun auction
    AuctionBound {
        card_id: CardId,
    },
    OtherOwnersRegistered {
        card_id: CardId,
        count: u64,
    },
    /// Fractions locked into the auction pot ahead of the purchase window
    TransferredForShotgun {
        from: AccountId,
        card_id: CardId,
        amount: u128,
    },
    AuctionStarted {
        card_id: CardId,
        starter: AccountId,
        amount: u128,
        deadline: u64,
    },
    AuctionPurchased {
        buyer: AccountId,
        card_id: CardId,
        payment: u128,
    },
    ProportionClaimed {
        account: AccountId,
        card_id: CardId,
        amount: u128,
    },
    /// Timeout unwind for the starter: locked fractions plus deposit back
    FractionsRefunded {
        account: AccountId,
        card_id: CardId,
        amount: u128,
        deposit: u128,
    },
}

impl Event {
    /// Serialize this event for off-ledger indexers.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
