use crate::id::{AccountId, CardId};
use crate::FRACTION_SUPPLY;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a resolved shotgun auction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionOutcome {
    /// A third party paid the full-pool price before the deadline; the
    /// payment is held for pro-rata claims.
    Purchased { buyer: AccountId, payment: u128 },
    /// The deadline passed with no qualifying purchase; locked fractions and
    /// the starter's deposit are returned through claims.
    TimedOut,
}

/// Lifecycle phase of a shotgun auction instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// Bound to a card, waiting for a starter to post stake and deposit
    AwaitingStarter,
    /// Starter registered; other owners must lock the rest of the supply
    Registering,
    /// All of the supply is locked and the purchase window is open
    Started,
    /// Terminal; payouts happen through per-account claims
    Resolved(AuctionOutcome),
}

/// The stake posted by the holder who initiated the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterStake {
    pub account: AccountId,
    /// Locked fraction amount; at least half of the total supply
    pub amount: u128,
    /// Escrowed deposit in wei; doubles as the starter's self-valuation
    pub deposit: u128,
}

/// One shotgun buy-out auction, keyed by the contested card id.
///
/// The starter's deposit implies the full-pool price: paying
/// `deposit * supply / starter_amount` before the deadline buys every locked
/// fraction; otherwise the instance times out and unwinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub card_id: CardId,

    pub phase: AuctionPhase,

    pub starter: Option<StarterStake>,

    /// Non-starter holders and the fraction amounts they locked
    pub others: BTreeMap<AccountId, u128>,

    /// Unix deadline, set when the auction starts
    pub deadline: Option<u64>,

    /// Accounts that already claimed their proportion after resolution
    pub claimed: BTreeSet<AccountId>,
}

impl Auction {
    pub fn new(card_id: CardId) -> Self {
        Self {
            card_id,
            phase: AuctionPhase::AwaitingStarter,
            starter: None,
            others: BTreeMap::new(),
            deadline: None,
            claimed: BTreeSet::new(),
        }
    }

    /// The posted price for the entire pool, implied by the starter's
    /// self-valuation. `None` until a starter has registered.
    pub fn full_pool_price(&self) -> Option<u128> {
        let starter = self.starter.as_ref()?;
        starter
            .deposit
            .checked_mul(FRACTION_SUPPLY)
            .map(|v| v / starter.amount)
    }

    /// Starter amount plus every registered owner amount.
    ///
    /// The auction may only start once this equals the total supply.
    pub fn registered_total(&self) -> u128 {
        let starter = self.starter.as_ref().map(|s| s.amount).unwrap_or(0);
        starter + self.others.values().sum::<u128>()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, AuctionPhase::Resolved(_))
    }

    /// Whether `account` is the starter or a registered owner.
    pub fn is_participant(&self, account: &AccountId) -> bool {
        self.locked_amount_of(account).is_some()
    }

    /// The fraction amount `account` has locked into this auction.
    pub fn locked_amount_of(&self, account: &AccountId) -> Option<u128> {
        if let Some(starter) = &self.starter {
            if starter.account == *account {
                return Some(starter.amount);
            }
        }
        self.others.get(account).copied()
    }
}
