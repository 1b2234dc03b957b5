pub mod auction;
pub mod cards;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod fractions;
pub mod id;
pub mod locks;

// Re-export the main types for convenience
pub use auction::{Auction, AuctionOutcome, AuctionPhase, StarterStake};
pub use cards::Card;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServiceConfig;
pub use error::{ErrorKind, LedgerError, StoreError};
pub use events::Event;
pub use fractions::FractionPool;
pub use id::{AccountId, CardId};
pub use locks::{CardLockGuard, CardLockManager};

/// Fixed number of fraction units representing 100% ownership of a card.
///
/// The supply is the same for every pool; a card's per-unit price is its
/// reference price divided by this constant.
pub const FRACTION_SUPPLY: u128 = 10_000_000_000_000_000;

/// Default shotgun auction window in seconds (90 days).
pub const DEFAULT_AUCTION_DURATION_SECS: u64 = 90 * 24 * 60 * 60;

/// Default minimum deposit (in wei) a shotgun starter must escrow.
pub const DEFAULT_MIN_STARTER_DEPOSIT: u128 = 1_000_000_000_000_000;
