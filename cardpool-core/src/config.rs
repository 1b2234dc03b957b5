use crate::error::LedgerError;
use crate::id::AccountId;
use crate::{DEFAULT_AUCTION_DURATION_SECS, DEFAULT_MIN_STARTER_DEPOSIT};
use serde::{Deserialize, Serialize};

/// Runtime configuration for a cardpool service instance.
///
/// The admin account replaces the on-chain singleton role: it is set at
/// construction and only mutable through the audited change-admin operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The only account allowed to mint, fractionalize and drive auctions
    pub admin: AccountId,

    /// Length of the shotgun purchase window in seconds
    pub auction_duration_secs: u64,

    /// Minimum deposit (wei) a shotgun starter must escrow
    pub min_starter_deposit: u128,
}

impl ServiceConfig {
    /// Build a config with the default auction window and starter deposit.
    ///
    /// Fails with `InvalidAddress` when `admin` is the zero account.
    pub fn new(admin: AccountId) -> Result<Self, LedgerError> {
        if admin.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        Ok(Self {
            admin,
            auction_duration_secs: DEFAULT_AUCTION_DURATION_SECS,
            min_starter_deposit: DEFAULT_MIN_STARTER_DEPOSIT,
        })
    }

    pub fn with_auction_duration(mut self, secs: u64) -> Self {
        self.auction_duration_secs = secs;
        self
    }

    pub fn with_min_starter_deposit(mut self, wei: u128) -> Self {
        self.min_starter_deposit = wei;
        self
    }
}
