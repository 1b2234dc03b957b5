use crate::id::CardId;
use std::io;
use thiserror::Error;

/// Errors raised by a ledger store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO errors that occur when reading/writing snapshot files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors related to missing data
    #[error("Not found: {0}")]
    NotFound(String),

    /// A store mutex was poisoned by a panicking thread
    #[error("Store lock poisoned: {0}")]
    Poisoned(String),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<String> for StoreError {
    fn from(err: String) -> Self {
        StoreError::Other(err)
    }
}

impl From<&str> for StoreError {
    fn from(err: &str) -> Self {
        StoreError::Other(err.to_string())
    }
}

/// Coarse classification of ledger errors.
///
/// Callers that only need to distinguish a rejected-input failure from a
/// state conflict or a timing failure can match on this instead of the full
/// error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad address, empty name/grade, zero amount/serial/price
    Validation,
    /// Caller is not admin, owner or defractionalizer
    Authorization,
    /// Operation conflicts with the current lifecycle state
    StateConflict,
    /// Payment below the required price or deposit
    InsufficientFunds,
    /// Transfer or sale amount exceeds the holder's balance
    InsufficientBalance,
    /// Claim before the deadline, or action after it
    Timing,
    /// Store or arithmetic failure inside the engine
    Internal,
}

/// Represents all possible errors raised by ledger operations.
///
/// Every variant aborts the whole operation with no partial mutation; callers
/// must resubmit a corrected operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("invalid card name")]
    InvalidName,

    #[error("invalid card grade")]
    InvalidGrade,

    #[error("invalid serial number")]
    InvalidSerial,

    #[error("invalid card price")]
    InvalidPrice,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("caller is not the admin")]
    NotAdmin,

    #[error("caller is not the owner of card {0}")]
    NotOwner(CardId),

    #[error("caller is not the defractionalizer for card {0}")]
    NotDefractionalizer(CardId),

    #[error("operator is not approved by the holder")]
    NotApproved,

    #[error("unknown card {0}")]
    UnknownCard(CardId),

    #[error("a card with this name and serial number already exists")]
    CardExists,

    #[error("card {0} is already fractionalized")]
    AlreadyFractionalized(CardId),

    #[error("card {0} is not fractionalized")]
    NotFractionalized(CardId),

    #[error("card {0} is not locked in custody")]
    NotLocked(CardId),

    #[error("insufficient fraction balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient funds: need {needed}, provided {provided}")]
    InsufficientFunds { needed: u128, provided: u128 },

    #[error("change transfer failed: counterparty cannot cover {0}")]
    ChangeTransferFailed(u128),

    #[error("starter amount must be greater than or equal to half of the total supply")]
    BelowHalfThreshold,

    #[error("starter amount exceeds the starter's fraction balance")]
    InsufficientFractions,

    #[error("no auction is bound to card {0}")]
    NoAuction(CardId),

    #[error("an unresolved auction is already bound to card {0}")]
    AuctionPending(CardId),

    #[error("account is already registered for the auction on card {0}")]
    AlreadyRegistered(CardId),

    #[error("account is not registered for the auction on card {0}")]
    NotRegistered(CardId),

    #[error("account has already claimed its proportion for card {0}")]
    AlreadyClaimed(CardId),

    #[error("auction on card {0} is not ready to start")]
    NotReady(CardId),

    #[error("auction on card {0} has not started")]
    NotStarted(CardId),

    #[error("auction on card {0} has already started")]
    AlreadyStarted(CardId),

    #[error("auction on card {0} is already resolved")]
    AlreadyResolved(CardId),

    #[error("auction on card {0} is not over yet")]
    NotOverYet(CardId),

    #[error("auction on card {0} is over")]
    AuctionOver(CardId),

    #[error("card {0} is busy in another operation")]
    CardBusy(CardId),

    #[error("arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Classify this error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            InvalidAddress | InvalidName | InvalidGrade | InvalidSerial | InvalidPrice
            | ZeroAmount | UnknownCard(_) | BelowHalfThreshold => ErrorKind::Validation,

            NotAdmin | NotOwner(_) | NotDefractionalizer(_) | NotApproved => {
                ErrorKind::Authorization
            }

            CardExists
            | AlreadyFractionalized(_)
            | NotFractionalized(_)
            | NotLocked(_)
            | NoAuction(_)
            | AuctionPending(_)
            | AlreadyRegistered(_)
            | NotRegistered(_)
            | AlreadyClaimed(_)
            | NotReady(_)
            | NotStarted(_)
            | AlreadyStarted(_)
            | AlreadyResolved(_)
            | CardBusy(_) => ErrorKind::StateConflict,

            InsufficientFunds { .. } | ChangeTransferFailed(_) => ErrorKind::InsufficientFunds,

            InsufficientBalance { .. } | InsufficientFractions => ErrorKind::InsufficientBalance,

            NotOverYet(_) | AuctionOver(_) => ErrorKind::Timing,

            Overflow | Store(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(LedgerError::InvalidAddress.kind(), ErrorKind::Validation);
        assert_eq!(LedgerError::NotAdmin.kind(), ErrorKind::Authorization);
        assert_eq!(LedgerError::CardExists.kind(), ErrorKind::StateConflict);
        assert_eq!(
            LedgerError::InsufficientFunds {
                needed: 10,
                provided: 1
            }
            .kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            LedgerError::InsufficientBalance {
                needed: 10,
                available: 1
            }
            .kind(),
            ErrorKind::InsufficientBalance
        );
        assert_eq!(LedgerError::NotOverYet(3).kind(), ErrorKind::Timing);
        assert_eq!(LedgerError::Overflow.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_store_error_wrapping() {
        let err: LedgerError = StoreError::from("backend unavailable").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("backend unavailable"));
    }
}
