//! Fractional ownership ledger for collectible cards.
//!
//! This crate re-exports all the components of the cardpool system.

pub use cardpool_core::*;
pub use cardpool_engine::*;
pub use cardpool_store::*;
