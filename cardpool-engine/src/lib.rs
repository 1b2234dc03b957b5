pub mod ledger;
pub mod market;
pub mod registry;
pub mod service;
pub mod shotgun;

pub use service::Cardpool;
