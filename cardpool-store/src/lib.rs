pub mod memory;
pub mod store_traits;

pub use memory::MemoryStore;
pub use store_traits::LedgerStore;
