//! Infrastructure layer - storage adapters

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryEstimateStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEstimateStore;
