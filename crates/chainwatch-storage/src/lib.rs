//! chainwatch-storage: in-memory backends for the ChainWatch repositories.
//!
//! - [`block`]: block state store (partitions + watermarks)
//! - [`subscriber`]: subscription index
//! - [`transaction`]: transaction index
//!
//! Nothing here survives a restart.

pub mod block;
pub mod subscriber;
pub mod transaction;

pub use block::InMemoryBlockStore;
pub use subscriber::InMemorySubscriberStore;
pub use transaction::InMemoryTransactionStore;
