//! Storage contracts for block coordination state and the two indexes.
//!
//! Implementations live in `chainwatch-storage`. Every operation is atomic
//! with respect to the others on the same store.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::WatchError;
use crate::types::{Block, Subscriber, Transaction};

/// How long a block may stay in Processing before it is considered abandoned.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Block state store: Processing / Failed / Parsed partitions plus the parsed
/// and processing watermarks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// The block at the parsed watermark.
    ///
    /// Returns [`WatchError::BlockNotFound`] until something has been parsed.
    async fn last_parsed_block(&self) -> Result<Block, WatchError>;

    /// The highest claimed block: the one at the processing watermark when it
    /// is ahead of the parsed watermark, otherwise the last parsed block.
    async fn last_block(&self) -> Result<Block, WatchError>;

    /// A block eligible for retry: any Failed block first, then a Processing
    /// block whose claim went stale.
    async fn failed_block(&self) -> Result<Block, WatchError>;

    /// Move `block` into the partition named by its status.
    ///
    /// Fails with [`WatchError::UnknownBlockStatus`] for
    /// [`BlockStatus::Unknown`](crate::BlockStatus::Unknown).
    async fn upsert(&self, block: Block) -> Result<(), WatchError>;
}

/// The set of watched addresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    async fn save(&self, subscriber: Subscriber) -> Result<(), WatchError>;

    /// Fails with [`WatchError::SubscriberNotFound`] when `address` is not watched.
    async fn get(&self, address: &str) -> Result<Subscriber, WatchError>;
}

/// Matched transactions, indexed by the addresses they touch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Index `transaction` under both its `from` and `to` address.
    async fn save(&self, transaction: Transaction) -> Result<(), WatchError>;

    /// Transactions touching `address`, ordered by block then index.
    async fn by_address(&self, address: &str) -> Result<Vec<Transaction>, WatchError>;
}
