//! Read-side service over the coordinator's stores.

use std::sync::Arc;

use crate::error::WatchError;
use crate::repository::{BlockRepository, SubscriberRepository, TransactionRepository};
use crate::types::{normalize_address, Subscriber, Transaction};

/// Query and subscription entry point used by the HTTP API and bootstrap.
pub struct Parser {
    transactions: Arc<dyn TransactionRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
    blocks: Arc<dyn BlockRepository>,
}

impl Parser {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        subscribers: Arc<dyn SubscriberRepository>,
        blocks: Arc<dyn BlockRepository>,
    ) -> Self {
        Self {
            transactions,
            subscribers,
            blocks,
        }
    }

    /// Number of the last parsed block.
    pub async fn current_block(&self) -> Result<u64, WatchError> {
        Ok(self.blocks.last_parsed_block().await?.number)
    }

    /// Start watching `address`. Blocks claimed from now on are matched against it.
    pub async fn subscribe(&self, address: &str) -> Result<(), WatchError> {
        let address = checked_address(address)?;
        self.subscribers.save(Subscriber::new(address)).await
    }

    /// Recorded transactions touching `address`, oldest first.
    pub async fn transactions(&self, address: &str) -> Result<Vec<Transaction>, WatchError> {
        let address = checked_address(address)?;
        self.transactions.by_address(&address).await
    }
}

fn checked_address(address: &str) -> Result<String, WatchError> {
    let normalized = normalize_address(address);
    if normalized.is_empty() {
        return Err(WatchError::InvalidAddress(address.to_string()));
    }
    Ok(normalized)
}
