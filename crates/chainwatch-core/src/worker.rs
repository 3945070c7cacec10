//! The block-claim coordinator.
//!
//! Every call to [`ParserWorker::run`] performs one cycle:
//!
//! 1. **Claim** (under the [`ClaimLock`]): retry a failed or stale block if one
//!    exists, otherwise take the block after the last claimed one, unless the
//!    last claimed one is the chain head. The claimed block is stored as
//!    Processing.
//! 2. **Process** (no lock): fetch the block's transactions and save those
//!    whose `to` or `from` address is subscribed.
//! 3. **Commit**: mark the block Parsed on success or Failed on error.
//!
//! Any number of workers may run cycles concurrently against the same stores.
//! The lock guarantees no two of them claim the same block at once.

use std::sync::Arc;

use crate::client::ChainClient;
use crate::error::WatchError;
use crate::lock::ClaimLock;
use crate::repository::{BlockRepository, SubscriberRepository, TransactionRepository};
use crate::types::{normalize_address, Block, BlockStatus, Transaction};

/// Coordinator shared by every scheduler job.
pub struct ParserWorker {
    transactions: Arc<dyn TransactionRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
    blocks: Arc<dyn BlockRepository>,
    client: Arc<dyn ChainClient>,
    lock: Arc<dyn ClaimLock>,
}

impl ParserWorker {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        subscribers: Arc<dyn SubscriberRepository>,
        blocks: Arc<dyn BlockRepository>,
        client: Arc<dyn ChainClient>,
        lock: Arc<dyn ClaimLock>,
    ) -> Self {
        Self {
            transactions,
            subscribers,
            blocks,
            client,
            lock,
        }
    }

    /// Claim, process and commit one block.
    ///
    /// Returns [`WatchError::NoBlockForParsing`] when the worker is caught up
    /// with the chain head. A processing error is returned after the block has
    /// been marked Failed.
    pub async fn run(&self) -> Result<(), WatchError> {
        let head = self.client.block_number().await?;
        let block = self.claim_block(head).await?;
        tracing::debug!(block = block.number, head, "Claimed block");

        match self.process_block(&block).await {
            Ok(matched) => {
                tracing::debug!(block = block.number, matched, "Block parsed");
                self.commit(block, BlockStatus::Parsed).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(block = block.number, error = %e, "Block processing failed");
                self.commit(block, BlockStatus::Failed).await;
                Err(e)
            }
        }
    }

    async fn claim_block(&self, head: u64) -> Result<Block, WatchError> {
        let _guard = self.lock.acquire().await;

        let candidate = match self.blocks.failed_block().await {
            Ok(block) => {
                tracing::debug!(block = block.number, status = %block.status, "Retrying block");
                block
            }
            Err(WatchError::BlockNotFound) => {
                let last = self.blocks.last_block().await?;
                if last.number == head {
                    return Err(WatchError::NoBlockForParsing { head });
                }
                Block::new(last.number + 1, BlockStatus::Processing)
            }
            Err(e) => return Err(e),
        };

        let claimed = candidate.transition(BlockStatus::Processing);
        self.blocks.upsert(claimed.clone()).await?;
        Ok(claimed)
    }

    /// Returns how many transactions matched a subscription.
    async fn process_block(&self, block: &Block) -> Result<usize, WatchError> {
        let transactions = self.client.block_transactions(block.number).await?;

        let mut matched = 0;
        for tx in transactions {
            if self.is_watched(&tx).await? {
                self.transactions.save(tx).await?;
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn is_watched(&self, tx: &Transaction) -> Result<bool, WatchError> {
        let to = self.is_subscribed(&tx.to).await?;
        let from = self.is_subscribed(&tx.from).await?;
        Ok(to || from)
    }

    async fn is_subscribed(&self, address: &str) -> Result<bool, WatchError> {
        if address.is_empty() {
            return Ok(false);
        }
        match self.subscribers.get(&normalize_address(address)).await {
            Ok(_) => Ok(true),
            Err(WatchError::SubscriberNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn commit(&self, block: Block, status: BlockStatus) {
        let number = block.number;
        if let Err(e) = self.blocks.upsert(block.transition(status)).await {
            tracing::warn!(block = number, %status, error = %e, "Failed to commit block status");
        }
    }
}
