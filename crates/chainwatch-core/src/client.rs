//! Chain client contract.
//!
//! The coordinator only needs two things from the ledger: the current head
//! height and the transactions of one block. `chainwatch-evm` implements this
//! over HTTP JSON-RPC; tests substitute fakes.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::Transaction;

/// Read access to a remote ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain head height.
    async fn block_number(&self) -> Result<u64, ClientError>;

    /// All transactions of block `number`, in block order.
    async fn block_transactions(&self, number: u64) -> Result<Vec<Transaction>, ClientError>;
}
