//! In-memory transaction index.
//!
//! Each matched transaction is stored once per address it touches, keyed by
//! `(block_number, transaction_index)`, so saving the same transaction twice
//! is a no-op and lookups come back in ledger order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use chainwatch_core::error::WatchError;
use chainwatch_core::repository::TransactionRepository;
use chainwatch_core::types::{normalize_address, Transaction};

type TxId = (u64, u64);

#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    data: RwLock<HashMap<String, BTreeMap<TxId, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionStore {
    async fn save(&self, transaction: Transaction) -> Result<(), WatchError> {
        let keys: Vec<String> = transaction.addresses().map(normalize_address).collect();
        let id = transaction.id();

        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            data.entry(key)
                .or_default()
                .insert(id, transaction.clone());
        }
        Ok(())
    }

    async fn by_address(&self, address: &str) -> Result<Vec<Transaction>, WatchError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data
            .get(&normalize_address(address))
            .map(|txs| txs.values().cloned().collect())
            .unwrap_or_default())
    }
}
