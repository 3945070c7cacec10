//! `eth_getBlockByNumber` result payload and its mapping to [`Transaction`].

use serde::Deserialize;

use chainwatch_core::error::ClientError;
use chainwatch_core::types::{normalize_address, parse_quantity, Transaction};

/// A block as returned by `eth_getBlockByNumber(…, true)`. Only the fields the
/// watcher needs are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// A full transaction object inside a [`RawBlock`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub from: String,
    /// `null` for contract creation.
    pub to: Option<String>,
    pub value: String,
    pub block_number: Option<String>,
    pub transaction_index: Option<String>,
}

impl RawBlock {
    /// Map every transaction. `number` and the list position stand in for
    /// missing `blockNumber` / `transactionIndex` fields.
    pub fn into_transactions(self, number: u64) -> Result<Vec<Transaction>, ClientError> {
        self.transactions
            .into_iter()
            .enumerate()
            .map(|(position, raw)| raw.into_transaction(number, position as u64))
            .collect()
    }
}

impl RawTransaction {
    fn into_transaction(self, number: u64, position: u64) -> Result<Transaction, ClientError> {
        Ok(Transaction {
            from: normalize_address(&self.from),
            to: self.to.as_deref().map(normalize_address).unwrap_or_default(),
            value: self.value,
            block_number: quantity_or(self.block_number.as_deref(), number, "blockNumber")?,
            transaction_index: quantity_or(
                self.transaction_index.as_deref(),
                position,
                "transactionIndex",
            )?,
        })
    }
}

fn quantity_or(raw: Option<&str>, fallback: u64, field: &str) -> Result<u64, ClientError> {
    match raw {
        None => Ok(fallback),
        Some(s) => parse_quantity(s)
            .ok_or_else(|| ClientError::Decode(format!("invalid {field} {s:?}"))),
    }
}
