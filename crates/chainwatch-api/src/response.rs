//! Request and response bodies.

use serde::{Deserialize, Serialize};

use chainwatch_core::types::Transaction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// `GET /block/number`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentBlockResponse {
    /// Last parsed block as a `0x` hex quantity.
    pub block: String,
}

/// `POST /address/subscribe`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub address: String,
}

/// `GET /address/transaction` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsQuery {
    pub address: Option<String>,
}

/// `GET /address/transaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}
