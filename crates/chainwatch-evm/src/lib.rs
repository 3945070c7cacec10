//! chainwatch-evm: Ethereum JSON-RPC implementation of
//! [`ChainClient`](chainwatch_core::ChainClient).
//!
//! Two calls are used: `eth_blockNumber` for the chain head and
//! `eth_getBlockByNumber(n, true)` for a block's full transactions.

pub mod block;
pub mod client;
pub mod request;

pub use client::{HttpChainClient, HttpClientConfig};
