//! Shared types for the watch pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── BlockStatus ──────────────────────────────────────────────────────────────

/// Lifecycle state of a claimed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    /// Claimed by a worker and not yet committed.
    Processing,
    /// Processing failed; eligible for retry.
    Failed,
    /// All matching transactions were recorded.
    Parsed,
    /// Any label outside the three above. Never accepted by a block store.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Failed => write!(f, "failed"),
            Self::Parsed => write!(f, "parsed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// Coordination record for one block number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub status: BlockStatus,
    /// Last status transition.
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// A block record stamped with the current time.
    pub fn new(number: u64, status: BlockStatus) -> Self {
        Self {
            number,
            status,
            updated_at: Utc::now(),
        }
    }

    /// Move to `status` and restamp `updated_at`.
    pub fn transition(mut self, status: BlockStatus) -> Self {
        self.status = status;
        self.updated_at = Utc::now();
        self
    }

    /// Returns `true` if the record was last touched strictly more than
    /// `window` before `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match (now - self.updated_at).to_std() {
            Ok(age) => age > window,
            // updated_at lies in the future
            Err(_) => false,
        }
    }
}

// ─── Transaction ──────────────────────────────────────────────────────────────

/// A ledger transaction that touched at least one watched address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub from: String,
    /// Empty for contract creation.
    pub to: String,
    /// Transferred value as a `0x` hex quantity.
    pub value: String,
    pub block_number: u64,
    pub transaction_index: u64,
}

impl Transaction {
    /// Identity of the transaction within the ledger.
    pub fn id(&self) -> (u64, u64) {
        (self.block_number, self.transaction_index)
    }

    /// Non-empty addresses this transaction is indexed under.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        let to = (!self.to.is_empty() && self.to != self.from).then_some(self.to.as_str());
        std::iter::once(self.from.as_str())
            .filter(|a| !a.is_empty())
            .chain(to)
    }
}

// ─── Subscriber ───────────────────────────────────────────────────────────────

/// A watched address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscriber {
    pub address: String,
}

impl Subscriber {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Canonical form of an address: trimmed and lower-cased.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Parse a block quantity: `0x`-prefixed hex or plain decimal.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Format a block quantity as a `0x` hex string.
pub fn format_quantity(n: u64) -> String {
    format!("0x{n:x}")
}
