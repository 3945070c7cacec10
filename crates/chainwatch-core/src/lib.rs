//! chainwatch-core: block-claim coordination for a pool of address watchers.
//!
//! # Architecture
//!
//! ```text
//! Jobs (scheduler) → ParserWorker::run
//!                        ├── ChainClient          (head height, block transactions)
//!                        ├── ClaimLock            (serializes the claim phase)
//!                        ├── BlockRepository      (Processing / Failed / Parsed + watermarks)
//!                        ├── SubscriberRepository (watched addresses)
//!                        └── TransactionRepository (matched transactions)
//!
//! Parser → read-side views over the same repositories
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lock;
pub mod parser;
pub mod repository;
pub mod scheduler;
pub mod types;
pub mod worker;

pub use client::ChainClient;
pub use config::WorkerConfig;
pub use error::{ClientError, WatchError};
pub use lock::{ClaimGuard, ClaimLock, InMemoryClaimLock};
pub use parser::Parser;
pub use repository::{
    BlockRepository, SubscriberRepository, TransactionRepository, DEFAULT_STALENESS_WINDOW,
};
pub use scheduler::{Job, Jobs, RunningJobs};
pub use types::{Block, BlockStatus, Subscriber, Transaction};
pub use worker::ParserWorker;
