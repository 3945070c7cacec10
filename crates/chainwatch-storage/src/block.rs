//! In-memory block state store.
//!
//! Blocks live in exactly one of three partitions (Processing, Failed,
//! Parsed). Two watermarks track the highest parsed number and the highest
//! number claimed for processing. All four operations run inside a single
//! mutex critical section, so each one observes and leaves a consistent
//! snapshot.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use chainwatch_core::error::WatchError;
use chainwatch_core::repository::{BlockRepository, DEFAULT_STALENESS_WINDOW};
use chainwatch_core::types::{Block, BlockStatus};

#[derive(Debug, Default)]
struct BlockState {
    processing: BTreeMap<u64, Block>,
    failed: BTreeMap<u64, Block>,
    parsed: BTreeMap<u64, Block>,
    parsed_block_number: Option<u64>,
    processing_block_number: Option<u64>,
}

impl BlockState {
    fn last_parsed(&self) -> Option<&Block> {
        self.parsed_block_number.and_then(|n| self.parsed.get(&n))
    }

    fn processing_ahead(&self) -> Option<&Block> {
        let processing = self.processing_block_number?;
        match self.parsed_block_number {
            Some(parsed) if processing <= parsed => None,
            _ => self.processing.get(&processing),
        }
    }
}

/// Block state store kept in RAM. All state is lost when the process exits.
#[derive(Debug)]
pub struct InMemoryBlockStore {
    state: Mutex<BlockState>,
    staleness_window: Duration,
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::with_staleness_window(DEFAULT_STALENESS_WINDOW)
    }

    /// Processing blocks untouched for longer than `window` become reclaimable.
    pub fn with_staleness_window(window: Duration) -> Self {
        Self {
            state: Mutex::new(BlockState::default()),
            staleness_window: window,
        }
    }

    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    fn state(&self) -> MutexGuard<'_, BlockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlockRepository for InMemoryBlockStore {
    async fn last_parsed_block(&self) -> Result<Block, WatchError> {
        self.state()
            .last_parsed()
            .cloned()
            .ok_or(WatchError::BlockNotFound)
    }

    async fn last_block(&self) -> Result<Block, WatchError> {
        let state = self.state();
        state
            .processing_ahead()
            .or_else(|| state.last_parsed())
            .cloned()
            .ok_or(WatchError::BlockNotFound)
    }

    async fn failed_block(&self) -> Result<Block, WatchError> {
        let state = self.state();
        if let Some(block) = state.failed.values().next() {
            return Ok(block.clone());
        }

        let now = Utc::now();
        state
            .processing
            .values()
            .find(|b| b.is_stale(now, self.staleness_window))
            .cloned()
            .ok_or(WatchError::BlockNotFound)
    }

    async fn upsert(&self, block: Block) -> Result<(), WatchError> {
        let mut state = self.state();
        let number = block.number;

        match block.status {
            BlockStatus::Processing => {
                state.failed.remove(&number);
                state.processing.insert(number, block);
                if state.processing_block_number.map_or(true, |wm| number > wm) {
                    state.processing_block_number = Some(number);
                }
            }
            BlockStatus::Failed => {
                state.processing.remove(&number);
                state.failed.insert(number, block);
                // Step the watermark back so the failed number is not treated
                // as the last claimed block.
                if state.processing_block_number == Some(number) {
                    state.processing_block_number = number.checked_sub(1);
                }
            }
            BlockStatus::Parsed => {
                state.processing.remove(&number);
                state.parsed.insert(number, block);
                if state.parsed_block_number.map_or(true, |wm| number > wm) {
                    state.parsed_block_number = Some(number);
                }
            }
            BlockStatus::Unknown => return Err(WatchError::UnknownBlockStatus),
        }

        tracing::trace!(
            block = number,
            parsed = ?state.parsed_block_number,
            processing = ?state.processing_block_number,
            "Block upserted"
        );
        Ok(())
    }
}
