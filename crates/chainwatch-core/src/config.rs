//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::repository::DEFAULT_STALENESS_WINDOW;

/// Configuration for the parser worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of independently ticking jobs.
    pub count: usize,
    /// Tick interval per job (milliseconds).
    pub interval_ms: u64,
    /// Block seeded as parsed at startup. `None` = current chain head.
    pub start_block: Option<u64>,
    /// Age after which a Processing block may be reclaimed (milliseconds).
    pub staleness_window_ms: u64,
    /// Addresses subscribed at startup.
    pub predefined_addresses: Vec<String>,
}

impl WorkerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn staleness_window(&self) -> Duration {
        Duration::from_millis(self.staleness_window_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 4,
            interval_ms: 1000,
            start_block: None,
            staleness_window_ms: DEFAULT_STALENESS_WINDOW.as_millis() as u64,
            predefined_addresses: Vec::new(),
        }
    }
}
