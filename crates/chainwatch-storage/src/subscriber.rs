//! In-memory subscription index.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use chainwatch_core::error::WatchError;
use chainwatch_core::repository::SubscriberRepository;
use chainwatch_core::types::{normalize_address, Subscriber};

/// Watched addresses, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct InMemorySubscriberStore {
    data: RwLock<HashMap<String, Subscriber>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of watched addresses.
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscriberStore {
    async fn save(&self, subscriber: Subscriber) -> Result<(), WatchError> {
        let key = normalize_address(&subscriber.address);
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, subscriber);
        Ok(())
    }

    async fn get(&self, address: &str) -> Result<Subscriber, WatchError> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_address(address))
            .cloned()
            .ok_or_else(|| WatchError::SubscriberNotFound {
                address: address.to_string(),
            })
    }
}
