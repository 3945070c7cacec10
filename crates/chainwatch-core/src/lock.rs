//! Claim lock: serializes the claim phase across workers in one process.

use async_trait::async_trait;

/// Held for as long as the claim lock is owned. Dropping it releases the lock,
/// unwinding included.
pub type ClaimGuard<'a> = Box<dyn Send + 'a>;

/// Mutual exclusion around "pick the next block and mark it Processing".
#[async_trait]
pub trait ClaimLock: Send + Sync {
    async fn acquire<'a>(&'a self) -> ClaimGuard<'a>;
}

/// In-process claim lock backed by a Tokio mutex.
#[derive(Debug, Default)]
pub struct InMemoryClaimLock {
    inner: tokio::sync::Mutex<()>,
}

impl InMemoryClaimLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimLock for InMemoryClaimLock {
    async fn acquire<'a>(&'a self) -> ClaimGuard<'a> {
        Box::new(self.inner.lock().await)
    }
}
