//! Distributed lock port.
//!
//! Locks serialize work on a single entity across concurrent requests and
//! workers. Keys follow the `"<kind>=<id>"` convention: initiation locks
//! `"userId=<id>"`, payment execution and reversal share `"transferId=<id>"`.

use async_trait::async_trait;
use uuid::Uuid;

/// Proof of a held lock, returned by [`LockService::try_acquire`].
///
/// The token ties the lease to one acquisition, so releasing a lease that
/// has already expired cannot free a lock someone else holds by now.
#[derive(Debug)]
pub struct LockLease {
    key: String,
    token: Uuid,
}

impl LockLease {
    pub fn new(key: impl Into<String>, token: Uuid) -> Self {
        Self {
            key: key.into(),
            token,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> Uuid {
        self.token
    }
}

/// Try-once, lease-based locking.
#[async_trait]
pub trait LockService: Send + Sync + 'static {
    /// Attempts to take the lock without waiting. `None` means somebody
    /// else holds it.
    async fn try_acquire(&self, key: &str) -> Option<LockLease>;

    /// Releases a held lease. Releasing an expired or superseded lease is
    /// a no-op.
    async fn release(&self, lease: LockLease);
}
