//! In-memory lock registry.
//!
//! Single-process implementation of the `LockService` port. Leases are
//! try-once and carry a TTL so a holder that dies mid-operation cannot
//! block its entity forever; a later acquire reclaims the expired entry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use transfer_types::{LockLease, LockService};

struct LeaseEntry {
    token: Uuid,
    expires_at: Instant,
}

/// TTL-leased, try-once locks keyed by entity (`"userId=<id>"`,
/// `"transferId=<id>"`).
pub struct InMemoryLockRegistry {
    leases: DashMap<String, LeaseEntry>,
    ttl: Duration,
}

impl InMemoryLockRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            leases: DashMap::new(),
            ttl,
        }
    }
}

#[async_trait]
impl LockService for InMemoryLockRegistry {
    async fn try_acquire(&self, key: &str) -> Option<LockLease> {
        let token = Uuid::new_v4();
        let now = Instant::now();
        let entry = LeaseEntry {
            token,
            expires_at: now + self.ttl,
        };

        // The entry guard holds the shard, so check-and-claim is atomic.
        match self.leases.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Some(LockLease::new(key, token))
            }
            Entry::Occupied(mut occupied) if occupied.get().expires_at <= now => {
                tracing::debug!(key = %key, "expired lease reclaimed");
                occupied.insert(entry);
                Some(LockLease::new(key, token))
            }
            Entry::Occupied(_) => {
                tracing::debug!(key = %key, "lock already held");
                None
            }
        }
    }

    async fn release(&self, lease: LockLease) {
        // Only the matching token may free the key; a stale release after
        // TTL expiry must not evict whoever holds the lock now.
        self.leases
            .remove_if(lease.key(), |_, entry| entry.token == lease.token());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let locks = InMemoryLockRegistry::new(Duration::from_secs(60));

        let lease = locks.try_acquire("userId=7").await.unwrap();
        assert_eq!(lease.key(), "userId=7");

        locks.release(lease).await;

        assert!(locks.try_acquire("userId=7").await.is_some());
    }

    #[tokio::test]
    async fn test_held_key_is_not_granted_twice() {
        let locks = InMemoryLockRegistry::new(Duration::from_secs(60));

        let _held = locks.try_acquire("transferId=abc").await.unwrap();

        assert!(locks.try_acquire("transferId=abc").await.is_none());
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let locks = InMemoryLockRegistry::new(Duration::from_secs(60));

        let _user = locks.try_acquire("userId=7").await.unwrap();
        let transfer = locks.try_acquire("transferId=abc").await;

        assert!(transfer.is_some());
    }

    #[tokio::test]
    async fn test_expired_lease_is_reclaimed() {
        let locks = InMemoryLockRegistry::new(Duration::from_millis(10));

        let _stale = locks.try_acquire("userId=7").await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(locks.try_acquire("userId=7").await.is_some());
    }

    #[tokio::test]
    async fn test_stale_release_does_not_evict_new_holder() {
        let locks = InMemoryLockRegistry::new(Duration::from_millis(10));

        let stale = locks.try_acquire("userId=7").await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;

        // Someone else reclaims the key after the TTL lapses.
        let _current = locks.try_acquire("userId=7").await.unwrap();

        // The original holder comes back and releases its dead lease.
        locks.release(stale).await;

        assert!(locks.try_acquire("userId=7").await.is_none());
    }
}
